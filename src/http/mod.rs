//! Transport boundary for retriable calls.
//!
//! This module provides types and traits for:
//! - Building HTTP requests ([`HttpRequest`])
//! - Handling HTTP responses ([`HttpResponse`])
//! - Abstracting HTTP clients ([`HttpClient`])
//! - Production HTTP client implementation ([`ReqwestClient`])
//! - Sorting a single attempt's result into success, recoverable or fatal
//!   ([`classify`], [`AttemptOutcome`])

mod classify;
mod client;
mod error;
mod request;


pub use classify::{AttemptOutcome, IsRetryable, classify};
pub use client::ReqwestClient;
pub use error::{AttemptError, HttpError};
pub use request::{HttpClient, HttpRequest, HttpResponse};
