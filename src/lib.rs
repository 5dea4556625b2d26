//! Retriable Call: resilient HTTP requests with scheduled retries
//!
//! A library for sending one logical HTTP request with automatic retries
//! on a fixed delay schedule, with cancellation and a single completion
//! callback per request.

pub mod call;
pub mod config;
pub mod http;
pub mod timer;
