//! reqwest-backed transport for retriable calls.

use std::time::Duration;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// The transport used by the binary and by default in the library.
///
/// One attempt maps to one reqwest request. The client is cloned into every
/// attempt task, so all attempts of all calls share reqwest's connection pool.
/// Errors are folded into [`HttpError`] so that classification sees timeouts
/// separately from other transport failures.
///
/// # Example
///
/// ```no_run
/// use retriable_call::http::{ReqwestClient, HttpClient, HttpRequest};
/// use std::time::Duration;
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ReqwestClient::with_timeout(Duration::from_secs(30))?;
/// let request = HttpRequest::post(Url::parse("https://in.example.com/logs")?)
///     .with_body(br#"{"logs":[]}"#.to_vec());
/// let response = client.request(request).await?;
/// assert!(response.is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client without a request timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Creates a client whose attempts give up after `timeout`.
    ///
    /// A timed-out attempt is reported as [`HttpError::Timeout`] and retried.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { inner })
    }

    /// Wraps a preconfigured reqwest client, e.g. one with a proxy.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = req;

        let mut outgoing = self.inner.request(method, url.as_str()).headers(headers);
        if let Some(body) = body {
            outgoing = outgoing.body(body);
        }

        let response = outgoing.send().await.map_err(transport_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        // A body cut off mid-read counts as a failed attempt, like a failed send.
        let body = response.bytes().await.map_err(transport_error)?;

        Ok(HttpResponse::new(status, headers, body.to_vec()))
    }
}

/// Folds a reqwest failure into the transport error the classifier expects.
fn transport_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else if e.is_builder() {
        HttpError::InvalidUrl(e.to_string())
    } else {
        HttpError::Connection(Box::new(e))
    }
}
