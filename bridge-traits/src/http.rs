//! HTTP Client Abstraction
//!
//! Streaming HTTP access used by the stream cache. The core only ever issues a
//! single linear GET per media item and consumes the body chunk by chunk as it
//! arrives, so the trait is shaped around that: resolve once the response
//! headers are known, then hand back the body as a stream of byte chunks.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    /// Shorthand for a plain GET.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// Response metadata available as soon as the headers have been received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    /// MIME type from `Content-Type`, without parameters (e.g. `audio/mpeg`).
    pub mime_type: Option<String>,
    /// Expected body length from `Content-Length`, when the server sent one.
    pub content_length: Option<u64>,
    pub headers: HashMap<String, String>,
}

impl ResponseHead {
    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Body chunks in the order the transport delivered them.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// An open streaming response.
pub struct HttpStream {
    pub head: ResponseHead,
    pub body: ByteStream,
}

impl HttpStream {
    pub fn new(head: ResponseHead, body: ByteStream) -> Self {
        Self { head, body }
    }
}

impl fmt::Debug for HttpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStream")
            .field("head", &self.head)
            .finish_non_exhaustive()
    }
}

/// Async streaming HTTP client trait
///
/// Implementations should handle TLS, redirects and connection pooling. They
/// must not retry a request once body bytes have started flowing: the caller
/// appends every chunk it receives to its buffer.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest};
/// use futures::StreamExt;
///
/// async fn fetch(client: &dyn HttpClient) -> Result<usize> {
///     let mut stream = client.open_stream(HttpRequest::get("https://example.com/a.mp3")).await?;
///     let mut total = 0;
///     while let Some(chunk) = stream.body.next().await {
///         total += chunk?.len();
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue the request and resolve once the response headers are in.
    ///
    /// # Errors
    ///
    /// Returns error if the connection cannot be established, TLS validation
    /// fails or the request times out before headers arrive.
    async fn open_stream(&self, request: HttpRequest) -> Result<HttpStream>;
}
