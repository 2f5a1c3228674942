//! The seam between the API client and whatever carries its requests.

use std::{convert::Infallible, future::Future};

use axum::{Router, body::Body, extract::Request, response::Response};
use tower::ServiceExt;

use crate::client::ClientError;

/// Sends a request to the API and returns its response.
pub trait Transport: Send + Sync {
    /// Send `request` and wait for the response.
    ///
    /// # Errors
    /// Returns [ClientError::Transport] if the request could not be delivered.
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, ClientError>> + Send;
}

/// Serves requests in-process with the app's router, no network involved.
impl Transport for Router {
    async fn send(&self, request: Request) -> Result<Response, ClientError> {
        self.clone()
            .oneshot(request)
            .await
            .map_err(|never: Infallible| match never {})
    }
}

/// Build a request with an optional JSON body.
pub(crate) fn build_request(
    method: axum::http::Method,
    uri: &str,
    json_body: Option<Vec<u8>>,
) -> Result<Request, ClientError> {
    let builder = Request::builder().method(method).uri(uri);

    let result = match json_body {
        Some(bytes) => builder
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes)),
        None => builder.body(Body::empty()),
    };

    result.map_err(|error| ClientError::Transport(error.to_string()))
}
