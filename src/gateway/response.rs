//! # Gateway Response

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Content type of document responses
pub const JSON_CONTENT_TYPE: &str = "text/json";

/// Final outcome of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

impl GatewayResponse {
    /// 200 with a JSON document body
    pub fn json(body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some(JSON_CONTENT_TYPE),
            body,
        }
    }

    pub fn no_content() -> Self {
        Self::status(StatusCode::NO_CONTENT)
    }

    /// Bare status, empty body
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let len = self.content_length();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        if let Some(content_type) = self.content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        if self.status != StatusCode::NO_CONTENT {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
        }
        response
    }
}
