//! Provider HTTP error types.

use thiserror::Error;

/// Largest prefix of an error response body kept for classification.
pub(crate) const MAX_ERROR_BODY: usize = 4 * 1024;

/// Failure of a single provider request.
///
/// `Display` never includes the response body: provider error bodies may echo
/// request parameters.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("Provider responded with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for classification only. At most
        /// [`MAX_ERROR_BODY`] bytes, lossily decoded.
        body: String,
    },

    /// The request failed before a usable response was read: connect error,
    /// timeout or undecodable body.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ProviderError {
    /// Returns the HTTP status, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(error) => error.status().map(|s| s.as_u16()),
        }
    }

    /// Passes a 2xx response through; converts anything else into
    /// [`ProviderError::Status`].
    ///
    /// Reads at most [`MAX_ERROR_BODY`] bytes of the error body.
    pub(crate) async fn check(mut response: reqwest::Response) -> Result<reqwest::Response, Self> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut body = Vec::new();
        while body.len() < MAX_ERROR_BODY {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) | Err(_) => break,
            }
        }
        body.truncate(MAX_ERROR_BODY);

        Err(Self::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

// Verify ProviderError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ProviderError>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn error_from(template: ResponseTemplate) -> ProviderError {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(template)
            .mount(&server)
            .await;
        let response = reqwest::Client::new().get(server.uri()).send().await.unwrap();
        ProviderError::check(response).await.unwrap_err()
    }

    #[tokio::test]
    async fn test_check_caps_error_body() {
        let huge = "x".repeat(MAX_ERROR_BODY * 64);

        let error = error_from(ResponseTemplate::new(422).set_body_string(huge)).await;

        match error {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 422);
                assert_eq!(body.len(), MAX_ERROR_BODY);
            }
            ProviderError::Network(e) => panic!("unexpected network error: {e}"),
        }
    }

    #[tokio::test]
    async fn test_check_keeps_short_error_body() {
        let error = error_from(
            ResponseTemplate::new(422).set_body_string("address has already been taken"),
        )
        .await;

        assert!(matches!(
            error,
            ProviderError::Status { status: 422, ref body } if body == "address has already been taken"
        ));
    }

    #[test]
    fn test_status_error_hides_body() {
        let error = ProviderError::Status {
            status: 422,
            body: r#"{"errors":{"address":["secret detail"]}}"#.to_string(),
        };
        assert_eq!(error.to_string(), "Provider responded with status 422");
        assert_eq!(error.status(), Some(422));
    }
}
