//! Mapping filter rejections to HTTP responses.
//!
//! A rejection becomes its status code with the reason as a plain-text body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::filter::{RejectStatus, Rejection};

impl From<RejectStatus> for StatusCode {
    fn from(status: RejectStatus) -> Self {
        match status {
            RejectStatus::Forbidden => StatusCode::FORBIDDEN,
            RejectStatus::BadConfiguration => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (StatusCode::from(self.status), self.reason.as_str()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RejectReason;
    use axum::http::header;

    #[tokio::test]
    async fn test_rejection_response() {
        let res = Rejection {
            status: RejectStatus::Forbidden,
            reason: RejectReason::UserAgent,
        }
        .into_response();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"request user agent filtered");
    }

    #[test]
    fn test_bad_configuration_is_400() {
        assert_eq!(
            StatusCode::from(RejectStatus::BadConfiguration),
            StatusCode::BAD_REQUEST
        );
    }
}
