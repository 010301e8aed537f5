use aide::OperationOutput;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use headers::{HeaderMap, HeaderValue};

use crate::endpoints::PASS_CONTENT_TYPE;

use super::list::SerialNumbers;

/// Every answer the protocol modules produce.
#[derive(Debug, Clone, PartialEq)]
pub enum WebServiceResponse {
    /// `200` with an empty body.
    Ok,
    /// `204` with an empty body.
    NoContent,
    /// `200` with the pass archive as body.
    Pass(Vec<u8>),
    /// `200` with the updatable serial numbers as JSON.
    SerialNumbers(SerialNumbers),
    /// A guard stage refused the request.
    Rejected(StatusCode),
}

impl OperationOutput for WebServiceResponse {
    type Inner = Self;
}

impl IntoResponse for WebServiceResponse {
    fn into_response(self) -> axum::response::Response {
        match self {
            WebServiceResponse::Ok => StatusCode::OK.into_response(),
            WebServiceResponse::NoContent => StatusCode::NO_CONTENT.into_response(),
            WebServiceResponse::Pass(body) => {
                let mut header = HeaderMap::new();
                header.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(PASS_CONTENT_TYPE),
                );

                (StatusCode::OK, header, body).into_response()
            }
            WebServiceResponse::SerialNumbers(list) => (StatusCode::OK, Json(list)).into_response(),
            WebServiceResponse::Rejected(status) => status.into_response(),
        }
    }
}
