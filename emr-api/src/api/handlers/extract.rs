use axum::extract::FromRequest;

use super::error::ErrorResponse;

/// JSON request body whose rejections are answered with an `ErrorResponse`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ErrorResponse))]
pub struct JsonBody<T>(pub T);
