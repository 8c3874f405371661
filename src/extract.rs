// src/extract.rs

use axum::{
    extract::FromRequest,
    response::{IntoResponse, Response},
};

use crate::error::AppError;

/// `axum::Json` with rejections routed through `AppError`, so malformed
/// bodies answer with the same `{"message": ...}` shape as every other error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl<T> IntoResponse for AppJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
