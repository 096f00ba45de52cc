//! Request extractors whose rejections render as `{message, error}`

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};

/// JSON body. Malformed or mistyped payloads become a 400 [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters. Unparsable segments become a 400 [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);
