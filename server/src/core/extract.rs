//! Extractors - Wrapper di Json, Path e Query con rifiuti convertiti in AppError
//!
//! Gli handler usano questi tipi al posto di quelli di axum, così un body o un
//! parametro malformato produce 400 con il consueto body `{"error": ..., "details": ...}`.

use crate::core::AppError;
use axum_macros::{FromRequest, FromRequestParts};

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
