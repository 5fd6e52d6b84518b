use crate::error::Result;
use crate::negotiate::SerializerInfo;
use annex_core::Status;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Encode a value with the negotiated serializer and build the response,
/// setting `Content-Type` to the negotiated media type
pub fn serialized_response<T: Serialize>(
    status: StatusCode,
    info: &SerializerInfo,
    value: &T,
) -> Result<Response> {
    let body = info.encode(value)?;

    Ok((
        status,
        [(header::CONTENT_TYPE, info.media_type.clone())],
        body,
    )
        .into_response())
}

/// Encode a Success status outcome with the negotiated serializer
pub fn status_success(info: &SerializerInfo, message: &str) -> Result<Response> {
    serialized_response(StatusCode::OK, info, &Status::success(message))
}
