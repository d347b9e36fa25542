//! Shared response envelope types for API handlers.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Envelope for catalog writes: `{ "data": T, "warnings": [...] }`.
///
/// `warnings` carries non-fatal problems such as a JSON mirror that could not
/// be updated. Omitted when empty.
#[derive(Debug, Serialize)]
pub struct WriteResponse<T: Serialize> {
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
