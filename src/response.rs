use serde::Serialize;

/// JSON envelope every success payload travels in; errors use the matching
/// `{ "success": false, "error": .. }` shape from [`crate::error`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
