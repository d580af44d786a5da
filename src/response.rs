//! The JSON envelope both functions return to the Lambda runtime.

use serde::Serialize;

/// A gateway-style response with a human-readable summary of what the
/// invocation did.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    /// Always 200. Failures are reported by returning an error from the
    /// handler instead, so the event is retried.
    pub status_code: u16,
    /// The summary message.
    pub body: String,
}

impl HandlerResponse {
    /// A successful response carrying the given summary.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }
}
