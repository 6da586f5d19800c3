//! # Response Envelope
//!
//! Every command answers with a status code and one of:
//!
//! ```text
//! {"success": true,  "data": <payload>}      200 / 201
//! {"success": false, "error": "<message>"}   400 / 404 / 500
//! ```
//!
//! `data` may be `null` on success (customer lookup with no match).
//!
//! Money fields (`price_usd`, `price_bs`, `total_usd`, `total_bs`, ...) are
//! decimal strings in major units with two places, e.g. `"2.50"`, matching
//! how prices are sent in. Rates are decimal strings at full precision.

use serde::Serialize;

use crate::error::ApiResult;

/// 200
pub const OK: u16 = 200;
/// 201
pub const CREATED: u16 = 201;

/// JSON response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Successful body carrying `data`.
    pub fn ok(data: T) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed body carrying a message.
    pub fn err(message: impl Into<String>) -> Self {
        Envelope {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Status code plus body.
pub type Response<T> = (u16, Envelope<T>);

/// Wraps a command result, using `success_status` when it succeeded and the
/// error's own status otherwise.
pub fn respond<T>(result: ApiResult<T>, success_status: u16) -> Response<T> {
    match result {
        Ok(data) => (success_status, Envelope::ok(data)),
        Err(err) => (err.status(), Envelope::err(err.message)),
    }
}
