//! JSON body encoding

use bytes::Bytes;
use contracts::Sanitize;
use serde::Serialize;
use tracing::{debug, error};

/// Encodes records, batches and arbitrary values as JSON bodies
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value; never fails
    ///
    /// The strict pass rejects invalid UTF-8 bytes and non-finite floats.
    /// On failure the sanitized copy is encoded instead, and if that fails
    /// too the body is a JSON string describing the error.
    pub fn encode<T: Serialize + Sanitize>(value: &T) -> Bytes {
        let strict_err = match serde_json::to_vec(value) {
            Ok(body) => return Bytes::from(body),
            Err(e) => e,
        };
        debug!(error = %strict_err, "Strict encoding failed, sanitizing");

        match serde_json::to_vec(&value.sanitize()) {
            Ok(body) => Bytes::from(body),
            Err(e) => {
                error!(error = %e, "Sanitized encoding failed, sending placeholder");
                Self::placeholder(&e.to_string())
            }
        }
    }

    fn placeholder(reason: &str) -> Bytes {
        let text = format!("<unencodable value: {reason}>");
        // A bare string always encodes.
        Bytes::from(serde_json::Value::String(text).to_string())
    }
}
