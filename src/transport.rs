//! Adapters between request payloads and the pipeline.
//!
//! The pipeline only ever sees a plain byte buffer. Callers pick the adapter
//! matching how the image arrived, and report failures back with
//! [`ErrorEnvelope`] and [`status_code`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::error::{Error, Result};

/// Use a raw request body as the image bytes.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if the body is empty.
pub fn from_raw_body(body: &[u8]) -> Result<Vec<u8>> {
    if body.is_empty() {
        return Err(Error::MissingField("request body is empty".to_string()));
    }
    Ok(body.to_vec())
}

/// Decode a base64 image, optionally wrapped as a `data:<mime>;base64,` URL.
///
/// Surrounding whitespace and line breaks are ignored.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if nothing is left after trimming and
/// [`Error::InvalidBase64`] if the payload is malformed.
pub fn from_base64(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let payload = match text.strip_prefix("data:") {
        Some(url) => url
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| Error::MissingField("data URL is not base64-encoded".to_string()))?,
        None => text,
    };

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(Error::MissingField("base64 payload is empty".to_string()));
    }
    Ok(STANDARD.decode(compact)?)
}

/// Pull a base64 image out of string field `field` of a JSON object body.
///
/// # Errors
///
/// Returns [`Error::InvalidJson`] if `body` is not JSON,
/// [`Error::MissingField`] if `field` is absent or not a string, and
/// [`Error::InvalidBase64`] if its value is malformed.
pub fn from_json_field(body: &[u8], field: &str) -> Result<Vec<u8>> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let encoded = value
        .get(field)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| Error::MissingField(format!("JSON field {field:?}")))?;
    from_base64(encoded)
}

/// JSON error body for failed requests: `{"success": false, "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    /// Always `false`.
    pub success: bool,
    /// Human-readable failure description.
    pub message: String,
}

impl From<&Error> for ErrorEnvelope {
    fn from(error: &Error) -> Self {
        Self {
            success: false,
            message: error.to_string(),
        }
    }
}

/// HTTP-style status code for reporting `error` to a client.
#[must_use]
pub fn status_code(error: &Error) -> u16 {
    match error {
        Error::Decode(_) | Error::MissingField(_) | Error::InvalidBase64(_) | Error::InvalidJson(_) => {
            400
        }
        Error::InvalidDimensions { .. } => 413,
        Error::Encode(_) | Error::Io(_) | Error::Config(_) => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_body_must_not_be_empty() {
        assert_eq!(from_raw_body(b"abc").unwrap(), b"abc");
        assert!(matches!(from_raw_body(b""), Err(Error::MissingField(_))));
    }

    #[test]
    fn base64_plain_and_data_url() {
        assert_eq!(from_base64("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(
            from_base64("  data:image/png;base64,aGVs\nbG8=\n").unwrap(),
            b"hello"
        );
    }

    #[test]
    fn base64_errors() {
        assert!(matches!(from_base64("   "), Err(Error::MissingField(_))));
        assert!(matches!(
            from_base64("data:image/png,raw"),
            Err(Error::MissingField(_))
        ));
        assert!(matches!(from_base64("!!!"), Err(Error::InvalidBase64(_))));
    }

    #[test]
    fn json_field_extraction() {
        let body = br#"{"image": "aGVsbG8=", "name": "x"}"#;
        assert_eq!(from_json_field(body, "image").unwrap(), b"hello");
        assert!(matches!(
            from_json_field(body, "photo"),
            Err(Error::MissingField(_))
        ));
        assert!(matches!(
            from_json_field(br#"{"image": 5}"#, "image"),
            Err(Error::MissingField(_))
        ));
        assert!(matches!(
            from_json_field(b"not json", "image"),
            Err(Error::InvalidJson(_))
        ));
    }

    #[test]
    fn envelope_serializes_with_success_false() {
        let err = Error::Decode("input buffer is empty".to_string());
        let json = serde_json::to_string(&ErrorEnvelope::from(&err)).unwrap();
        assert!(json.starts_with(r#"{"success":false,"message":"#));
        assert!(json.contains("input buffer is empty"));
    }

    #[test]
    fn status_codes_by_category() {
        assert_eq!(status_code(&Error::Decode(String::new())), 400);
        assert_eq!(status_code(&Error::MissingField(String::new())), 400);
        assert_eq!(
            status_code(&Error::InvalidDimensions {
                width: 1,
                height: 1,
                reason: String::new()
            }),
            413
        );
        assert_eq!(status_code(&Error::Config(String::new())), 500);
    }
}
