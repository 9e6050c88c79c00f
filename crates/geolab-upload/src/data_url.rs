//! `data:` URL parsing
//!
//! Browsers hand uploads over as `data:<mime>[;param=value];base64,<payload>`.

use crate::error::{UploadError, UploadResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// A decoded data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse a base64 data URL. Plain (non-base64) data URLs are rejected.
    pub fn parse(input: &str) -> UploadResult<Self> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| UploadError::InvalidDataUrl("missing data: prefix".to_string()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| UploadError::InvalidDataUrl("missing ',' separator".to_string()))?;

        let mut parts = header.split(';');
        let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(UploadError::InvalidDataUrl("payload is not base64 encoded".to_string()));
        }
        if mime.is_empty() || !mime.contains('/') {
            return Err(UploadError::InvalidDataUrl(format!("invalid media type {:?}", mime)));
        }

        let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|e| UploadError::InvalidDataUrl(format!("invalid base64: {}", e)))?;

        Ok(Self { mime, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pdf() {
        let url = DataUrl::parse("data:application/pdf;base64,JVBERi0xLjQ=").unwrap();
        assert_eq!(url.mime, "application/pdf");
        assert_eq!(url.bytes, b"%PDF-1.4");
        assert_eq!(url.size(), 8);
    }

    #[test]
    fn test_parse_with_params() {
        let url = DataUrl::parse("data:Text/Plain;charset=utf-8;base64,aGk=").unwrap();
        assert_eq!(url.mime, "text/plain");
        assert_eq!(url.bytes, b"hi");
    }

    #[test]
    fn test_parse_tolerates_wrapped_payload() {
        let url = DataUrl::parse("data:image/png;base64,aGVs\nbG8=").unwrap();
        assert_eq!(url.bytes, b"hello");
    }

    #[test]
    fn test_rejects_malformed() {
        for input in [
            "",
            "application/pdf;base64,JVBERi0=",
            "data:application/pdf;base64",
            "data:application/pdf,plain",
            "data:;base64,aGk=",
            "data:application/pdf;base64,@@@",
        ] {
            assert!(
                matches!(DataUrl::parse(input), Err(UploadError::InvalidDataUrl(_))),
                "accepted {:?}",
                input
            );
        }
    }
}
