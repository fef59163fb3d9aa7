//! Payload extraction: base64url-encoded HTML or plain text in, visible text out.
//!
//! Pure functions with no shared state; safe to call from any task.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use scraper::{Html, Selector};

use crate::error::ExtractError;

/// URL-safe alphabet that accepts payloads with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64url payload and return its visible text.
///
/// The decoded bytes are read as UTF-8 (invalid sequences replaced) and
/// parsed as HTML. Plain-text payloads come back unchanged apart from
/// entity decoding, since the parser wraps bare text in a body.
pub fn extract_text(raw_encoded: impl AsRef<[u8]>) -> Result<String, ExtractError> {
    let decoded = decode_payload(raw_encoded)?;
    Ok(html_to_text(&String::from_utf8_lossy(&decoded)))
}

/// Decode a base64url payload to raw bytes.
pub fn decode_payload(raw_encoded: impl AsRef<[u8]>) -> Result<Vec<u8>, ExtractError> {
    let trimmed = raw_encoded.as_ref().trim_ascii();
    Ok(URL_SAFE_LENIENT.decode(trimmed)?)
}

/// Text content of the document body, or of the whole document if it has none.
///
/// Parsing follows HTML5 tree construction, which always yields a body.
/// Head-only elements in a body-less fragment (`<title>`, `<style>`) are
/// placed in the head and so never appear in the result.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());

    match body {
        Some(body) => body.text().collect(),
        None => document.root_element().text().collect(),
    }
}
