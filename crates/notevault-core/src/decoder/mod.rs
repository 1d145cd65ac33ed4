//! Note payload decoder
//!
//! A note body is a gzip stream wrapping a nested, protobuf-shaped message.
//! The layout was reverse-engineered and is only partially known, so the
//! field numbers live in [`DecoderConfig`] and every structural failure
//! degrades to a printable-text scan instead of an error. Only broken gzip
//! framing is fatal.

mod fallback;
mod gzip;
mod note_proto;
mod render;
mod wire;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DecodedContent;

pub use render::{render_html, render_markdown};

/// Errors raised while decoding a note payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Gzip magic present but the fixed header is incomplete
    #[error("compressed stream header truncated ({0} bytes)")]
    TruncatedHeader(usize),

    /// The gzip stream could not be inflated
    #[error("compressed stream is corrupt: {0}")]
    Decompress(String),

    #[error("truncated varint at offset {offset}")]
    TruncatedVarint { offset: usize },

    #[error("length prefix {length} at offset {offset} reads past the end of the buffer")]
    LengthOverflow { offset: usize, length: u64 },

    #[error("unsupported wire type {wire_type} at offset {offset}")]
    InvalidWireType { wire_type: u64, offset: usize },

    #[error("field number 0 at offset {offset}")]
    ZeroFieldNumber { offset: usize },

    #[error("message has too many fields")]
    TooManyFields,
}

/// Field numbers used to locate note text and formatting runs
///
/// Defaults follow the layout observed in real note stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Field holding the note text, inside the note message
    pub note_text_field: u64,
    /// Repeated sibling of the text field, one entry per attribute run
    pub attribute_run_field: u64,
    /// Inside a run: number of characters covered
    pub run_length_field: u64,
    /// Inside a run: nested paragraph style message
    pub paragraph_style_field: u64,
    /// Inside a paragraph style: style type
    pub style_type_field: u64,
    /// Inside a paragraph style: nested checklist message
    pub checklist_field: u64,
    /// Inside a checklist: done flag
    pub checklist_done_field: u64,
    /// Inside a run: font weight
    pub font_weight_field: u64,
    /// Inside a run: embedded object reference
    pub attachment_field: u64,
    /// Minimum length of a printable run kept by the fallback scan
    pub min_fallback_run: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            note_text_field: 2,
            attribute_run_field: 5,
            run_length_field: 1,
            paragraph_style_field: 2,
            style_type_field: 1,
            checklist_field: 5,
            checklist_done_field: 2,
            font_weight_field: 5,
            attachment_field: 12,
            min_fallback_run: 3,
        }
    }
}

/// Stateless decoder configured with a field layout
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteDecoder {
    config: DecoderConfig,
}

impl NoteDecoder {
    #[must_use]
    pub const fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a raw note payload into text, formatting runs and renderings
    pub fn decode(&self, payload: &[u8]) -> Result<DecodedContent, FormatError> {
        let buffer: Cow<'_, [u8]> = if gzip::is_gzip(payload) {
            Cow::Owned(gzip::gunzip(payload)?)
        } else {
            Cow::Borrowed(payload)
        };

        match note_proto::extract(&buffer, &self.config) {
            Ok(Some(note)) => Ok(build_content(note.text, note.runs)),
            Ok(None) => {
                tracing::debug!("No note text field found, using printable text scan");
                Ok(self.fallback(&buffer))
            }
            Err(error) => {
                tracing::debug!("Note payload is not structured ({error}), using printable text scan");
                Ok(self.fallback(&buffer))
            }
        }
    }

    fn fallback(&self, buffer: &[u8]) -> DecodedContent {
        let text = fallback::scan_printable(buffer, self.config.min_fallback_run);
        build_content(text, Vec::new())
    }
}

/// Decode with the default field layout
pub fn decode(payload: &[u8]) -> Result<DecodedContent, FormatError> {
    NoteDecoder::default().decode(payload)
}

fn build_content(plaintext: String, attribute_runs: Vec<crate::models::AttributeRun>) -> DecodedContent {
    let has_embedded_objects =
        attribute_runs.iter().any(|run| run.has_attachment) || plaintext.contains('\u{FFFC}');
    let markdown = render_markdown(&plaintext, &attribute_runs);
    let html = render_html(&plaintext, &attribute_runs);

    DecodedContent {
        plaintext,
        markdown,
        html,
        attribute_runs,
        has_embedded_objects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttributeRun, FontWeight, ParagraphStyle};
    use crate::test_support::{gzip_bytes, note_payload, note_proto_bytes};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_structured_note() {
        let runs = [
            AttributeRun::new(9).with_style(ParagraphStyle::Title),
            AttributeRun::new(5).with_weight(FontWeight::Bold),
            AttributeRun::new(6),
        ];
        let payload = note_payload("Shopping\nMilk and eggs", &runs);

        let content = decode(&payload).unwrap();
        assert_eq!(content.plaintext, "Shopping\nMilk and eggs");
        assert_eq!(content.attribute_runs.len(), 3);
        assert_eq!(content.markdown, "# Shopping\n**Milk** and eggs");
        assert!(content.html.starts_with("<h1>Shopping</h1>"));
        assert!(!content.has_embedded_objects);
    }

    #[test]
    fn test_decode_uncompressed_payload() {
        let payload = note_proto_bytes("plain body", &[]);
        let content = decode(&payload).unwrap();
        assert_eq!(content.plaintext, "plain body");
        assert_eq!(content.markdown, "plain body");
    }

    #[test]
    fn test_truncated_gzip_header_is_fatal() {
        let result = decode(&[0x1f, 0x8b, 0x08]);
        assert_eq!(result, Err(FormatError::TruncatedHeader(3)));
    }

    #[test]
    fn test_corrupt_gzip_stream_is_fatal() {
        let mut payload = gzip_bytes(&note_proto_bytes("some text", &[]));
        let len = payload.len();
        payload.truncate(len - 12);
        assert!(matches!(decode(&payload), Err(FormatError::Decompress(_))));
    }

    #[test]
    fn test_unstructured_bytes_fall_back_to_text_scan() {
        let content = decode(b"just some plain text").unwrap();
        assert_eq!(content.plaintext, "just some plain text");
        assert!(content.attribute_runs.is_empty());
    }

    #[test]
    fn test_fallback_on_gzipped_garbage() {
        let payload = gzip_bytes(b"\xff\xfeab\x00hello there\x01\x02world!");
        let content = decode(&payload).unwrap();
        assert_eq!(content.plaintext, "hello there\nworld!");
    }

    #[test]
    fn test_over_long_run_is_clamped() {
        let runs = [
            AttributeRun::new(2),
            AttributeRun::new(500).with_weight(FontWeight::Italic),
            AttributeRun::new(3).with_weight(FontWeight::Bold),
        ];
        let content = decode(&note_payload("a bcd", &runs)).unwrap();
        assert_eq!(content.plaintext, "a bcd");
        assert_eq!(content.markdown, "a *bcd*");
    }

    #[test]
    fn test_embedded_object_detected() {
        let mut run = AttributeRun::new(1);
        run.has_attachment = true;
        let content = decode(&note_payload("\u{FFFC}\ncaption", &[run])).unwrap();
        assert!(content.has_embedded_objects);
        assert_eq!(content.plaintext, "\u{FFFC}\ncaption");
        assert_eq!(content.attribute_runs, vec![run]);
    }

    #[test]
    fn test_custom_field_numbers() {
        let config = DecoderConfig {
            note_text_field: 9,
            ..DecoderConfig::default()
        };
        let payload = note_payload("moved field", &[]);

        // Text lives in field 2, so a decoder looking for field 9 only finds
        // printable fragments.
        let content = NoteDecoder::new(config).decode(&payload).unwrap();
        assert!(content.attribute_runs.is_empty());
        assert!(content.plaintext.contains("moved field"));
    }
}
