//! Locating the note body inside the decompressed message tree

use super::wire::{parse_message, Field};
use super::{DecoderConfig, FormatError};
use crate::models::{AttributeRun, FontWeight, ParagraphStyle};

/// Nesting limit for the recursive search
const MAX_DEPTH: usize = 24;

/// Note text and formatting recovered from a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedNote {
    pub text: String,
    pub runs: Vec<AttributeRun>,
}

struct Candidate<'a> {
    text: &'a str,
    runs: Vec<&'a [u8]>,
    depth: usize,
}

/// Find the note text and its attribute runs
///
/// The top-level buffer must parse as a message, otherwise the framing error
/// is returned. Nested length-delimited fields that fail to parse are simply
/// treated as opaque bytes. When several text fields qualify the deepest one
/// wins.
pub fn extract(data: &[u8], config: &DecoderConfig) -> Result<Option<ExtractedNote>, FormatError> {
    let fields = parse_message(data)?;
    let mut best = None;
    search(&fields, 0, config, &mut best);

    Ok(best.map(|candidate| ExtractedNote {
        text: candidate.text.to_string(),
        runs: parse_runs(&candidate.runs, config),
    }))
}

fn search<'a>(
    fields: &[Field<'a>],
    depth: usize,
    config: &DecoderConfig,
    best: &mut Option<Candidate<'a>>,
) {
    // Runs belong to the text next to them; their attachment info carries
    // strings of its own that must not compete with the note body.
    let has_text = fields.iter().any(|field| {
        field.number == config.note_text_field && field.as_bytes().and_then(as_note_text).is_some()
    });

    for field in fields {
        let Some(bytes) = field.as_bytes() else {
            continue;
        };
        if has_text && field.number == config.attribute_run_field {
            continue;
        }

        if field.number == config.note_text_field {
            if let Some(text) = as_note_text(bytes) {
                if best.as_ref().map_or(true, |current| depth > current.depth) {
                    *best = Some(Candidate {
                        text,
                        runs: sibling_runs(fields, config),
                        depth,
                    });
                }
                continue;
            }
        }

        if depth < MAX_DEPTH && bytes.len() >= 2 {
            if let Ok(children) = parse_message(bytes) {
                search(&children, depth + 1, config, best);
            }
        }
    }
}

/// Valid UTF-8 made of printable characters and line breaks
fn as_note_text(bytes: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(bytes).ok()?;
    let printable = !text.is_empty()
        && text
            .chars()
            .all(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'));
    printable.then_some(text)
}

fn sibling_runs<'a>(fields: &[Field<'a>], config: &DecoderConfig) -> Vec<&'a [u8]> {
    fields
        .iter()
        .filter(|field| field.number == config.attribute_run_field)
        .filter_map(Field::as_bytes)
        .collect()
}

/// Parse run messages in order, stopping at the first malformed one
fn parse_runs(raw_runs: &[&[u8]], config: &DecoderConfig) -> Vec<AttributeRun> {
    let mut runs = Vec::with_capacity(raw_runs.len());
    for raw in raw_runs {
        match parse_run(raw, config) {
            Ok(run) => runs.push(run),
            Err(error) => {
                tracing::debug!("Ignoring attribute runs from malformed entry: {error}");
                break;
            }
        }
    }
    runs
}

fn parse_run(raw: &[u8], config: &DecoderConfig) -> Result<AttributeRun, FormatError> {
    let mut run = AttributeRun::default();

    for field in parse_message(raw)? {
        if field.number == config.run_length_field {
            if let Some(length) = field.as_varint() {
                run.length = usize::try_from(length).unwrap_or(usize::MAX);
            }
        } else if field.number == config.paragraph_style_field {
            if let Some(bytes) = field.as_bytes() {
                run.paragraph_style = parse_paragraph_style(bytes, config)?;
            }
        } else if field.number == config.font_weight_field {
            if let Some(weight) = field.as_varint() {
                run.font_weight = FontWeight::from_raw(weight);
            }
        } else if field.number == config.attachment_field {
            run.has_attachment = true;
        }
    }

    Ok(run)
}

fn parse_paragraph_style(raw: &[u8], config: &DecoderConfig) -> Result<ParagraphStyle, FormatError> {
    let mut style = ParagraphStyle::None;
    let mut checklist_done = None;

    for field in parse_message(raw)? {
        if field.number == config.style_type_field {
            if let Some(value) = field.as_varint() {
                style = ParagraphStyle::from_raw(value);
            }
        } else if field.number == config.checklist_field {
            if let Some(bytes) = field.as_bytes() {
                let done = parse_message(bytes)?
                    .iter()
                    .filter(|item| item.number == config.checklist_done_field)
                    .find_map(Field::as_varint)
                    .unwrap_or(0);
                checklist_done = Some(done != 0);
            }
        }
    }

    Ok(match (style, checklist_done) {
        (ParagraphStyle::Checkbox | ParagraphStyle::None, Some(done)) => {
            ParagraphStyle::checklist(done)
        }
        (style, _) => style,
    })
}
