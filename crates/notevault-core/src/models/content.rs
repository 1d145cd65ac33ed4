//! Decoded note content

use serde::{Deserialize, Serialize};

/// Character weight applied by an attribute run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    None,
    Bold,
    Italic,
    BoldItalic,
}

impl FontWeight {
    /// Map the raw weight value found in a note payload
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        match value {
            1 => Self::Bold,
            2 => Self::Italic,
            3 => Self::BoldItalic,
            _ => Self::None,
        }
    }
}

/// Paragraph style applied by an attribute run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStyle {
    #[default]
    None,
    Title,
    Heading,
    Subheading,
    Monospace,
    BulletDot,
    BulletDash,
    Numbered,
    Checkbox,
    CheckedCheckbox,
}

impl ParagraphStyle {
    /// Map the raw style type found in a note payload
    ///
    /// Checklists carry a separate "done" flag, see [`Self::checklist`].
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        match value {
            0 => Self::Title,
            1 => Self::Heading,
            2 => Self::Subheading,
            4 => Self::Monospace,
            100 => Self::BulletDot,
            101 => Self::BulletDash,
            102 => Self::Numbered,
            103 => Self::Checkbox,
            _ => Self::None,
        }
    }

    #[must_use]
    pub const fn checklist(done: bool) -> Self {
        if done {
            Self::CheckedCheckbox
        } else {
            Self::Checkbox
        }
    }
}

/// A contiguous character range sharing the same formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeRun {
    /// Number of characters covered, consumed left to right over the plaintext
    pub length: usize,
    pub font_weight: FontWeight,
    pub paragraph_style: ParagraphStyle,
    /// The run anchors an embedded object (attachment, drawing, table)
    #[serde(default)]
    pub has_attachment: bool,
}

impl AttributeRun {
    #[must_use]
    pub const fn new(length: usize) -> Self {
        Self {
            length,
            font_weight: FontWeight::None,
            paragraph_style: ParagraphStyle::None,
            has_attachment: false,
        }
    }

    #[must_use]
    pub const fn with_weight(mut self, font_weight: FontWeight) -> Self {
        self.font_weight = font_weight;
        self
    }

    #[must_use]
    pub const fn with_style(mut self, paragraph_style: ParagraphStyle) -> Self {
        self.paragraph_style = paragraph_style;
        self
    }
}

/// Result of decoding one note payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DecodedContent {
    pub plaintext: String,
    pub markdown: String,
    pub html: String,
    pub attribute_runs: Vec<AttributeRun>,
    pub has_embedded_objects: bool,
}

impl DecodedContent {
    /// Number of Unicode scalar values in the plaintext
    #[must_use]
    pub fn character_count(&self) -> usize {
        self.plaintext.chars().count()
    }

    /// Number of whitespace separated words in the plaintext
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.plaintext.split_whitespace().count()
    }
}
