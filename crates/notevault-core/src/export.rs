//! Version history export.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::store::VersionSnapshot;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Serializable version representation used in JSON and Markdown exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportVersion {
    pub note_id: String,
    pub title: String,
    pub folder_path: String,
    pub version_number: u32,
    pub captured_at: i64,
    pub source_modified_at: Option<i64>,
    pub content_hash: String,
    pub word_count: usize,
    pub markdown: String,
}

/// Convert a stored snapshot into an export record.
#[must_use]
pub fn snapshot_to_export_item(snapshot: &VersionSnapshot) -> ExportVersion {
    ExportVersion {
        note_id: snapshot.note_id.clone(),
        title: snapshot.title.clone(),
        folder_path: snapshot.folder_path.clone(),
        version_number: snapshot.version_number,
        captured_at: snapshot.captured_at,
        source_modified_at: snapshot.source_modified_at,
        content_hash: snapshot.content_hash.clone(),
        word_count: snapshot.word_count,
        markdown: snapshot.markdown.clone(),
    }
}

/// Render versions as pretty-printed JSON.
pub fn render_json_export(versions: &[VersionSnapshot]) -> serde_json::Result<String> {
    let items = versions
        .iter()
        .map(snapshot_to_export_item)
        .collect::<Vec<ExportVersion>>();
    serde_json::to_string_pretty(&items)
}

/// Render versions in Markdown, one front matter block per version.
#[must_use]
pub fn render_markdown_export(versions: &[VersionSnapshot]) -> String {
    let mut output = String::new();

    for (index, snapshot) in versions.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let item = snapshot_to_export_item(snapshot);
        let _ = writeln!(output, "---");
        let _ = writeln!(output, "note_id: {}", item.note_id);
        let _ = writeln!(output, "title: {}", yaml_string(&item.title));
        let _ = writeln!(output, "folder: {}", yaml_string(&item.folder_path));
        let _ = writeln!(output, "version: {}", item.version_number);
        let _ = writeln!(output, "captured_at: {}", format_timestamp(item.captured_at));
        if let Some(modified) = item.source_modified_at {
            let _ = writeln!(output, "source_modified_at: {}", format_timestamp(modified));
        }
        let _ = writeln!(output, "content_hash: {}", item.content_hash);
        let _ = writeln!(output, "---");
        let _ = writeln!(output);
        output.push_str(&item.markdown);
        output.push('\n');
    }

    output
}

/// Render versions based on selected export format.
pub fn render_versions_export(
    versions: &[VersionSnapshot],
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(versions),
        ExportFormat::Markdown => Ok(render_markdown_export(versions)),
    }
}

/// Build a deterministic default file name for an exported note history.
#[must_use]
pub fn suggested_export_file_name(note_id: &str, format: ExportFormat, timestamp_ms: i64) -> String {
    let stem = crate::util::sanitize_file_stem(note_id, "note");
    format!("notevault-{stem}-{timestamp_ms}.{}", format.extension())
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map_or_else(|| millis.to_string(), |time| time.to_rfc3339())
}

fn yaml_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}
