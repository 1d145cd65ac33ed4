use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use notevault_core::config::{default_config_path, VaultConfig};
use notevault_core::db::Database;
use notevault_core::models::{SyncStateRecord, TrackedNote};
use notevault_core::sync::{SyncActionKind, SyncPlan, SyncReport};
use notevault_core::util::normalize_text_option;
use notevault_core::{
    ChangeMonitor, CheckSummary, DecodedContent, NoteDecoder, SyncEngine, SyncOptions,
    VersionRecord, VersionStore,
};

use crate::automation::OsascriptSink;
use crate::cli::ContentFormat;
use crate::error::CliError;
use crate::note_store::AppleNotesSource;

pub const CONFIG_ENV: &str = "NOTEVAULT_CONFIG";

/// Explicit flag, then `$NOTEVAULT_CONFIG`, then the platform default
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = normalize_text_option(env::var(CONFIG_ENV).ok()) {
        return Ok(PathBuf::from(path));
    }
    Ok(default_config_path()?)
}

pub fn load_config(explicit: Option<&Path>) -> Result<(VaultConfig, PathBuf), CliError> {
    let path = resolve_config_path(explicit)?;
    let config = VaultConfig::load_from_path(&path)?;
    Ok((config, path))
}

pub fn open_store(config: &VaultConfig) -> Result<Arc<VersionStore>, CliError> {
    let store = VersionStore::open(config.version_root()?, config.index_path()?)?;
    Ok(Arc::new(store))
}

pub fn open_monitor(
    config: &VaultConfig,
    store: Arc<VersionStore>,
) -> Result<ChangeMonitor, CliError> {
    let source = Arc::new(AppleNotesSource::new(config.source_path()?));
    let db = Database::open(config.index_path()?)?;
    Ok(ChangeMonitor::new(source, store, db)
        .with_decoder(NoteDecoder::new(config.decoder))
        .with_retention(config.retention))
}

pub fn open_sync_engine(config: &VaultConfig, options: SyncOptions) -> Result<SyncEngine, CliError> {
    let source = Arc::new(AppleNotesSource::new(config.source_path()?));
    let sink = Arc::new(OsascriptSink::new());
    let db = Database::open(config.index_path()?)?;
    Ok(SyncEngine::new(source, sink, db)
        .with_decoder(NoteDecoder::new(config.decoder))
        .with_options(options))
}

/// Render decoded or stored content in the requested form
pub fn render_content(content: &DecodedContent, format: ContentFormat) -> Result<String, CliError> {
    Ok(match format {
        ContentFormat::Text => content.plaintext.clone(),
        ContentFormat::Markdown => content.markdown.clone(),
        ContentFormat::Html => content.html.clone(),
        ContentFormat::Json => serde_json::to_string_pretty(content)?,
    })
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |time| time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let month = 30 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < month {
        format!("{}d ago", diff / day)
    } else {
        format!("{}mo ago", diff / month)
    }
}

pub fn format_summary(summary: &CheckSummary) -> String {
    format!(
        "{} created, {} changed, {} deleted, {} unchanged, {} locked, {} failed",
        summary.created,
        summary.changed,
        summary.deleted,
        summary.unchanged,
        summary.locked,
        summary.failed
    )
}

pub fn format_version_lines(versions: &[VersionRecord]) -> Vec<String> {
    versions
        .iter()
        .map(|version| {
            let short_hash = version.content_hash.chars().take(12).collect::<String>();
            format!(
                "v{:03}  {}  {:>6} words  {short_hash}",
                version.version_number,
                format_timestamp(version.captured_at),
                version.word_count
            )
        })
        .collect()
}

pub fn format_tracked_lines(notes: &[(TrackedNote, Option<u32>)]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|(note, latest)| {
            let latest = latest.map_or_else(|| "-".to_string(), |n| format!("v{n}"));
            let seen = format_relative_time(note.updated_at, now_ms);
            let deleted = if note.is_deleted { "  [deleted]" } else { "" };
            format!(
                "{:<36}  {:<5}  {:<10}  {} / {}{deleted}",
                note.uuid, latest, seen, note.folder_path, note.title
            )
        })
        .collect()
}

pub fn format_plan_lines(plan: &SyncPlan) -> Vec<String> {
    plan.actions
        .iter()
        .map(|action| format!("{:<16}  {}", action.kind.as_str(), action.local_path))
        .collect()
}

pub fn format_report(report: &SyncReport) -> String {
    format!(
        "{} pushed, {} pulled, {} created remotely, {} created locally, {} adopted, \
         {} conflicts, {} deleted locally, {} deleted remotely, {} failed",
        report.pushed,
        report.pulled,
        report.created_remote,
        report.created_local,
        report.adopted,
        report.conflicts,
        report.deleted_locally,
        report.deleted_remotely,
        report.failed()
    )
}

pub fn format_status_lines(records: &[SyncStateRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let synced = record
                .last_sync_at
                .map_or_else(|| "never".to_string(), format_timestamp);
            format!("{:<16}  {:<24}  {}", record.status.as_str(), synced, record.local_path)
        })
        .collect()
}

/// Whether a plan has anything worth warning about
pub fn plan_has_conflicts(plan: &SyncPlan) -> bool {
    plan.count(SyncActionKind::Conflict) > 0
}
