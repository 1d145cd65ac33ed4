//! Helpers shared by unit tests: payload encoding and an in-memory note
//! application.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::LazyLock;

use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use regex::Regex;

use crate::error::{Error, Result};
use crate::models::{AttributeRun, FontWeight, ParagraphStyle, SourceNote};
use crate::source::{NoteSink, NoteSource};

pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

pub fn varint_field(number: u64, value: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    write_varint(&mut buf, number << 3);
    write_varint(&mut buf, value);
    buf
}

pub fn bytes_field(number: u64, bytes: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_varint(&mut buf, (number << 3) | 2);
    write_varint(&mut buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
    buf
}

/// Encode a run with the default field layout
pub fn run_bytes(run: &AttributeRun) -> Vec<u8> {
    let mut buf = varint_field(1, run.length as u64);

    let style = match run.paragraph_style {
        ParagraphStyle::None => None,
        ParagraphStyle::Title => Some((0, None)),
        ParagraphStyle::Heading => Some((1, None)),
        ParagraphStyle::Subheading => Some((2, None)),
        ParagraphStyle::Monospace => Some((4, None)),
        ParagraphStyle::BulletDot => Some((100, None)),
        ParagraphStyle::BulletDash => Some((101, None)),
        ParagraphStyle::Numbered => Some((102, None)),
        ParagraphStyle::Checkbox => Some((103, Some(0))),
        ParagraphStyle::CheckedCheckbox => Some((103, Some(1))),
    };
    if let Some((style_type, done)) = style {
        let mut style_buf = varint_field(1, style_type);
        if let Some(done) = done {
            let mut checklist = bytes_field(1, b"item-uuid");
            checklist.extend(varint_field(2, done));
            style_buf.extend(bytes_field(5, &checklist));
        }
        buf.extend(bytes_field(2, &style_buf));
    }

    let weight = match run.font_weight {
        FontWeight::None => 0,
        FontWeight::Bold => 1,
        FontWeight::Italic => 2,
        FontWeight::BoldItalic => 3,
    };
    if weight != 0 {
        buf.extend(varint_field(5, weight));
    }
    if run.has_attachment {
        let mut info = bytes_field(1, b"attachment-uuid");
        info.extend(bytes_field(2, b"public.jpeg"));
        buf.extend(bytes_field(12, &info));
    }
    buf
}

/// Uncompressed note store message: store { 2: document { 2: version, 3: note } }
pub fn note_proto_bytes(text: &str, runs: &[AttributeRun]) -> Vec<u8> {
    let mut note = Vec::new();
    for run in runs {
        note.extend(bytes_field(5, &run_bytes(run)));
    }
    note.extend(bytes_field(2, text.as_bytes()));

    let mut document = varint_field(2, 0);
    document.extend(bytes_field(3, &note));
    bytes_field(2, &document)
}

pub fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Compressed payload as the note store keeps it
pub fn note_payload(text: &str, runs: &[AttributeRun]) -> Vec<u8> {
    gzip_bytes(&note_proto_bytes(text, runs))
}

pub fn source_note(uuid: &str, title: &str, folder: &str, text: &str) -> SourceNote {
    SourceNote {
        uuid: uuid.to_string(),
        title: title.to_string(),
        folder_path: folder.to_string(),
        modified_at: 1_700_000_000_000,
        is_locked: false,
        raw_payload: note_payload(text, &[]),
    }
}

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// In-memory note application acting as both source and sink
#[derive(Default)]
pub struct MemoryNotes {
    notes: Mutex<Vec<SourceNote>>,
    folders: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    fail_writes: AtomicBool,
    fail_list: AtomicBool,
}

impl MemoryNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, uuid: &str, title: &str, folder: &str, text: &str) {
        self.notes.lock().push(source_note(uuid, title, folder, text));
    }

    pub fn insert_note(&self, note: SourceNote) {
        self.notes.lock().push(note);
    }

    pub fn set_text(&self, uuid: &str, text: &str) {
        if let Some(note) = self.notes.lock().iter_mut().find(|n| n.uuid == uuid) {
            note.raw_payload = note_payload(text, &[]);
            note.modified_at += 1;
        }
    }

    pub fn set_payload(&self, uuid: &str, payload: Vec<u8>) {
        if let Some(note) = self.notes.lock().iter_mut().find(|n| n.uuid == uuid) {
            note.raw_payload = payload;
        }
    }

    pub fn set_locked(&self, uuid: &str, locked: bool) {
        if let Some(note) = self.notes.lock().iter_mut().find(|n| n.uuid == uuid) {
            note.is_locked = locked;
        }
    }

    pub fn remove(&self, uuid: &str) {
        self.notes.lock().retain(|n| n.uuid != uuid);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn text_of(&self, uuid: &str) -> Option<String> {
        let note = self.get_note(uuid).ok()??;
        crate::decoder::decode(&note.raw_payload)
            .ok()
            .map(|content| content.plaintext)
    }

    pub fn count(&self) -> usize {
        self.notes.lock().len()
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::Reconciliation("automation unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn html_to_text(html: &str) -> String {
        let with_breaks = html
            .replace("</p>", "\n")
            .replace("</h1>", "\n")
            .replace("</li>", "\n");
        TAGS.replace_all(&with_breaks, "").trim_end().to_string()
    }
}

impl NoteSource for MemoryNotes {
    fn list_notes(&self) -> Result<Vec<SourceNote>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::Database(rusqlite::Error::InvalidQuery));
        }
        Ok(self.notes.lock().clone())
    }

    fn get_note(&self, uuid: &str) -> Result<Option<SourceNote>> {
        Ok(self.notes.lock().iter().find(|n| n.uuid == uuid).cloned())
    }
}

impl NoteSink for MemoryNotes {
    fn create_note(&self, title: &str, html_body: &str, folder: &str) -> Result<String> {
        self.check_writes()?;
        let uuid = format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.insert(&uuid, title, folder, &Self::html_to_text(html_body));
        Ok(uuid)
    }

    fn update_note(&self, title: &str, html_body: &str, folder: &str) -> Result<()> {
        self.check_writes()?;
        let mut notes = self.notes.lock();
        let note = notes
            .iter_mut()
            .find(|n| n.title == title && n.folder_path == folder)
            .ok_or_else(|| Error::NotFound(format!("note '{title}' in '{folder}'")))?;
        note.raw_payload = note_payload(&Self::html_to_text(html_body), &[]);
        note.modified_at += 1;
        Ok(())
    }

    fn note_exists(&self, title: &str, folder: &str) -> Result<bool> {
        self.check_writes()?;
        Ok(self
            .notes
            .lock()
            .iter()
            .any(|n| n.title == title && n.folder_path == folder))
    }

    fn create_folder(&self, name: &str) -> Result<()> {
        self.check_writes()?;
        self.folders.lock().push(name.to_string());
        Ok(())
    }

    fn folder_exists(&self, name: &str) -> Result<bool> {
        self.check_writes()?;
        Ok(self.folders.lock().iter().any(|f| f == name)
            || self.notes.lock().iter().any(|n| n.folder_path == name))
    }
}
