//! Writes to the note application through `osascript`.

use std::process::Command;

use notevault_core::util::compact_text;
use notevault_core::{Error, NoteSink, Result};

const DEFAULT_PROGRAM: &str = "osascript";

/// Note sink that drives the application's scripting interface
pub struct OsascriptSink {
    program: String,
}

impl Default for OsascriptSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OsascriptSink {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Use another interpreter binary
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, script: &str) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-e")
            .arg(script)
            .output()
            .map_err(|error| Error::Reconciliation(format!("failed to run {}: {error}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Reconciliation(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                compact_text(&stderr)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl NoteSink for OsascriptSink {
    fn create_note(&self, title: &str, html_body: &str, folder: &str) -> Result<String> {
        self.run(&create_note_script(title, html_body, folder))
    }

    fn update_note(&self, title: &str, html_body: &str, folder: &str) -> Result<()> {
        self.run(&update_note_script(title, html_body, folder))?;
        Ok(())
    }

    fn note_exists(&self, title: &str, folder: &str) -> Result<bool> {
        Ok(self.run(&note_exists_script(title, folder))? == "true")
    }

    fn create_folder(&self, name: &str) -> Result<()> {
        self.run(&format!(
            "tell application \"Notes\" to make new folder with properties {{name:{}}}",
            quote(name)
        ))?;
        Ok(())
    }

    fn folder_exists(&self, name: &str) -> Result<bool> {
        let script = format!(
            "tell application \"Notes\" to return exists folder {}",
            quote(name)
        );
        Ok(self.run(&script)? == "true")
    }
}

/// AppleScript string literal for `value`
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn create_note_script(title: &str, html_body: &str, folder: &str) -> String {
    format!(
        "tell application \"Notes\"\n\
         \tset newNote to make new note at folder {} with properties {{name:{}, body:{}}}\n\
         \treturn id of newNote\n\
         end tell",
        quote(folder),
        quote(title),
        quote(html_body)
    )
}

pub fn update_note_script(title: &str, html_body: &str, folder: &str) -> String {
    format!(
        "tell application \"Notes\"\n\
         \tset body of (first note of folder {} whose name is {}) to {}\n\
         end tell",
        quote(folder),
        quote(title),
        quote(html_body)
    )
}

pub fn note_exists_script(title: &str, folder: &str) -> String {
    format!(
        "tell application \"Notes\"\n\
         \tif not (exists folder {folder}) then return false\n\
         \treturn (count of (notes of folder {folder} whose name is {})) > 0\n\
         end tell",
        quote(title),
        folder = quote(folder)
    )
}
