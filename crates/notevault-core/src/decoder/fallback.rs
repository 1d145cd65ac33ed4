//! Last-resort text recovery for payloads the structured walk cannot read

/// Collect printable ASCII runs of at least `min_run` bytes, one per line
pub fn scan_printable(data: &[u8], min_run: usize) -> String {
    data.split(|byte| !is_printable(*byte))
        .filter(|run| run.len() >= min_run.max(1))
        .map(|run| String::from_utf8_lossy(run).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

const fn is_printable(byte: u8) -> bool {
    matches!(byte, 0x20..=0x7e)
}
