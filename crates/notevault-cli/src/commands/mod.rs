pub mod check;
pub mod common;
pub mod completions;
pub mod config;
pub mod decode;
pub mod export;
pub mod prune;
pub mod sync;
pub mod versions;
pub mod watch;
