//! Subtrans - batch subtitle translation
//!
//! Parses SRT files, translates every cue through a local ollama endpoint in
//! barrier-synchronized batches, and writes the translated SRT next to the
//! input. Also wraps mkvtoolnix to extract and merge subtitle tracks.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod setup;
pub mod subtitle;
pub mod translate;
pub mod workflow;
