// Container tooling
//
// Thin wrappers over mkvtoolnix:
// - Commands: command representation and builders
// - Processor: track extraction and subtitle merging

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for container operations
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Extract one subtitle track of `video_path` into `<output_dir>/<stem>.srt`
    async fn extract_subtitle_track(
        &self,
        video_path: &Path,
        track_id: u32,
        output_dir: &Path,
    ) -> Result<PathBuf>;

    /// Mux `subtitle_path` next to the streams of `video_path` into `output_path`
    async fn merge_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (mkvtoolnix-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
