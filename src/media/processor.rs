use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::MediaConfig;
use crate::error::{Result, SubtransError};
use super::{MediaCommandBuilder, MediaProcessorTrait};

/// Concrete implementation of media processor (mkvtoolnix-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.mkvextract_path, &config.mkvmerge_path);

        Self {
            config,
            command_builder,
        }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .ok_or_else(|| SubtransError::Media(format!("Invalid video filename: {}", path.display())))
}

/// `<dir>/<stem> (<LANG>).mkv`, the container written by a subtitle merge
pub fn merged_output_path(video_path: &Path, language: &str) -> Result<PathBuf> {
    let stem = file_stem(video_path)?;
    let name = format!("{} ({}).mkv", stem, language.to_uppercase());
    Ok(match video_path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    })
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn extract_subtitle_track(
        &self,
        video_path: &Path,
        track_id: u32,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let stem = file_stem(video_path)?;
        fs::create_dir_all(output_dir).await?;

        let track_path = output_dir.join(format!("{}_track_{}.track", stem, track_id));
        let srt_path = output_dir.join(format!("{}.srt", stem));

        let command = self.command_builder.extract_track(video_path, track_id, &track_path);
        if let Err(e) = command.execute().await {
            if fs::metadata(&track_path).await.is_ok() {
                debug!("Removing partial track file {}", track_path.display());
                if let Err(remove_err) = fs::remove_file(&track_path).await {
                    warn!("Failed to remove {}: {}", track_path.display(), remove_err);
                }
            }
            return Err(e);
        }
        info!(
            "Extracted track {} from {} to {}",
            track_id,
            video_path.display(),
            track_path.display()
        );

        fs::rename(&track_path, &srt_path).await?;
        info!("Renamed {} to {}", track_path.display(), srt_path.display());

        Ok(srt_path)
    }

    async fn merge_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Merging {} into {} -> {}",
            subtitle_path.display(),
            video_path.display(),
            output_path.display()
        );

        let command = self.command_builder.merge_subtitles(
            video_path,
            subtitle_path,
            output_path,
            &self.config.subtitle_language,
            &self.config.subtitle_charset,
        );
        command.execute().await?;

        Ok(())
    }
}
