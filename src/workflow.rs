use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, SubtransError};
use crate::media::{merged_output_path, MediaProcessorFactory, MediaProcessorTrait};
use crate::subtitle::read_srt_file;
use crate::translate::batch::TranslationStats;
use crate::translate::{BatchTranslator, OllamaClient, TranslationBackend};

const SUBTITLE_EXTENSIONS: &[&str] = &["srt"];
const MERGE_VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4"];
const EXTRACT_VIDEO_EXTENSIONS: &[&str] = &["mkv"];

/// Result of translating one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Translated { output: PathBuf, stats: TranslationStats },
    /// No well-formed subtitle in the input, nothing written
    Empty,
}

/// Per-file tally of a translation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub translated: usize,
    pub empty: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Per-file tally of an extract or merge run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Workflow {
    config: Config,
    backend: Arc<dyn TranslationBackend>,
    media: Box<dyn MediaProcessorTrait>,
    show_progress: bool,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let backend = Arc::new(OllamaClient::new(&config.translate)?);
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: Config, backend: Arc<dyn TranslationBackend>) -> Result<Self> {
        config.validate()?;
        let media = MediaProcessorFactory::create_processor(config.media.clone());

        Ok(Self {
            config,
            backend,
            media,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `<dir>/<stem><suffix>.srt` next to the input
    pub fn output_path_for(&self, input_path: &Path) -> Result<PathBuf> {
        let stem = input_path.file_stem()
            .ok_or_else(|| SubtransError::Config(format!("Invalid subtitle filename: {}", input_path.display())))?
            .to_string_lossy();
        let name = format!("{}{}.srt", stem, self.config.translate.output_suffix);

        Ok(match input_path.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        })
    }

    /// Where extracted SRT files from `dir` go when no output directory is
    /// given. A relative `extract_output_dir` is resolved under `dir`.
    pub fn extract_output_dir_for<P: AsRef<Path>>(&self, dir: P) -> PathBuf {
        let configured = Path::new(&self.config.media.extract_output_dir);
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            dir.as_ref().join(configured)
        }
    }

    /// SRT files directly inside `dir`, leaving out our own outputs
    pub fn discover_srt_files<P: AsRef<Path>>(&self, dir: P) -> Vec<PathBuf> {
        let suffix = &self.config.translate.output_suffix;
        find_files(dir.as_ref(), SUBTITLE_EXTENSIONS)
            .into_iter()
            .filter(|path| {
                suffix.is_empty()
                    || !path.file_stem()
                        .map(|stem| stem.to_string_lossy().ends_with(suffix.as_str()))
                        .unwrap_or(false)
            })
            .collect()
    }

    /// Parse one SRT file and write its translation
    pub async fn process_srt_file<P: AsRef<Path>>(&self, input_path: P) -> Result<FileOutcome> {
        let input_path = input_path.as_ref();
        info!("Processing SRT file: {}", input_path.display());

        let mut records = read_srt_file(input_path).await?;
        if records.is_empty() {
            info!("No subtitles found in {}, nothing to translate", input_path.display());
            return Ok(FileOutcome::Empty);
        }

        let output = self.output_path_for(input_path)?;
        let translator = BatchTranslator::new(self.backend.clone(), &self.config.translate)?
            .with_progress(self.show_progress);
        let stats = translator.translate(&mut records, &output).await?;

        info!(
            "Finished processing SRT file: {}. Output saved to {}",
            input_path.display(),
            output.display()
        );
        Ok(FileOutcome::Translated { output, stats })
    }

    /// Translate the given files one after another
    pub async fn translate_files(&self, paths: &[PathBuf]) -> RunSummary {
        let mut summary = RunSummary::default();

        if paths.is_empty() {
            info!("No SRT files found.");
            return summary;
        }

        for path in paths {
            match self.process_srt_file(path).await {
                Ok(FileOutcome::Translated { .. }) => summary.translated += 1,
                Ok(FileOutcome::Empty) => summary.empty += 1,
                Err(SubtransError::FileNotFound(_)) => {
                    warn!("Input file '{}' not found", path.display());
                    summary.missing += 1;
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", path.display(), e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Translation run finished: {} translated, {} empty, {} missing, {} failed",
            summary.translated, summary.empty, summary.missing, summary.failed
        );
        summary
    }

    /// Translate every SRT file in a directory
    pub async fn translate_directory<P: AsRef<Path>>(&self, dir: P) -> Result<RunSummary> {
        let dir = dir.as_ref();
        ensure_directory(dir)?;
        info!("Processing directory: {}", dir.display());

        let files = self.discover_srt_files(dir);
        info!("Found {} SRT files to process", files.len());
        Ok(self.translate_files(&files).await)
    }

    /// Pull the configured subtitle track out of every MKV in `dir`
    pub async fn extract_directory<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        dir: P,
        track_id: u32,
        output_dir: Q,
    ) -> Result<MediaSummary> {
        let dir = dir.as_ref();
        let output_dir = output_dir.as_ref();
        ensure_directory(dir)?;

        let videos = find_files(dir, EXTRACT_VIDEO_EXTENSIONS);
        let mut summary = MediaSummary::default();
        if videos.is_empty() {
            info!("No MKV files found in {}", dir.display());
            return Ok(summary);
        }

        for video in &videos {
            match self.media.extract_subtitle_track(video, track_id, output_dir).await {
                Ok(_) => summary.succeeded += 1,
                Err(e @ SubtransError::ToolNotFound(_)) => return Err(e),
                Err(e) => {
                    warn!("Error extracting track from {}: {}", video.display(), e);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Mux each video in `dir` with its same-named SRT file
    pub async fn merge_directory<P: AsRef<Path>>(&self, dir: P) -> Result<MediaSummary> {
        let dir = dir.as_ref();
        ensure_directory(dir)?;

        let language = &self.config.media.subtitle_language;
        let merged_marker = format!(" ({})", language.to_uppercase());
        let mut summary = MediaSummary::default();

        for video in find_files(dir, MERGE_VIDEO_EXTENSIONS) {
            let is_merge_output = video.file_stem()
                .map(|stem| stem.to_string_lossy().ends_with(&merged_marker))
                .unwrap_or(false);
            if is_merge_output {
                continue;
            }

            let srt_path = video.with_extension("srt");
            if !srt_path.is_file() {
                info!("No corresponding SRT file found for {}", video.display());
                summary.skipped += 1;
                continue;
            }

            let output = merged_output_path(&video, language)?;
            match self.media.merge_subtitles(&video, &srt_path, &output).await {
                Ok(()) => {
                    info!(
                        "Merged {} with {} to {}",
                        video.display(),
                        srt_path.display(),
                        output.display()
                    );
                    summary.succeeded += 1;
                }
                Err(e @ SubtransError::ToolNotFound(_)) => return Err(e),
                Err(e) => {
                    warn!("Failed to merge {}: {}", video.display(), e);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(SubtransError::FileNotFound(dir.display().to_string()))
    }
}

/// Files directly inside `dir` with one of `extensions` (case-insensitive), sorted
fn find_files(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();

    files.sort();
    files
}
