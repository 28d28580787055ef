use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Result, SubtransError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    /// Exit code meaning "finished with warnings"
    pub warning_exit_code: Option<i32>,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            warning_exit_code: None,
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add a path argument
    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Set the output file (`-o <path>`)
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-o").path(path)
    }

    /// Language of track 0 of the next input
    pub fn language<S: AsRef<str>>(self, language: S) -> Self {
        self.arg("--language").arg(format!("0:{}", language.as_ref()))
    }

    /// Character set of track 0 of the previous subtitle input
    pub fn sub_charset<S: AsRef<str>>(self, charset: S) -> Self {
        self.arg("--sub-charset").arg(format!("0:{}", charset.as_ref()))
    }

    /// Treat exit `code` as success with warnings
    pub fn warning_exit_code(mut self, code: i32) -> Self {
        self.warning_exit_code = Some(code);
        self
    }

    /// Execute the command, returning its stdout
    pub async fn execute(&self) -> Result<String> {
        debug!("Executing media command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SubtransError::ToolNotFound(format!(
                    "{} (make sure mkvtoolnix is installed and in your PATH)",
                    self.binary_path
                )),
                _ => SubtransError::Media(format!("Failed to execute {}: {}", self.binary_path, e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            // mkvtoolnix reports most errors on stdout
            let detail = if stderr.trim().is_empty() { stdout.clone() } else { stderr };

            if self.warning_exit_code.is_some() && output.status.code() == self.warning_exit_code {
                warn!("{} finished with warnings: {}", self.description, detail.trim());
                return Ok(stdout.to_string());
            }

            return Err(SubtransError::Media(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                detail.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// mkvextract and mkvmerge exit with 1 on warnings and 2 on errors
const MKVTOOLNIX_WARNING_EXIT: i32 = 1;

/// Builder for mkvtoolnix invocations
pub struct MediaCommandBuilder {
    mkvextract_path: String,
    mkvmerge_path: String,
}

impl MediaCommandBuilder {
    pub fn new<S1: Into<String>, S2: Into<String>>(mkvextract_path: S1, mkvmerge_path: S2) -> Self {
        Self {
            mkvextract_path: mkvextract_path.into(),
            mkvmerge_path: mkvmerge_path.into(),
        }
    }

    /// `mkvextract tracks <video> <track_id>:<destination>`
    pub fn extract_track<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        video_path: P,
        track_id: u32,
        destination: Q,
    ) -> MediaCommand {
        MediaCommand::new(&self.mkvextract_path, "Subtitle track extraction")
            .arg("tracks")
            .path(video_path)
            .arg(format!("{}:{}", track_id, destination.as_ref().display()))
            .warning_exit_code(MKVTOOLNIX_WARNING_EXIT)
    }

    /// `mkvmerge -o <output> <video> --language 0:<lang> <srt> --sub-charset 0:<charset>`
    pub fn merge_subtitles<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: Q,
        output_path: R,
        language: &str,
        charset: &str,
    ) -> MediaCommand {
        MediaCommand::new(&self.mkvmerge_path, "Subtitle merge")
            .output(output_path)
            .path(video_path)
            .language(language)
            .path(subtitle_path)
            .sub_charset(charset)
            .warning_exit_code(MKVTOOLNIX_WARNING_EXIT)
    }

    pub fn extract_version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.mkvextract_path, "Version check").arg("--version")
    }

    pub fn merge_version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.mkvmerge_path, "Version check").arg("--version")
    }
}
