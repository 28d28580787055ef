use tracing::{debug, info, warn};

use crate::config::Config;
use crate::media::{MediaCommand, MediaCommandBuilder};
use crate::translate::OllamaClient;

/// What the startup check found. Informational only: nothing in the
/// pipeline branches on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentReport {
    /// Name of the first GPU reported by the driver, if any
    pub gpu: Option<String>,
    pub translation_service: bool,
    pub mkvextract: bool,
    pub mkvmerge: bool,
}

impl EnvironmentReport {
    pub fn log(&self) {
        match &self.gpu {
            Some(name) => info!("GPU is available ({}). The translation service can use it.", name),
            None => info!("GPU is not available. Using CPU."),
        }
        if self.translation_service {
            info!("Translation service is ready");
        } else {
            warn!("Translation service is not reachable; requests will produce error markers");
        }
        if !self.mkvextract {
            warn!("mkvextract was not found; extract is unavailable");
        }
        if !self.mkvmerge {
            warn!("mkvmerge was not found; merge is unavailable");
        }
    }
}

pub struct EnvironmentCheck<'a> {
    config: &'a Config,
}

impl<'a> EnvironmentCheck<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Probe GPU, translation service and container tools
    pub async fn run(&self) -> EnvironmentReport {
        let tools = MediaCommandBuilder::new(&self.config.media.mkvextract_path, &self.config.media.mkvmerge_path);
        let report = EnvironmentReport {
            gpu: detect_gpu().await,
            translation_service: self.check_translation_service().await,
            mkvextract: check_tool(tools.extract_version_check()).await,
            mkvmerge: check_tool(tools.merge_version_check()).await,
        };
        report.log();
        report
    }

    async fn check_translation_service(&self) -> bool {
        let client = match OllamaClient::new(&self.config.translate) {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to create HTTP client: {}", e);
                return false;
            }
        };

        match client.check_availability(&self.config.translate.model).await {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}

/// Run a `--version` command and report whether the tool answered
async fn check_tool(command: MediaCommand) -> bool {
    match command.execute().await {
        Ok(version) => {
            info!(
                "{} is available: {}",
                command.binary_path,
                version.lines().next().unwrap_or("unknown version")
            );
            true
        }
        Err(e) => {
            debug!("{} check failed: {}", command.binary_path, e);
            false
        }
    }
}

/// Ask the NVIDIA driver for the installed GPU
pub async fn detect_gpu() -> Option<String> {
    let command = MediaCommand::new("nvidia-smi", "GPU detection")
        .arg("--query-gpu=name")
        .arg("--format=csv,noheader");

    match command.execute().await {
        Ok(stdout) => first_gpu_name(&stdout),
        Err(e) => {
            debug!("GPU detection failed: {}", e);
            None
        }
    }
}

fn first_gpu_name(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
