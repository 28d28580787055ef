use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate SRT files through the local LLM endpoint
    Translate {
        /// SRT files to translate; when empty, every SRT file in --dir is used
        inputs: Vec<PathBuf>,

        /// Directory scanned for SRT files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Model identifier passed to the translation service
        #[arg(short, long)]
        model: Option<String>,

        /// Number of concurrent requests per batch
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Target language code or name
        #[arg(short, long)]
        target_lang: Option<String>,
    },

    /// Extract a subtitle track from every MKV file in a directory
    Extract {
        /// Directory containing MKV files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Track id to extract
        #[arg(short, long)]
        track_id: Option<u32>,

        /// Directory receiving the extracted SRT files, by default the
        /// configured extract_output_dir under --dir
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Merge each video with its same-named SRT file into a new MKV
    Merge {
        /// Directory containing videos and SRT files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Language tag of the subtitle track
        #[arg(short, long)]
        language: Option<String>,

        /// Character set of the SRT files
        #[arg(long)]
        charset: Option<String>,
    },

    /// Report GPU, translation service and mkvtoolnix availability
    Check,

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "subtrans.toml")]
        output: PathBuf,
    },
}
