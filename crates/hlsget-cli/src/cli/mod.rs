//! CLI for the hlsget downloader.

mod render;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::mpsc;

use hlsget_core::config::{self, JobConfig};
use hlsget_core::engine::{self, RunError};

/// hlsget: concurrent HLS/m3u8 stream downloader.
#[derive(Debug, Parser)]
#[command(name = "hlsget")]
#[command(about = "Download and assemble HLS/m3u8 video streams", long_about = None)]
pub struct Cli {
    /// Video playback page URL or direct m3u8 link.
    pub url: String,

    /// Output file name, created inside the download directory.
    #[arg(short = 'o', long = "output", default_value = "output.mp4")]
    pub output: String,

    /// Download directory for segments and the final file.
    #[arg(short = 'd', long = "directory", default_value = "downloaded_video")]
    pub directory: PathBuf,

    /// Number of concurrent download workers.
    #[arg(short = 'w', long = "workers", default_value_t = 10)]
    pub workers: usize,

    /// Retries per segment after a failed attempt.
    #[arg(short = 'r', long = "retries", default_value_t = 3)]
    pub retries: u32,

    /// Quiet mode, do not display the progress line.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    fn into_job(self) -> JobConfig {
        JobConfig {
            url: self.url,
            output_dir: self.directory,
            output_file: self.output,
            max_workers: self.workers,
            max_retries: self.retries,
            quiet: self.quiet,
        }
    }
}

pub fn run_from_args() -> Result<()> {
    let cli = Cli::parse();
    let tool = config::load_or_init()?;
    tracing::debug!(?tool, "loaded config");
    let job = cli.into_job();

    let (stats_tx, renderer) = if job.quiet {
        (None, None)
    } else {
        let (tx, rx) = mpsc::channel();
        (Some(tx), Some(render::spawn(rx)))
    };

    // The engine drops the sender when it returns, which ends the renderer.
    let result = engine::run(&tool, &job, stats_tx);
    if let Some(handle) = renderer {
        let _ = handle.join();
    }

    match result {
        Ok(report) => {
            println!(
                "Done: {} ({} segments, {} bytes, assembled via {})",
                report.output_path.display(),
                report.segment_count,
                report.bytes_written,
                report.assembled_with,
            );
            Ok(())
        }
        Err(RunError::Incomplete {
            incomplete,
            partial_output,
        }) => {
            eprintln!("Unresolved segment indices: {:?}", incomplete.missing);
            if let Some(path) = &partial_output {
                eprintln!(
                    "A partial artifact with gaps was written to {}; segment files \
                     were kept for manual recovery.",
                    path.display()
                );
            }
            Err(RunError::Incomplete {
                incomplete,
                partial_output,
            }
            .into())
        }
        Err(err) => Err(err.into()),
    }
}
