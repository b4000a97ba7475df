use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default User-Agent sent with every request. Some CDNs refuse the bare
/// libcurl agent string.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Retry tuning (optional section in config.toml). The per-segment retry
/// count itself is a per-job setting; this only tunes the backoff unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Backoff unit in seconds; the delay before retry `k` (0-based) is
    /// `(1 + k)` units.
    pub base_delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: 1.0,
        }
    }
}

/// Tool-level configuration loaded from `~/.config/hlsget/config.toml`.
///
/// Holds the knobs the CLI does not expose. Per-run parameters (URL, output
/// location, worker count, retry count) live in [`JobConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// TCP connect timeout per request, in seconds.
    pub connect_timeout_secs: u64,
    /// Abort a transfer if throughput stays below this many bytes/sec...
    pub low_speed_limit_bytes: u32,
    /// ...for this many seconds.
    pub low_speed_time_secs: u64,
    /// Hard per-request timeout in seconds; safety net for stuck transfers.
    pub request_timeout_secs: u64,
    /// Gap-closing rounds after the first pass before giving up.
    pub reconcile_rounds: u32,
    /// Maximum variant-playlist hops before a cyclic reference is assumed.
    pub variant_depth: u32,
    /// Maximum iframe hops when discovering a playlist from a playback page.
    pub discover_depth: u32,
    /// User-Agent header for every request.
    pub user_agent: String,
    /// External remux program for the assembly fallback.
    pub remux_program: String,
    /// Optional retry tuning; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 30,
            request_timeout_secs: 900,
            reconcile_rounds: 2,
            variant_depth: 5,
            discover_depth: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            remux_program: "ffmpeg".to_string(),
            retry: None,
        }
    }
}

impl ToolConfig {
    /// Backoff unit as a `Duration`, falling back to the built-in default.
    pub fn retry_base_delay(&self) -> std::time::Duration {
        let secs = self
            .retry
            .as_ref()
            .map(|r| r.base_delay_secs)
            .unwrap_or_else(|| RetryConfig::default().base_delay_secs);
        std::time::Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Per-run parameters, owned by the CLI. Defaults match the documented
/// surface: directory `downloaded_video`, file `output.mp4`, 10 workers,
/// 3 retries per segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Playback page URL or direct m3u8 link.
    pub url: String,
    /// Directory receiving segment files and the final artifact.
    pub output_dir: PathBuf,
    /// File name of the final artifact, inside `output_dir`.
    pub output_file: String,
    /// Concurrency ceiling for segment fetches.
    pub max_workers: usize,
    /// Additional attempts per segment after the first fails.
    pub max_retries: u32,
    /// Suppress the console progress line.
    pub quiet: bool,
}

impl JobConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output_dir: PathBuf::from("downloaded_video"),
            output_file: "output.mp4".to_string(),
            max_workers: 10,
            max_retries: 3,
            quiet: false,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hlsget")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ToolConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ToolConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ToolConfig = toml::from_str(&data)?;
    Ok(cfg)
}
