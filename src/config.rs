// Configuration - environment-driven application settings
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::transcription::{FallbackStrategy, GradioConfig};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-VL-7B-Instruct";
pub const DEFAULT_LABELS: &str = "person, organization, location, date, event";
pub const DEFAULT_TRANSCRIBE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub hf_token: Option<String>,
    pub gradio_url: String,
    pub gradio_api: String,
    pub default_model: String,
    pub default_labels: String,
    pub transcribe_timeout: Duration,
    pub fallback: FallbackStrategy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_string("DOCSCRIBE_BIND_ADDR", DEFAULT_BIND_ADDR)
            .parse::<SocketAddr>()
            .context("Invalid DOCSCRIBE_BIND_ADDR")?;

        let data_dir = std::env::var("DOCSCRIBE_DATA_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let fallback = env_string("DOCSCRIBE_FALLBACK", "placeholder")
            .parse::<FallbackStrategy>()
            .map_err(|e| anyhow::anyhow!("Invalid DOCSCRIBE_FALLBACK: {}", e))?;

        Ok(Self {
            bind_addr,
            data_dir,
            max_upload_bytes: env_usize("DOCSCRIBE_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            hf_token: std::env::var("HF_TOKEN").ok().filter(|v| !v.trim().is_empty()),
            gradio_url: env_string("DOCSCRIBE_GRADIO_URL", &GradioConfig::default().base_url),
            gradio_api: env_string("DOCSCRIBE_GRADIO_API", &GradioConfig::default().api_name),
            default_model: env_string("DOCSCRIBE_DEFAULT_MODEL", DEFAULT_MODEL),
            default_labels: env_string("DOCSCRIBE_DEFAULT_LABELS", DEFAULT_LABELS),
            transcribe_timeout: Duration::from_secs(env_u64(
                "DOCSCRIBE_TRANSCRIBE_TIMEOUT_SECS",
                DEFAULT_TRANSCRIBE_TIMEOUT_SECS,
            )),
            fallback,
        })
    }

    /// Defaults rooted at `data_dir`, without consulting the environment
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: data_dir.to_path_buf(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            hf_token: None,
            gradio_url: GradioConfig::default().base_url,
            gradio_api: GradioConfig::default().api_name,
            default_model: DEFAULT_MODEL.to_string(),
            default_labels: DEFAULT_LABELS.to_string(),
            transcribe_timeout: Duration::from_secs(DEFAULT_TRANSCRIBE_TIMEOUT_SECS),
            fallback: FallbackStrategy::Placeholder,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("docscribe.db")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    pub fn gradio_config(&self) -> GradioConfig {
        GradioConfig {
            base_url: self.gradio_url.clone(),
            api_name: self.gradio_api.clone(),
            hf_token: self.hf_token.clone(),
            timeout_secs: self.transcribe_timeout.as_secs(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docscribe")
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}
