use crate::produce::ProduceConfig;
use crate::render::RenderSettings;
use crate::upload::UploadSettings;
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Deserialize)]
struct StaticConfig {
    #[serde(default = "default_plan_file")]
    plan_file: PathBuf,
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default = "default_assets_dir")]
    assets_dir: PathBuf,
    /// Defaults to <assets_dir>/fonts/arial.ttf.
    #[serde(default)]
    font_file: Option<PathBuf>,
    #[serde(default = "default_lessons_per_run")]
    lessons_per_run: usize,
    presenter: String,
    series: String,
    #[serde(default)]
    upload: UploadSection,
}

#[derive(Deserialize)]
struct UploadSection {
    #[serde(default = "default_client_secrets_file")]
    client_secrets_file: PathBuf,
    #[serde(default = "default_credentials_file")]
    credentials_file: PathBuf,
    #[serde(default = "default_privacy")]
    privacy: String,
    #[serde(default = "default_category_id")]
    category_id: String,
    #[serde(default = "default_short_delay")]
    short_upload_delay_secs: u64,
}

impl Default for UploadSection {
    fn default() -> Self {
        Self {
            client_secrets_file: default_client_secrets_file(),
            credentials_file: default_credentials_file(),
            privacy: default_privacy(),
            category_id: default_category_id(),
            short_upload_delay_secs: default_short_delay(),
        }
    }
}

fn default_plan_file() -> PathBuf {
    "content_plan.json".into()
}
fn default_output_dir() -> PathBuf {
    "output".into()
}
fn default_assets_dir() -> PathBuf {
    "assets".into()
}
fn default_lessons_per_run() -> usize {
    1
}
fn default_client_secrets_file() -> PathBuf {
    "client_secrets.json".into()
}
fn default_credentials_file() -> PathBuf {
    "credentials.json".into()
}
fn default_privacy() -> String {
    "public".into()
}
fn default_category_id() -> String {
    // 28 = Science & Technology.
    "28".into()
}
fn default_short_delay() -> u64 {
    30
}

/// Fully merged configuration for a production run.
#[derive(Debug)]
pub struct AppConfig {
    pub produce: ProduceConfig,
    pub render: RenderSettings,
    pub upload: UploadSettings,
    pub font_file: PathBuf,
    pub google_api_key: String,
    pub pexels_api_key: Option<String>,
}

/// Loads just the upload settings from the static config, for the
/// authorization flow that needs no API secrets from the environment.
pub fn load_upload_settings<P: AsRef<Path>>(path: P) -> Result<UploadSettings> {
    let content = fs::read_to_string(path.as_ref())
        .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path.as_ref(), e))?;
    let static_conf: StaticConfig = serde_yaml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config YAML: {e}"))?;
    Ok(UploadSettings {
        client_secrets_file: static_conf.upload.client_secrets_file,
        credentials_file: static_conf.upload.credentials_file,
        privacy: static_conf.upload.privacy,
        category_id: static_conf.upload.category_id,
    })
}

/// Loads a static YAML config file (no secrets) and injects required env vars
/// for secrets. Returns a fully merged AppConfig or an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let google_api_key = match std::env::var("GOOGLE_API_KEY") {
        Ok(key) => {
            info!("GOOGLE_API_KEY found in env");
            key
        }
        Err(e) => {
            error!(error = ?e, "GOOGLE_API_KEY environment variable not set");
            return Err(anyhow::anyhow!(
                "GOOGLE_API_KEY environment variable not set: {e}"
            ));
        }
    };

    // Optional: slides fall back to a solid colour background without it.
    let pexels_api_key = std::env::var("PEXELS_API_KEY").ok();
    if pexels_api_key.is_none() {
        info!("PEXELS_API_KEY not set, slides will use solid colour backgrounds");
    }

    let font_file = static_conf
        .font_file
        .unwrap_or_else(|| static_conf.assets_dir.join("fonts").join("arial.ttf"));
    let music_file = static_conf.assets_dir.join("music").join("bg_music.mp3");

    let produce = ProduceConfig {
        plan_file: static_conf.plan_file,
        output_dir: static_conf.output_dir.clone(),
        lessons_per_run: static_conf.lessons_per_run,
        presenter: static_conf.presenter.clone(),
        series: static_conf.series.clone(),
        short_upload_delay_secs: static_conf.upload.short_upload_delay_secs,
    };

    let render = RenderSettings {
        output_dir: static_conf.output_dir,
        music_file,
        presenter: static_conf.presenter,
        series: static_conf.series,
    };

    let upload = UploadSettings {
        client_secrets_file: static_conf.upload.client_secrets_file,
        credentials_file: static_conf.upload.credentials_file,
        privacy: static_conf.upload.privacy,
        category_id: static_conf.upload.category_id,
    };

    info!(
        plan_file = ?produce.plan_file,
        output_dir = %produce.output_dir.display(),
        lessons_per_run = produce.lessons_per_run,
        "Config loaded and merged successfully"
    );

    Ok(AppConfig {
        produce,
        render,
        upload,
        font_file,
        google_api_key,
        pexels_api_key,
    })
}
