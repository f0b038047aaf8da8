//! Dispatcher configuration, loaded once at startup.
//!
//! Values come from built-in defaults, then an optional `video-dispatch.toml`,
//! then `VIDEO_*` environment variables (highest precedence). The result is
//! validated once and handed to the clients and the dispatcher; nothing
//! re-reads the environment per call.

use std::path::Path;

use serde::Deserialize;

use crate::error::DispatchError;

pub const DEFAULT_CONFIG_FILE: &str = "video-dispatch.toml";

/// Placeholder replaced by the job id in [`DispatchConfig::image_url_template`].
pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Bearer token for the generation provider.
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub provider_base_url: String,

    #[serde(default)]
    pub store_base_url: String,

    /// Model used when a job leaves `videoModel` blank.
    #[serde(default)]
    pub default_model: String,

    /// Cap on jobs in `processing` at admission time.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_prompt")]
    pub default_prompt: String,

    #[serde(default = "default_resolution")]
    pub default_resolution: String,

    #[serde(default = "default_allowed_resolutions")]
    pub allowed_resolutions: Vec<String>,

    #[serde(default = "default_duration_secs")]
    pub duration_secs: u32,

    /// Hosting URL for a job's source image, with `{id}` standing in for the job id.
    #[serde(default = "default_image_url_template")]
    pub image_url_template: String,

    /// Interval between ticks in `watch` mode.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Overall budget for one tick. Outbound calls have no timeout of their own.
    #[serde(default = "default_tick_timeout_secs")]
    pub tick_timeout_secs: u64,

    /// Run archival as tracked background tasks instead of awaiting it inline.
    #[serde(default)]
    pub archive_in_background: bool,
}

fn default_max_concurrent() -> usize {
    5
}

fn default_prompt() -> String {
    "Bring this photo to life with gentle, natural motion. Keep faces and framing unchanged."
        .to_string()
}

fn default_resolution() -> String {
    "720p".to_string()
}

fn default_allowed_resolutions() -> Vec<String> {
    vec!["720p".to_string(), "1080p".to_string()]
}

fn default_duration_secs() -> u32 {
    5
}

fn default_image_url_template() -> String {
    "https://drive.google.com/uc?export=download&id={id}".to_string()
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_tick_timeout_secs() -> u64 {
    240
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            provider_base_url: String::new(),
            store_base_url: String::new(),
            default_model: String::new(),
            max_concurrent: default_max_concurrent(),
            default_prompt: default_prompt(),
            default_resolution: default_resolution(),
            allowed_resolutions: default_allowed_resolutions(),
            duration_secs: default_duration_secs(),
            image_url_template: default_image_url_template(),
            tick_interval_secs: default_tick_interval_secs(),
            tick_timeout_secs: default_tick_timeout_secs(),
            archive_in_background: false,
        }
    }
}

impl DispatchConfig {
    /// Load from `path` (or `video-dispatch.toml` if present) and the process environment.
    ///
    /// An explicitly given path must exist. Every failure here is a
    /// [`DispatchError::Config`], so `tick` can report it as a `CONFIG` fault.
    /// Validation is a separate step.
    pub fn load(path: Option<&Path>) -> Result<Self, DispatchError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, DispatchError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DispatchError::Config(format!("reading {}: {e}", path.display())))?;
        toml::from_str::<DispatchConfig>(&contents)
            .map_err(|e| DispatchError::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Overlay `VIDEO_*` variables. Blank values are ignored; a set but
    /// unparsable number is an error.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), DispatchError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("VIDEO_API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = get("VIDEO_PROVIDER_BASE_URL") {
            self.provider_base_url = v;
        }
        if let Some(v) = get("VIDEO_STORE_BASE_URL") {
            self.store_base_url = v;
        }
        if let Some(v) = get("VIDEO_DEFAULT_MODEL") {
            self.default_model = v;
        }
        if let Some(v) = get("VIDEO_IMAGE_URL_TEMPLATE") {
            self.image_url_template = v;
        }
        if let Some(v) = get("VIDEO_MAX_CONCURRENT") {
            self.max_concurrent = v.trim().parse().map_err(|_| {
                DispatchError::Config(format!(
                    "VIDEO_MAX_CONCURRENT must be a non-negative integer, got {v:?}"
                ))
            })?;
        }
        Ok(())
    }

    /// Check required keys and internal consistency, normalising base URLs.
    pub fn validate(mut self) -> Result<Self, DispatchError> {
        let missing: Vec<&str> = [
            ("api_key", &self.api_key),
            ("provider_base_url", &self.provider_base_url),
            ("store_base_url", &self.store_base_url),
            ("default_model", &self.default_model),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(DispatchError::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        self.allowed_resolutions = self
            .allowed_resolutions
            .iter()
            .map(|r| r.trim().to_ascii_lowercase())
            .collect();
        self.default_resolution = self.default_resolution.trim().to_ascii_lowercase();
        if !self.allowed_resolutions.contains(&self.default_resolution) {
            return Err(DispatchError::Config(format!(
                "default_resolution {} is not one of {:?}",
                self.default_resolution, self.allowed_resolutions
            )));
        }

        if !self.image_url_template.contains(ID_PLACEHOLDER) {
            return Err(DispatchError::Config(format!(
                "image_url_template must contain {ID_PLACEHOLDER}"
            )));
        }

        self.provider_base_url = self.provider_base_url.trim_end_matches('/').to_string();
        self.store_base_url = self.store_base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Source image URL for a job.
    pub fn image_url(&self, job_id: &str) -> String {
        self.image_url_template.replace(ID_PLACEHOLDER, job_id)
    }

    /// The job's resolution if it is allowed, otherwise the default.
    pub fn resolve_resolution(&self, requested: Option<&str>) -> String {
        requested
            .map(|r| r.trim().to_ascii_lowercase())
            .filter(|r| self.allowed_resolutions.contains(r))
            .unwrap_or_else(|| self.default_resolution.clone())
    }
}
