use crate::Config;
use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use std::path::{Path, PathBuf};

/// Prefix of environment variable overrides; `__` separates nested keys,
/// e.g. `PHOTOFERRY_STAGING__BUCKET`.
pub const ENV_PREFIX: &str = "PHOTOFERRY_";

/// Platform config file location, e.g. `~/.config/photoferry/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "photoferry").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn file_provider(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

impl Config {
    /// Load and validate configuration.
    ///
    /// An explicit `path` must exist. Without one, the platform default is
    /// used if present. Environment variables override file values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut figment = Figment::new();
        match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => figment = file_provider(figment, path)?,
            None => match default_path() {
                Some(default) if default.is_file() => figment = file_provider(figment, &default)?,
                _ => tracing::debug!("no config file found, using environment only"),
            },
        }
        let config: Config = figment
            .merge(Env::prefixed(prefix).split("__"))
            .extract()
            .or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        Ok(config)
    }
}
