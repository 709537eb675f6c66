//! Optional TOML configuration.
//!
//! ```toml
//! target = "C:/XboxGames/Minecraft/Content/Minecraft.Windows.exe"
//! backup = true
//! signatures = "signatures.json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use sigpatch::{DEFAULT_TARGET, SignatureSet, builtin_signatures, load_signatures};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Executable to patch when no path is given on the command line
    pub target: PathBuf,
    /// Create `<target>.bak` before patching
    pub backup: bool,
    /// JSON signature table replacing the builtin one
    pub signatures: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: PathBuf::from(DEFAULT_TARGET),
            backup: true,
            signatures: None,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the explicit config, or the per-user one if it exists.
    ///
    /// Falls back to defaults when nothing usable is found.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file, using defaults");
                    return Self::default();
                }
            },
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{:#}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Signature table from `override_path`, the config, or the builtin set.
    pub fn signature_set(&self, override_path: Option<&Path>) -> Result<SignatureSet> {
        match override_path.or(self.signatures.as_deref()) {
            Some(path) => {
                let set = load_signatures(path)
                    .with_context(|| format!("Failed to load signatures from {}", path.display()))?;
                info!("Loaded signatures from {}", path.display());
                Ok(set)
            }
            None => builtin_signatures().context("Builtin signature table is invalid"),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sigpatch").join("config.toml"))
}
