//! Operator preferences and session settings.
//!
//! Preferences live in a JSON file owned by the operator. Every field has a
//! serde default, so files written by older versions keep loading and a
//! missing file is created with defaults on first use.

use std::{
    fs,
    io,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{packet::ingest::FIELD_DAY_CONTEST_ID, types::Mode};

/// Default preferences file name.
pub const PREFERENCES_FILE: &str = "fd_preferences.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Power limits that decide the QRP and high-power scoring flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerThresholds {
    /// Highest CW power still counted as QRP.
    pub cw_qrp_watts: u32,
    /// Highest phone power still counted as QRP.
    pub phone_qrp_watts: u32,
    /// Highest digital power still counted as QRP.
    pub digital_qrp_watts: u32,
    /// Any contact above this is high power.
    pub high_power_watts: u32,
}

impl Default for PowerThresholds {
    fn default() -> Self {
        Self {
            cw_qrp_watts: 5,
            phone_qrp_watts: 10,
            digital_qrp_watts: 10,
            high_power_watts: 100,
        }
    }
}

impl PowerThresholds {
    /// QRP ceiling for `mode`.
    pub fn qrp_ceiling(&self, mode: Mode) -> u32 {
        match mode {
            Mode::CW => self.cw_qrp_watts,
            Mode::PH => self.phone_qrp_watts,
            Mode::DI => self.digital_qrp_watts,
        }
    }
}

/// Remote log-sync service credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteLogConfig {
    pub enabled: bool,
    /// API base, ending in `/`; `auth/` and `qso/` are appended.
    pub url: String,
    pub api_key: String,
    pub station_profile_id: String,
}

impl Default for RemoteLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "https://www.cloudlog.com/Cloudlog/index.php/api/".to_string(),
            api_key: String::new(),
            station_profile_id: String::new(),
        }
    }
}

/// Operator's own station details, read-only to the log core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub mycall: String,
    pub myclass: String,
    pub mysection: String,
    /// Power in watts logged when a contact carries none.
    pub power: u32,
    pub mygrid: String,
    pub power_thresholds: PowerThresholds,
    pub remote_log: RemoteLogConfig,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            mycall: String::new(),
            myclass: String::new(),
            mysection: String::new(),
            power: 5,
            mygrid: String::new(),
            power_thresholds: PowerThresholds::default(),
            remote_log: RemoteLogConfig::default(),
        }
    }
}

impl Preferences {
    /// Reads `path`, writing defaults there first if it does not exist.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            let prefs = Preferences::default();
            prefs.save(path)?;
            tracing::info!(path = %path.display(), "created default preferences");
            return Ok(prefs);
        }
        Self::load(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Own exchange as sent, e.g. `1D EMA`.
    pub fn own_exchange(&self) -> String {
        format!("{} {}", self.myclass, self.mysection)
    }
}

/// Wiring for one logging session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// `CONTEST_ID` that logged packets must carry.
    pub contest_id: String,
    /// Local UDP address the listener binds.
    pub bind: SocketAddr,
    /// Bound on every lookup and remote-sync call.
    pub network_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            contest_id: FIELD_DAY_CONTEST_ID.to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 2237)),
            network_timeout: Duration::from_secs(2),
        }
    }
}
