//! Explicit configuration registry: a single struct carrying the knobs
//! (cache root, precision grid exponent, job timeout, Wi-Fi SSID
//! whitelist) that would otherwise be read from scattered global state.
//! Built once at startup and passed by reference to every component that
//! needs it.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `$CACHE_ROOT` — filesystem root for the blob cache.
    pub cache_root: PathBuf,
    /// Exponent `n` in the `2⁻ⁿ` precision-grid rule; `n = 20` is the
    /// default millimeter-scale grid.
    pub precision_grid_exponent: i32,
    /// A `RUNNING` job row older than this with no heartbeat lock held is
    /// reassigned to `TIMEOUT`.
    pub job_timeout: Duration,
    /// Restricts the Locator to scans from these SSIDs; `None` accepts any.
    pub wifi_ssid_whitelist: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cache_root: PathBuf::from("./cache"),
            precision_grid_exponent: 20,
            job_timeout: Duration::from_secs(10),
            wifi_ssid_whitelist: None,
        }
    }
}

impl Config {
    pub fn precision_scale(&self) -> f64 {
        2f64.powi(-self.precision_grid_exponent)
    }

    pub fn accepts_ssid(&self, ssid: &str) -> bool {
        match &self.wifi_ssid_whitelist {
            None => true,
            Some(list) => list.iter().any(|s| s == ssid),
        }
    }
}
