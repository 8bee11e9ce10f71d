use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_LATITUDE: f64 = 23.7145;
pub const DEFAULT_LONGITUDE: f64 = -15.9369;
pub const DEFAULT_AREA_HECTARES: f64 = 5.0;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// 3D generation tier requested from the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Test,
    Demo,
}

/// Module and array defaults used for every `analyze` request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelDefaults {
    pub module_width_m: f64,
    pub module_height_m: f64,
    pub module_power_wc: f64,
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub row_spacing_m: f64,
    pub system_loss_pct: f64,
    pub albedo: f64,
}

impl Default for PanelDefaults {
    fn default() -> Self {
        Self {
            module_width_m: 1.134,
            module_height_m: 2.278,
            module_power_wc: 550.0,
            tilt_deg: 25.0,
            azimuth_deg: 180.0,
            row_spacing_m: 3.0,
            system_loss_pct: 14.0,
            albedo: 0.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area_hectares: f64,
    pub mode: RenderMode,
    /// Whole-request timeout for `analyze`. Streams are bounded by cancellation instead.
    pub request_timeout: Duration,
    pub panels: PanelDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            area_hectares: DEFAULT_AREA_HECTARES,
            mode: RenderMode::Test,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            panels: PanelDefaults::default(),
        }
    }
}

impl Config {
    /// Reads `SOLARSITE_*` variables, seeding from `.env` when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("SOLARSITE_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(v) = parse_f64(&lookup, "SOLARSITE_LATITUDE")? {
            config.latitude = v;
        }
        if let Some(v) = parse_f64(&lookup, "SOLARSITE_LONGITUDE")? {
            config.longitude = v;
        }
        if let Some(v) = parse_f64(&lookup, "SOLARSITE_AREA_HECTARES")? {
            config.area_hectares = v;
        }
        if let Some(raw) = lookup("SOLARSITE_MODE") {
            config.mode = match raw.trim().to_ascii_lowercase().as_str() {
                "test" => RenderMode::Test,
                "demo" => RenderMode::Demo,
                _ => {
                    return Err(ConfigError::InvalidMode {
                        key: "SOLARSITE_MODE",
                        value: raw,
                    })
                }
            };
        }
        if let Some(raw) = lookup("SOLARSITE_REQUEST_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                key: "SOLARSITE_REQUEST_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_f64<F>(lookup: &F, key: &'static str) -> Result<Option<f64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(ConfigError::InvalidNumber { key, value: raw }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.mode, RenderMode::Test);
        assert_eq!(config.panels.module_height_m, 2.278);
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = Config::from_lookup(lookup_from(&[
            ("SOLARSITE_API_URL", "https://api.example.org/"),
            ("SOLARSITE_LATITUDE", "45.5"),
            ("SOLARSITE_MODE", "Demo"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://api.example.org");
        assert_eq!(config.latitude, 45.5);
        assert_eq!(config.mode, RenderMode::Demo);
    }

    #[test]
    fn test_rejects_garbage_numbers() {
        let err = Config::from_lookup(lookup_from(&[("SOLARSITE_LONGITUDE", "west")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "SOLARSITE_LONGITUDE", .. }));
    }
}
