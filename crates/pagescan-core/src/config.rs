// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan configuration and its JSON persistence.

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScanError};
use crate::range::{PageRange, RenderQuality};
use crate::types::{CodecConfig, OverrunPolicy};

/// Settings for one decode run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Enable flags and time budgets for each codec family.
    pub codecs: CodecConfig,
    /// Time allowed for all enabled codecs on one page, in milliseconds.
    pub page_timeout_ms: u64,
    /// Which pages to render and decode.
    pub page_range: PageRange,
    /// Render quality (1–10).
    pub quality: RenderQuality,
    /// What to do with codec tasks still running at the page deadline.
    pub overrun_policy: OverrunPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            codecs: CodecConfig::default(),
            page_timeout_ms: 5000,
            page_range: PageRange::all(),
            quality: RenderQuality::default(),
            overrun_policy: OverrunPolicy::Cancel,
        }
    }
}

impl ScanConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    /// Reject settings that cannot produce a meaningful run.
    ///
    /// Front-ends call this for early feedback. A decode session runs any
    /// config as given: a zero budget just times the page out.
    pub fn validate(&self) -> Result<()> {
        if self.page_timeout_ms == 0 {
            return Err(ScanError::Config(
                "page_timeout_ms must be greater than zero".into(),
            ));
        }
        for family in self.codecs.enabled_families() {
            if self.codecs.get(family).timeout_ms == 0 {
                return Err(ScanError::Config(format!(
                    "{family} codec is enabled with a zero timeout"
                )));
            }
        }
        Ok(())
    }
}

/// Load a JSON settings file into `T`. Missing keys fall back to defaults
/// when `T` is `#[serde(default)]`; values are not validated here.
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)?;
    let config = serde_json::from_str(&data)?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Write `config` as pretty-printed JSON.
pub fn persist_config<T: Serialize>(path: impl AsRef<Path>, config: &T) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "configuration written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CodecFamily, CodecSettings};

    #[test]
    fn defaults_enable_every_family() {
        let config = ScanConfig::default();
        for family in CodecFamily::ALL {
            assert_eq!(config.codecs.get(family), CodecSettings::enabled(300));
        }
        assert_eq!(config.page_timeout(), Duration::from_secs(5));
        assert_eq!(config.quality.value(), 3);
        assert!(config.page_range.use_all);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_page_timeout_is_rejected() {
        let config = ScanConfig {
            page_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ScanError::Config(_))));
    }

    #[test]
    fn disabled_codec_may_have_zero_timeout() {
        let mut config = ScanConfig::default();
        config.codecs.set(CodecFamily::QrCode, CodecSettings::disabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn persist_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagescan.json");
        let mut config = ScanConfig::default();
        config.page_timeout_ms = 1200;
        config.overrun_policy = OverrunPolicy::Detach;

        persist_config(&path, &config).unwrap();
        let loaded: ScanConfig = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "page_timeout_ms": 900 }"#).unwrap();

        let loaded: ScanConfig = load_config(&path).unwrap();
        assert_eq!(loaded.page_timeout_ms, 900);
        assert_eq!(loaded.codecs, CodecConfig::default());
    }

    #[test]
    fn loading_does_not_validate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.json");
        std::fs::write(&path, r#"{ "page_timeout_ms": 0 }"#).unwrap();

        let loaded: ScanConfig = load_config(&path).unwrap();
        assert_eq!(loaded.page_timeout_ms, 0);
        assert!(loaded.validate().is_err());
    }
}
