// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CLI settings file: the scan configuration plus the external tool table.

use std::path::Path;

use pagescan_core::ScanConfig;
use pagescan_core::config::{load_config, persist_config};
use pagescan_core::error::Result;
use pagescan_engine::{CommandDecoderConfig, ToolCommand};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    #[serde(flatten)]
    pub scan: ScanConfig,
    pub tools: CommandDecoderConfig,
}

impl CliSettings {
    /// Settings written by `init-config`: defaults plus the usual
    /// zbar/libdmtx tools.
    pub fn starter() -> Self {
        let zbar = |flags: &[&str]| ToolCommand {
            program: "zbarimg".into(),
            args: ["--quiet"]
                .iter()
                .chain(flags)
                .chain(&["{image}"])
                .map(|arg| arg.to_string())
                .collect(),
            strip_prefix: true,
        };
        Self {
            scan: ScanConfig::default(),
            tools: CommandDecoderConfig {
                one_d: Some(zbar(&["-Sqrcode.disable"])),
                data_matrix: Some(ToolCommand {
                    program: "dmtxread".into(),
                    args: vec!["-N{max}".into(), "{image}".into()],
                    strip_prefix: false,
                }),
                qr_code: Some(zbar(&["-Sdisable", "-Sqrcode.enable"])),
            },
        }
    }

    /// Read settings from `path`, or defaults when no path was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("no settings file given, using defaults");
            return Ok(Self::default());
        };
        load_config(path)
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        persist_config(path, self)
    }
}

#[cfg(test)]
mod tests {
    use pagescan_core::types::CodecFamily;

    use super::*;

    #[test]
    fn starter_settings_survive_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagescan.json");

        CliSettings::starter().persist(&path).unwrap();
        let loaded = CliSettings::load(Some(&path)).unwrap();

        assert_eq!(loaded, CliSettings::starter());
        assert!(loaded.tools.get(CodecFamily::DataMatrix).is_some());
    }

    #[test]
    fn scan_keys_sit_at_top_level() {
        let settings: CliSettings =
            serde_json::from_str(r#"{"page_timeout_ms": 800, "tools": {}}"#).unwrap();
        assert_eq!(settings.scan.page_timeout_ms, 800);
        assert_eq!(settings.tools, CommandDecoderConfig::default());
    }

    #[test]
    fn missing_path_gives_defaults() {
        assert_eq!(CliSettings::load(None).unwrap(), CliSettings::default());
    }
}
