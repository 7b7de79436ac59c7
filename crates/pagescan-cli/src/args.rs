// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pagescan_core::ScanConfig;
use pagescan_core::range::{PageRange, RenderQuality};
use pagescan_core::types::{CodecFamily, CodecSettings, OverrunPolicy};

use crate::settings::CliSettings;

#[derive(Parser, Debug)]
#[command(name = "pagescan")]
#[command(
    version,
    about = "Render document pages and harvest 1-D, Data Matrix and QR codes"
)]
pub struct Cli {
    /// JSON settings file (see `init-config`)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode every selected page and print the codes found
    Decode(DecodeArgs),
    /// Write the selected pages to image files
    Export(ExportArgs),
    /// Write a starter settings file
    InitConfig {
        /// Destination of the settings file
        #[arg(default_value = "pagescan.json")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Options shared by every command that renders pages.
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Pages to process: `all`, `N` or `START-END`
    #[arg(short, long)]
    pub pages: Option<PageRange>,

    /// Render quality, 1 to 10 (out-of-range values are clamped)
    #[arg(short, long, allow_negative_numbers = true)]
    pub quality: Option<i64>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// PDF or image file to decode
    pub input: PathBuf,

    #[command(flatten)]
    pub render: RenderArgs,

    /// Time allowed per page, in milliseconds
    #[arg(long)]
    pub page_timeout_ms: Option<u64>,

    /// Time allowed per codec family, in milliseconds
    #[arg(long)]
    pub codec_timeout_ms: Option<u64>,

    /// Only run these codec families (repeatable)
    #[arg(long = "only", value_enum)]
    pub only: Vec<FamilyArg>,

    /// What to do with codec tasks still running at the page deadline
    #[arg(long, value_enum)]
    pub overrun: Option<OverrunArg>,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// PDF or image file to export
    pub input: PathBuf,

    #[command(flatten)]
    pub render: RenderArgs,

    /// Output directory (created if missing)
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// File name stem; defaults to the input file stem
    #[arg(long)]
    pub base_name: Option<String>,

    /// Image format of the written files
    #[arg(long, value_enum, default_value_t = FormatArg::Png)]
    pub format: FormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyArg {
    #[value(name = "1d")]
    OneD,
    Datamatrix,
    Qr,
}

impl From<FamilyArg> for CodecFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::OneD => CodecFamily::OneD,
            FamilyArg::Datamatrix => CodecFamily::DataMatrix,
            FamilyArg::Qr => CodecFamily::QrCode,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrunArg {
    Cancel,
    Detach,
}

impl From<OverrunArg> for OverrunPolicy {
    fn from(arg: OverrunArg) -> Self {
        match arg {
            OverrunArg::Cancel => OverrunPolicy::Cancel,
            OverrunArg::Detach => OverrunPolicy::Detach,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Png,
    Jpeg,
    Bmp,
    Tiff,
}

impl From<FormatArg> for image::ImageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => image::ImageFormat::Png,
            FormatArg::Jpeg => image::ImageFormat::Jpeg,
            FormatArg::Bmp => image::ImageFormat::Bmp,
            FormatArg::Tiff => image::ImageFormat::Tiff,
        }
    }
}

impl RenderArgs {
    /// Range and quality after overlaying flags on the settings file.
    pub fn resolve(&self, scan: &ScanConfig) -> (PageRange, RenderQuality) {
        (
            self.pages.unwrap_or(scan.page_range),
            self.quality.map(RenderQuality::new).unwrap_or(scan.quality),
        )
    }
}

impl DecodeArgs {
    /// Overlay command-line flags on the loaded settings.
    pub fn apply(&self, settings: &mut CliSettings) {
        let scan = &mut settings.scan;
        (scan.page_range, scan.quality) = self.render.resolve(scan);

        if let Some(ms) = self.page_timeout_ms {
            scan.page_timeout_ms = ms;
        }
        if let Some(policy) = self.overrun {
            scan.overrun_policy = policy.into();
        }
        if let Some(ms) = self.codec_timeout_ms {
            for family in CodecFamily::ALL {
                let mut codec = scan.codecs.get(family);
                codec.timeout_ms = ms;
                scan.codecs.set(family, codec);
            }
        }
        if !self.only.is_empty() {
            let wanted: Vec<CodecFamily> = self.only.iter().map(|f| (*f).into()).collect();
            for family in CodecFamily::ALL {
                if !wanted.contains(&family) {
                    scan.codecs.set(family, CodecSettings::disabled());
                } else if !scan.codecs.get(family).enabled {
                    let timeout_ms = match scan.codecs.get(family).timeout_ms {
                        0 => CodecSettings::default().timeout_ms,
                        ms => ms,
                    };
                    scan.codecs.set(family, CodecSettings::enabled(timeout_ms));
                }
            }
        }
    }
}
