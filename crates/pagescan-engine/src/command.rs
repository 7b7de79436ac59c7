// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoder backed by external command-line tools.
//
// Each codec family can be mapped to a program (for example `zbarimg` for
// 1-D and QR, `dmtxread` for Data Matrix). The page is written to a
// temporary PNG, the program is run on it, and every non-empty stdout line is
// taken as one decoded code. The child is killed when the family timeout
// passes or the request is cancelled.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use image::{DynamicImage, ImageFormat};
use pagescan_core::error::{Result, ScanError};
use pagescan_core::types::CodecFamily;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::decoder::{CodecRequest, Decoder};

/// Placeholder replaced by the path of the page image.
pub const IMAGE_PLACEHOLDER: &str = "{image}";
/// Placeholder replaced by the family's result cap.
pub const MAX_RESULTS_PLACEHOLDER: &str = "{max}";

/// How often a running tool is checked for exit, timeout or cancellation.
const WAIT_INTERVAL: Duration = Duration::from_millis(5);
/// Longest single wait for tool output before cancellation is rechecked.
const DRAIN_SLICE: Duration = Duration::from_millis(20);

/// One external program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: PathBuf,
    /// Arguments; `{image}` and `{max}` are substituted. Without an `{image}`
    /// argument the image path is appended last.
    #[serde(default)]
    pub args: Vec<String>,
    /// Strip a `Symbology:` prefix from each output line (as `zbarimg`
    /// prints by default).
    #[serde(default)]
    pub strip_prefix: bool,
}

impl ToolCommand {
    fn build(&self, image: &std::path::Path, max_results: usize) -> Command {
        let image_arg = image.to_string_lossy();
        let mut saw_image = false;
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                saw_image |= arg.contains(IMAGE_PLACEHOLDER);
                arg.replace(IMAGE_PLACEHOLDER, &image_arg)
                    .replace(MAX_RESULTS_PLACEHOLDER, &max_results.to_string())
            })
            .collect();

        let mut command = Command::new(&self.program);
        command.args(args);
        if !saw_image {
            command.arg(image);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        command
    }

    fn parse_output(&self, stdout: &str, max_results: usize) -> Vec<String> {
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(':') {
                Some((_, code)) if self.strip_prefix => code.to_string(),
                _ => line.to_string(),
            })
            .take(max_results)
            .collect()
    }
}

/// Tool assignment per codec family. Families without a tool find nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandDecoderConfig {
    pub one_d: Option<ToolCommand>,
    pub data_matrix: Option<ToolCommand>,
    pub qr_code: Option<ToolCommand>,
}

impl CommandDecoderConfig {
    pub fn get(&self, family: CodecFamily) -> Option<&ToolCommand> {
        match family {
            CodecFamily::OneD => self.one_d.as_ref(),
            CodecFamily::DataMatrix => self.data_matrix.as_ref(),
            CodecFamily::QrCode => self.qr_code.as_ref(),
        }
    }

    /// Check that every configured program can be found.
    pub fn validate(&self) -> Result<()> {
        for family in CodecFamily::ALL {
            let Some(tool) = self.get(family) else {
                continue;
            };
            if tool.program.as_os_str().is_empty() {
                return Err(ScanError::Config(format!("{family} tool has an empty program")));
            }
            if tool.program.components().count() > 1 && !tool.program.exists() {
                return Err(ScanError::Config(format!(
                    "{family} tool not found at {}",
                    tool.program.display()
                )));
            }
        }
        Ok(())
    }
}

/// [`Decoder`] that shells out to configured tools.
pub struct CommandDecoder {
    config: CommandDecoderConfig,
}

impl CommandDecoder {
    pub fn new(config: CommandDecoderConfig) -> Result<Self> {
        config.validate()?;
        info!(
            families = ?CodecFamily::ALL
                .into_iter()
                .filter(|f| config.get(*f).is_some())
                .collect::<Vec<_>>(),
            "command decoder configured"
        );
        Ok(Self { config })
    }
}

impl Decoder for CommandDecoder {
    #[instrument(skip_all, fields(family = %request.family))]
    fn decode(&self, image: &DynamicImage, request: &CodecRequest) -> Result<Vec<String>> {
        let Some(tool) = self.config.get(request.family) else {
            debug!("no tool configured");
            return Ok(Vec::new());
        };
        let deadline = Instant::now() + request.timeout;

        let file = tempfile::Builder::new()
            .prefix("pagescan-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(file.path(), ImageFormat::Png)
            .map_err(|err| ScanError::Image(format!("failed to write page image: {err}")))?;

        let mut child = tool
            .build(file.path(), request.max_results)
            .spawn()
            .map_err(|err| {
                ScanError::Decoder(format!("failed to start {}: {}", tool.program.display(), err))
            })?;

        // Stdout is read on its own thread so a chatty tool cannot block on a
        // full pipe, and so a pipe held open by a grandchild cannot hold us
        // past the deadline.
        let (lines_tx, lines) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            std::thread::spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if lines_tx.send(line).is_err() {
                        break;
                    }
                }
            });
        } else {
            drop(lines_tx);
        }

        if !wait_until(&mut child, deadline, request)? {
            return Ok(Vec::new());
        }

        let output = drain_until(&lines, deadline, request);
        Ok(tool.parse_output(&output, request.max_results))
    }
}

/// Wait for `child` to exit. Returns `false` (after killing it) when the
/// deadline passes or the request is cancelled first.
fn wait_until(child: &mut Child, deadline: Instant, request: &CodecRequest) -> Result<bool> {
    loop {
        let status = match child.try_wait() {
            Ok(status) => status,
            Err(err) => {
                stop(child);
                return Err(err.into());
            }
        };
        if let Some(status) = status {
            if !status.success() {
                // zbarimg and dmtxread exit non-zero when nothing was found.
                debug!(?status, "tool exited with failure status");
            }
            return Ok(true);
        }

        let cancelled = request.cancel.is_cancelled();
        if cancelled || Instant::now() >= deadline {
            stop(child);
            debug!(cancelled, "decoder tool stopped before finishing");
            return Ok(false);
        }

        std::thread::sleep(WAIT_INTERVAL);
    }
}

/// Collect stdout lines until the pipe closes, the deadline passes or the
/// request is cancelled. Lines read by then are kept.
fn drain_until(lines: &Receiver<String>, deadline: Instant, request: &CodecRequest) -> String {
    let mut output = String::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match lines.recv_timeout(remaining.min(DRAIN_SLICE)) {
            Ok(line) => {
                output.push_str(&line);
                output.push('\n');
            }
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if request.cancel.is_cancelled() || Instant::now() >= deadline {
                    debug!("tool output still open at deadline, keeping what was read");
                    break;
                }
            }
        }
    }
    output
}

fn stop(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!(%err, "failed to kill decoder tool");
    }
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::CancelToken;

    fn request(family: CodecFamily, timeout_ms: u64) -> CodecRequest {
        CodecRequest {
            family,
            timeout: Duration::from_millis(timeout_ms),
            max_results: family.max_results(),
            cancel: CancelToken::new(),
        }
    }

    fn shell(script: &str, strip_prefix: bool) -> ToolCommand {
        ToolCommand {
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), script.into(), IMAGE_PLACEHOLDER.into()],
            strip_prefix,
        }
    }

    #[test]
    fn parse_output_strips_symbology() {
        let tool = ToolCommand {
            program: PathBuf::from("zbarimg"),
            args: vec![],
            strip_prefix: true,
        };
        let codes = tool.parse_output("QR-Code:hello\n\nQR-Code:a:b\n", 3);
        assert_eq!(codes, vec!["hello", "a:b"]);
    }

    #[test]
    fn parse_output_respects_cap() {
        let tool = shell("", false);
        let codes = tool.parse_output("1\n2\n3\n4\n", 3);
        assert_eq!(codes, vec!["1", "2", "3"]);
    }

    #[test]
    fn empty_program_is_rejected() {
        let config = CommandDecoderConfig {
            qr_code: Some(ToolCommand {
                program: PathBuf::new(),
                args: vec![],
                strip_prefix: false,
            }),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ScanError::Config(_))));
    }

    #[test]
    fn unconfigured_family_finds_nothing() {
        let decoder = CommandDecoder::new(CommandDecoderConfig::default()).unwrap();
        let codes = decoder
            .decode(&DynamicImage::new_luma8(2, 2), &request(CodecFamily::OneD, 100))
            .unwrap();
        assert!(codes.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn reads_codes_from_stdout() {
        let decoder = CommandDecoder::new(CommandDecoderConfig {
            qr_code: Some(shell("test -f \"$0\" && echo QR-Code:first && echo QR-Code:second", true)),
            ..Default::default()
        })
        .unwrap();

        let codes = decoder
            .decode(&DynamicImage::new_luma8(2, 2), &request(CodecFamily::QrCode, 5_000))
            .unwrap();
        assert_eq!(codes, vec!["first", "second"]);
    }

    #[cfg(unix)]
    #[test]
    fn slow_tool_is_killed_at_timeout() {
        let decoder = CommandDecoder::new(CommandDecoderConfig {
            one_d: Some(shell("sleep 5; echo too-late", false)),
            ..Default::default()
        })
        .unwrap();

        let started = Instant::now();
        let codes = decoder
            .decode(&DynamicImage::new_luma8(2, 2), &request(CodecFamily::OneD, 100))
            .unwrap();
        assert!(codes.is_empty());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[test]
    fn cancelled_request_stops_tool() {
        let decoder = CommandDecoder::new(CommandDecoderConfig {
            data_matrix: Some(shell("sleep 5; echo too-late", false)),
            ..Default::default()
        })
        .unwrap();
        let request = request(CodecFamily::DataMatrix, 10_000);
        request.cancel.cancel();

        let started = Instant::now();
        let codes = decoder.decode(&DynamicImage::new_luma8(2, 2), &request).unwrap();
        assert!(codes.is_empty());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[test]
    fn background_child_holding_stdout_does_not_outlast_timeout() {
        let decoder = CommandDecoder::new(CommandDecoderConfig {
            one_d: Some(shell("sleep 3 & echo X", false)),
            ..Default::default()
        })
        .unwrap();

        let started = Instant::now();
        let codes = decoder
            .decode(&DynamicImage::new_luma8(2, 2), &request(CodecFamily::OneD, 300))
            .unwrap();
        assert_eq!(codes, vec!["X"]);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn stop_kills_and_reaps_the_child() {
        let mut child = Command::new("sh")
            .args(["-c", "sleep 5"])
            .stdout(Stdio::null())
            .spawn()
            .unwrap();

        let started = Instant::now();
        stop(&mut child);

        assert!(child.try_wait().unwrap().is_some());
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
