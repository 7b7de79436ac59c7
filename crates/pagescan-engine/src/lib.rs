// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagescan-engine: Decode orchestration.
//
// Each page gets one blocking task per enabled codec family. The tasks share
// a single result sink, and the page is joined under its own deadline. A
// session drives a whole document through rendering, per-page decoding and
// report aggregation.

pub mod command;
pub mod decoder;
pub mod orchestrator;
pub mod session;
pub mod sink;
pub mod task;

pub use command::{CommandDecoder, CommandDecoderConfig, ToolCommand};
pub use decoder::{CancelToken, CodecRequest, Decoder};
pub use orchestrator::PageDecodeOrchestrator;
pub use session::DecodeSession;
pub use sink::ResultSink;
pub use task::CodecTask;
