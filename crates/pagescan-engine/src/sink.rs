// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-page result list shared by the codec tasks of one page.

use std::sync::{Arc, Mutex};

use pagescan_core::types::CodecFamily;
use tracing::debug;

/// Mutex-protected list the codec tasks of one page append to.
///
/// Each task appends its whole result in one locked step, so a family's own
/// order is preserved while the order between families is whatever the tasks
/// finish in. Once the orchestrator seals the sink, further appends are
/// refused: a task that outlives its page deadline cannot change a result
/// that has already been handed on.
#[derive(Debug, Clone, Default)]
pub struct ResultSink {
    inner: Arc<Mutex<SinkState>>,
}

#[derive(Debug, Default)]
struct SinkState {
    codes: Vec<String>,
    sealed: bool,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one family's codes. Returns `false` if the sink was already
    /// sealed and the codes were dropped.
    pub fn append(&self, family: CodecFamily, codes: Vec<String>) -> bool {
        let Ok(mut state) = self.inner.lock() else {
            return false;
        };
        if state.sealed {
            debug!(%family, dropped = codes.len(), "sink sealed, late codes dropped");
            return false;
        }
        state.codes.extend(codes);
        true
    }

    /// Number of codes merged so far.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|s| s.codes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the sink and take everything merged so far.
    pub fn seal(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|mut state| {
                state.sealed = true;
                std::mem::take(&mut state.codes)
            })
            .unwrap_or_default()
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.lock().map(|s| s.sealed).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_keep_family_order() {
        let sink = ResultSink::new();
        assert!(sink.append(CodecFamily::OneD, vec!["a".into(), "b".into()]));
        assert!(sink.append(CodecFamily::QrCode, vec!["q".into()]));
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.seal(), vec!["a", "b", "q"]);
    }

    #[test]
    fn sealed_sink_refuses_appends() {
        let sink = ResultSink::new();
        sink.append(CodecFamily::OneD, vec!["early".into()]);
        let codes = sink.seal();

        assert!(sink.is_sealed());
        assert!(!sink.append(CodecFamily::DataMatrix, vec!["late".into()]));
        assert_eq!(codes, vec!["early"]);
        assert!(sink.is_empty());
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let sink = ResultSink::new();
        let handles: Vec<_> = CodecFamily::ALL
            .into_iter()
            .map(|family| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        sink.append(family, vec![format!("{family}-{i}")]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sink.seal().len(), 300);
    }
}
