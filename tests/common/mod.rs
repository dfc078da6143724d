//! Shared fixtures for the watchdog loop tests: scripted height sources and
//! a recording shutdown action.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use watchdog::errors::FetchError;
use watchdog::height::Height;
use watchdog::monitor::{HeightSource, ShutdownAction};

pub fn transport_error(source: &str) -> FetchError {
    FetchError::Transport {
        source: source.to_string(),
        cause: "connection refused".to_string(),
    }
}

/// Height source that replays a scripted sequence of outcomes. Once the
/// script runs dry it keeps answering with a fallback height, optionally
/// raising the stop signal so the loop winds down deterministically.
pub struct ScriptedHeights {
    script: Mutex<VecDeque<Result<Height, FetchError>>>,
    calls: Arc<AtomicUsize>,
    fallback: Height,
    stop_when_exhausted: Option<watch::Sender<bool>>,
}

impl ScriptedHeights {
    pub fn new(script: Vec<Result<Height, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Arc::new(AtomicUsize::new(0)),
            fallback: 0,
            stop_when_exhausted: None,
        }
    }

    /// Empty script: every call answers `height`.
    pub fn always(height: Height) -> Self {
        let mut source = Self::new(Vec::new());
        source.fallback = height;
        source
    }

    pub fn stop_when_exhausted(mut self, stop_tx: watch::Sender<bool>) -> Self {
        self.stop_when_exhausted = Some(stop_tx);
        self
    }

    /// Handle that stays readable after the source moves into the watchdog.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl HeightSource for ScriptedHeights {
    async fn height(&self) -> Result<Height, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(outcome) => outcome,
            None => {
                if let Some(stop_tx) = &self.stop_when_exhausted {
                    let _ = stop_tx.send(true);
                }
                Ok(self.fallback)
            }
        }
    }
}

/// Counts shutdown invocations without touching any real service.
#[derive(Clone, Default)]
pub struct RecordingAction {
    engaged: Arc<AtomicUsize>,
}

impl RecordingAction {
    pub fn engaged(&self) -> usize {
        self.engaged.load(Ordering::SeqCst)
    }
}

impl ShutdownAction for RecordingAction {
    async fn engage(&self) -> anyhow::Result<()> {
        self.engaged.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Shutdown action whose invocation always fails.
#[derive(Clone, Default)]
pub struct FailingAction {
    engaged: Arc<AtomicUsize>,
}

impl FailingAction {
    pub fn engaged(&self) -> usize {
        self.engaged.load(Ordering::SeqCst)
    }
}

impl ShutdownAction for FailingAction {
    async fn engage(&self) -> anyhow::Result<()> {
        self.engaged.fetch_add(1, Ordering::SeqCst);
        Err(anyhow::anyhow!("systemctl exited with status 1"))
    }
}
