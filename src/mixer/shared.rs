//! Thread-safe handle to one bus graph

use std::sync::{Arc, Mutex, MutexGuard};

use super::bus::BusStatus;
use super::command::Command;
use super::graph::{BusGraph, MixReport};
use crate::engine::AudioBuffer;
use crate::error::{DubmixError, Result};

/// Cloneable handle that serializes commands and renders on one graph
#[derive(Debug, Clone)]
pub struct SharedBusGraph {
    inner: Arc<Mutex<BusGraph>>,
}

impl SharedBusGraph {
    pub fn new(graph: BusGraph) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    pub fn apply(&self, command: Command) -> Result<()> {
        self.lock()?.apply(command)
    }

    /// Render while holding the lock, so no command lands mid-render
    pub fn render(&self) -> Result<AudioBuffer> {
        Ok(self.lock()?.render())
    }

    pub fn render_with_report(&self) -> Result<(AudioBuffer, MixReport)> {
        Ok(self.lock()?.render_with_report())
    }

    pub fn status(&self) -> Result<Vec<BusStatus>> {
        Ok(self.lock()?.status())
    }

    /// Run `f` with exclusive access to the graph
    pub fn with<T>(&self, f: impl FnOnce(&mut BusGraph) -> T) -> Result<T> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    fn lock(&self) -> Result<MutexGuard<'_, BusGraph>> {
        self.inner.lock().map_err(|_| DubmixError::LockPoisoned)
    }
}

impl From<BusGraph> for SharedBusGraph {
    fn from(graph: BusGraph) -> Self {
        Self::new(graph)
    }
}
