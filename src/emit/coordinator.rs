//! Pending-compilation bookkeeping per output target

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

/// Outcome of finishing one compilation against a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitTurn {
    /// No other compilation is pending; this one writes
    Last,
    /// Newer compilations are still in flight and will overwrite the target
    Superseded { pending: usize },
}

/// Counts compilations in flight for each target file.
///
/// Share one coordinator (behind an `Arc`) between every emitter writing into
/// the same output directory. A target stays registered once seen, even when
/// its count drops back to zero.
#[derive(Debug, Default)]
pub struct EmitCoordinator {
    pending: Mutex<HashMap<PathBuf, usize>>,
}

impl EmitCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A compilation targeting `target` was triggered (run or watch-run)
    pub fn begin(&self, target: &Path) -> usize {
        let mut pending = self.pending.lock();
        let count = pending.entry(target.to_path_buf()).or_insert(0);
        *count += 1;
        debug!("{} pending compilation(s) for {}", count, target.display());
        *count
    }

    /// A compilation reached its emit phase for `target`
    pub fn finish(&self, target: &Path) -> EmitTurn {
        let mut pending = self.pending.lock();
        let count = pending.entry(target.to_path_buf()).or_insert(0);
        // A finish without a matching begin behaves like a lone compilation
        *count = count.saturating_sub(1);

        match *count {
            0 => EmitTurn::Last,
            left => EmitTurn::Superseded { pending: left },
        }
    }

    pub fn pending(&self, target: &Path) -> usize {
        self.pending.lock().get(target).copied().unwrap_or(0)
    }

    /// Whether any emitter has registered `path` as a target
    pub fn is_target(&self, path: &Path) -> bool {
        self.pending.lock().contains_key(path)
    }
}
