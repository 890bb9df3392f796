//! Scratch-variable pool for large-text values.
//!
//! The generated block declares a small fixed set of CLOB variables; each
//! large-text value consumed while processing one row specification is
//! assigned into the next free slot. The cursor resets at the start of every
//! specification.
//!
//! Capacity policy: when the pool is exhausted the cursor CLAMPS to the last
//! slot instead of wrapping or growing, so the (size+1)-th allocation within
//! one specification reuses the last variable and overwrites its previous
//! assignment before the dependent statement runs. This is a documented
//! fixed-capacity behavior; a collision is logged so operators can raise the
//! pool size with [`ScratchPool::with_size`].

use tracing::warn;

/// Default number of scratch variables per block.
pub const DEFAULT_POOL_SIZE: usize = 3;

/// A fixed pool of named CLOB scratch variables with a clamping cursor.
#[derive(Debug, Clone)]
pub struct ScratchPool {
    names: Vec<String>,
    cursor: usize,
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ScratchPool {
    /// Creates a pool of [`DEFAULT_POOL_SIZE`] variables.
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(DEFAULT_POOL_SIZE)
    }

    /// Creates a pool of `size` variables named `v_clob1..v_clob{size}`.
    ///
    /// A size of zero is treated as one: the pool must always be able to
    /// hand out a slot.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        let size = size.max(1);
        Self {
            names: (1..=size).map(|i| format!("v_clob{i}")).collect(),
            cursor: 0,
        }
    }

    /// Variable names in slot order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of slots.
    #[must_use]
    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// Resets the cursor to the first slot.
    ///
    /// Called at the start of every row specification.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Returns the next slot's variable name and advances the cursor.
    ///
    /// Past the end of the pool the cursor clamps to the last slot, so
    /// further allocations keep returning the same name.
    pub fn allocate(&mut self) -> &str {
        let idx = self.cursor.min(self.names.len() - 1);
        if self.cursor >= self.names.len() {
            warn!(
                var = %self.names[idx],
                pool_size = self.names.len(),
                "scratch pool exhausted, reusing the last slot"
            );
        }
        self.cursor += 1;
        &self.names[idx]
    }
}
