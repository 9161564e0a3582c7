//! # Playback Queue
//!
//! Tracks the current position in the host's queue and resolves the next and
//! previous index under the active shuffle and repeat modes.
//!
//! The queue owns only indices. The item count is polled from the
//! [`QueueDataSource`] on every access, and the visiting order is rebuilt as
//! a whole whenever that count changes or shuffle is toggled.

use bridge_traits::QueueDataSource;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

/// What happens at the ends of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Stop after the last item.
    #[default]
    None,
    /// Repeat the current item.
    Single,
    /// Wrap around to the first item.
    All,
}

/// Ordering and position over the host's queue.
pub struct PlaybackQueue {
    source: Arc<dyn QueueDataSource>,
    current_index: usize,
    cached_total: usize,
    order: Vec<usize>,
    order_valid: bool,
    repeat_mode: RepeatMode,
    shuffle: bool,
}

impl std::fmt::Debug for PlaybackQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackQueue")
            .field("current_index", &self.current_index)
            .field("cached_total", &self.cached_total)
            .field("repeat_mode", &self.repeat_mode)
            .field("shuffle", &self.shuffle)
            .finish()
    }
}

impl PlaybackQueue {
    pub fn new(source: Arc<dyn QueueDataSource>, repeat_mode: RepeatMode, shuffle: bool) -> Self {
        Self {
            source,
            current_index: 0,
            cached_total: 0,
            order: Vec::new(),
            order_valid: false,
            repeat_mode,
            shuffle,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_items(&self) -> usize {
        self.source.total_items()
    }

    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Toggle shuffle. A change rebuilds the order immediately.
    pub fn set_shuffle(&mut self, shuffle: bool) {
        if self.shuffle == shuffle {
            return;
        }
        self.shuffle = shuffle;
        self.order_valid = false;
        self.ensure_order();
        debug!(shuffle, "Shuffle changed");
    }

    /// The current visiting order.
    pub fn order(&mut self) -> &[usize] {
        self.ensure_order();
        &self.order
    }

    /// Index to play after the current one.
    ///
    /// With `ignore_repeat` unset, `RepeatMode::Single` keeps the current
    /// index. Otherwise a preferred next index from the data source wins;
    /// failing that, the successor in the order, wrapping at the end unless
    /// repeat is off.
    pub fn next_index(&mut self, ignore_repeat: bool) -> Option<usize> {
        if !ignore_repeat && self.repeat_mode == RepeatMode::Single {
            return (!self.is_empty()).then_some(self.current_index);
        }

        if let Some(preferred) = self.source.preferred_next_index() {
            if preferred < self.total_items() {
                trace!(preferred, "Using preferred next index");
                return Some(preferred);
            }
        }

        self.ensure_order();
        let last = self.order.len().checked_sub(1)?;
        let position = self.position_of_current();

        if position < last {
            Some(self.order[position + 1])
        } else {
            match self.repeat_mode {
                RepeatMode::None => None,
                RepeatMode::Single | RepeatMode::All => Some(self.order[0]),
            }
        }
    }

    /// Index to play before the current one. Mirrors [`next_index`](Self::next_index)
    /// without the preferred-index override.
    pub fn previous_index(&mut self, ignore_repeat: bool) -> Option<usize> {
        if !ignore_repeat && self.repeat_mode == RepeatMode::Single {
            return (!self.is_empty()).then_some(self.current_index);
        }

        self.ensure_order();
        let last = self.order.len().checked_sub(1)?;
        let position = self.position_of_current();

        if position > 0 {
            Some(self.order[position - 1])
        } else {
            match self.repeat_mode {
                RepeatMode::None => None,
                RepeatMode::Single | RepeatMode::All => Some(self.order[last]),
            }
        }
    }

    /// The host removed the item at `index`.
    pub fn removed_item(&mut self, index: usize) {
        if index < self.current_index {
            self.current_index -= 1;
        }
        self.order_valid = false;
        self.ensure_order();
        trace!(index, current = self.current_index, "Item removed");
    }

    /// The host inserted an item at `index`.
    pub fn added_item(&mut self, index: usize) {
        if index <= self.current_index {
            self.current_index += 1;
        }
        self.order_valid = false;
        self.ensure_order();
        trace!(index, current = self.current_index, "Item added");
    }

    /// The host moved an item from `from` to `to`.
    ///
    /// Only the current slot is tracked; other moves leave the order alone.
    pub fn moved_item(&mut self, from: usize, to: usize) {
        if self.current_index == from {
            self.current_index = to;
        } else if self.current_index == to {
            self.current_index = from;
        }
        trace!(from, to, current = self.current_index, "Item moved");
    }

    pub(crate) fn set_current(&mut self, index: usize) {
        self.current_index = index;
    }

    fn position_of_current(&self) -> usize {
        self.order
            .iter()
            .position(|&i| i == self.current_index)
            .unwrap_or(0)
    }

    fn ensure_order(&mut self) {
        let total = self.source.total_items();
        if self.order_valid && total == self.cached_total {
            return;
        }

        let mut order: Vec<usize> = (0..total).collect();
        if self.shuffle {
            order.shuffle(&mut rand::thread_rng());
        }

        self.order = order;
        self.cached_total = total;
        self.order_valid = true;

        if total == 0 {
            self.current_index = 0;
        } else if self.current_index >= total {
            self.current_index = total - 1;
        }
        trace!(total, shuffle = self.shuffle, "Queue order rebuilt");
    }
}
