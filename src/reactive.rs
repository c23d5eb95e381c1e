//! Reactive path setup (C3): the ant-generation counter, the deferred
//! send buffer, and the per-destination setup/repair state machine.
//!
//! Grounded on `anthocnet.c: reactive_path_setup`,
//! `reception_reactive_forward_or_path_repair_ant`,
//! `create_and_send_backward_ant`, `reception_reactive_backward_ant`.
//! The actual ant relay logic lives in [`crate::engine`], since it needs
//! mutable access to the pheromone table, the best-ants registry, the
//! MAC layer and the timer sink all at once; this module only holds the
//! state the engine drives through that logic.

use std::collections::VecDeque;

use crate::types::{Address, TimerId};

/// Monotonically increasing ant-generation counter (`spec.md` §3, P1).
/// Shared by fresh reactive setups and path-repair ants (`spec.md` §4.6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationCounter(u32);

impl GenerationCounter {
    /// The most recently allocated generation, or 0 before any setup has
    /// ever run.
    pub fn current(&self) -> u32 {
        self.0
    }

    /// Allocates and returns the next generation. Saturates rather than
    /// wrapping so the counter never decreases (P1) even across an
    /// implausibly long-lived node.
    pub fn advance(&mut self) -> u32 {
        self.0 = self.0.saturating_add(1);
        self.0
    }
}

/// Per-destination state of the reactive setup / local-repair process
/// (`spec.md` §4.6, "States of the setup/repair processes").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupState {
    /// No setup or repair is in flight for this destination.
    Idle,
    /// A fresh reactive path setup is searching for a path: `generation`
    /// is the current attempt, `tries_remaining` counts further restarts
    /// before the buffer is discarded, `timer` is the armed restart
    /// timer.
    Searching {
        /// The ant generation this attempt is using.
        generation: u32,
        /// Restarts left before giving up (`spec.md` §4.3).
        tries_remaining: u32,
        /// The armed restart/exhaustion timer.
        timer: TimerId,
    },
    /// A local repair is in flight after a data-transmission failure
    /// (`spec.md` §4.6): a single path-repair ant was broadcast and a
    /// wait timer armed; no further retries happen here, only a
    /// declare-lost on timeout.
    Repairing {
        /// The generation the path-repair ant was stamped with.
        generation: u32,
        /// The neighbour whose failure triggered this repair.
        failed_neighbour: Address,
        /// The armed wait timer.
        timer: TimerId,
    },
}

impl SetupState {
    /// `true` unless idle (`spec.md`'s `processes_running()`/`is_busy`).
    pub fn is_busy(&self) -> bool {
        !matches!(self, SetupState::Idle)
    }
}

/// A FIFO queue of deferred outbound packets awaiting a path, capped at
/// `Config::max_send_buffer_len` with oldest-dropped-on-overflow
/// semantics (`spec.md` §5; no original constant exists for the cap,
/// see `DESIGN.md`).
#[derive(Debug, Clone, Default)]
pub struct SendBuffer {
    packets: VecDeque<Vec<u8>>,
}

impl SendBuffer {
    /// `true` if nothing is buffered (P5: "the send buffer is empty
    /// whenever setup is idle").
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Number of buffered packets.
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Appends `packet`, dropping the oldest buffered packet first if
    /// the buffer is already at `max_len`. Returns `true` if a packet
    /// was dropped to make room.
    pub fn push(&mut self, packet: Vec<u8>, max_len: usize) -> bool {
        let dropped = if self.packets.len() >= max_len {
            self.packets.pop_front();
            true
        } else {
            false
        };
        self.packets.push_back(packet);
        dropped
    }

    /// Drains every buffered packet in FIFO order, e.g. to flush on
    /// setup completion or discard on exhaustion.
    pub fn drain(&mut self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.packets.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_counter_never_decreases() {
        let mut g = GenerationCounter::default();
        let mut last = g.current();
        for _ in 0..10 {
            let next = g.advance();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn send_buffer_drops_oldest_on_overflow() {
        let mut buf = SendBuffer::default();
        assert!(!buf.push(vec![1], 2));
        assert!(!buf.push(vec![2], 2));
        assert!(buf.push(vec![3], 2));
        let remaining: Vec<_> = buf.drain().collect();
        assert_eq!(remaining, vec![vec![2], vec![3]]);
    }

    #[test]
    fn idle_state_is_not_busy() {
        assert!(!SetupState::Idle.is_busy());
    }
}
