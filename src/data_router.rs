//! Stochastic data router (C4): next-hop selection for data packets,
//! the path-probing session tracker, and the outcome type `route()`
//! returns. The actual `route()` logic lives on
//! [`crate::engine::RoutingEngine`]; this module holds its supporting
//! data structures, grounded on `anthocnet.c: stochastic_data_routing`
//! and `last_destination_data_t`/`last_package_data_t`.

use std::collections::HashMap;

use crate::types::{Address, Seconds};

/// What `route(d)` resolved to (`spec.md` §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A next hop was selected; the caller should unicast to it.
    NextHop(Address),
    /// No path exists yet; the packet was enqueued into the send buffer
    /// (a setup or repair process is now, or was already, running).
    Buffered,
    /// This node is not the packet's originator and has no path either;
    /// a warning message was sent upstream and the packet is dropped.
    None,
}

/// The single most recently sent packet, recorded for link-callback
/// retry (`spec.md` §4.4 step 1; `anthocnet.c: last_package_data_t`).
/// Only ever holds one entry: a later send simply overwrites it, which
/// is why `spec.md` §5 warns that its link callback may describe an
/// already-stale destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSend {
    /// The destination the packet was addressed to.
    pub destination: Address,
    /// The neighbour it was unicast to.
    pub next_hop: Address,
    /// A copy of the packet, kept for retransmission on failure.
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
struct Session {
    last_send_time: Seconds,
    count: u32,
}

/// Per-destination `{last_send_time, count}` records used to detect a
/// data session and trigger proactive probing (`spec.md` §3, §4.4
/// "Path probing trigger").
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    sessions: HashMap<Address, Session>,
}

impl SessionTracker {
    /// Records a successful send to `d` at time `now`. Resets the count
    /// if the previous send was more than `threshold` seconds ago (the
    /// session lapsed). Returns `true` exactly when the count has just
    /// reached `rate`, in which case the caller emits a proactive
    /// forward ant and the count is reset to 0.
    pub fn note_send(&mut self, d: Address, now: Seconds, threshold: Seconds, rate: u32) -> bool {
        let session = self.sessions.entry(d).or_insert(Session {
            last_send_time: now,
            count: 0,
        });
        if now - session.last_send_time > threshold {
            session.count = 0;
        }
        session.last_send_time = now;
        session.count += 1;
        if session.count >= rate.max(1) {
            session.count = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(v: u128) -> Address {
        Address::from(v)
    }

    #[test]
    fn fires_exactly_on_the_nth_packet_and_resets() {
        let mut tracker = SessionTracker::default();
        let d = addr(1);
        let mut fired = Vec::new();
        for i in 0..6 {
            fired.push(tracker.note_send(d, i as f64 * 0.05, 0.5, 3));
        }
        assert_eq!(fired, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn lapsed_session_resets_the_count() {
        let mut tracker = SessionTracker::default();
        let d = addr(1);
        assert!(!tracker.note_send(d, 0.0, 0.5, 3));
        assert!(!tracker.note_send(d, 0.1, 0.5, 3));
        // gap exceeds the threshold: the session restarts at count 1.
        assert!(!tracker.note_send(d, 10.0, 0.5, 3));
        assert!(!tracker.note_send(d, 10.1, 0.5, 3));
        assert!(tracker.note_send(d, 10.2, 0.5, 3));
    }
}
