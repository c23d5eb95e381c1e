//! The MAC-layer external collaborator (`spec.md` §1: "accessed only to
//! count queued frames and receive per-frame delivery callbacks").

use crate::types::Address;

/// Outcome of a single outbound frame, reported back to the engine via
/// [`crate::engine::RoutingEngine::on_link_result`] (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// The frame was delivered successfully.
    Success,
    /// The frame could not be delivered, but the MAC layer may still
    /// retry (e.g. it has retries remaining).
    Deferred,
    /// The frame could not be delivered and no further retries will be
    /// attempted.
    PermanentFailure,
}

/// The MAC layer as seen by the routing engine: enough to count queued
/// frames for the time-estimate engine (`spec.md` §4.2) and to submit
/// outbound unicasts/broadcasts. Implemented by the host; a test harness
/// typically backs this with in-memory queues.
pub trait MacLayer {
    /// Current MAC-queue depth (`Q_i_mac` in `spec.md` §4.2).
    fn queue_depth(&self) -> u32;

    /// Submits a unicast frame to `next_hop` carrying `payload` (an
    /// encoded control message or a buffered data packet). The frame's
    /// outcome arrives later via `on_link_result`.
    fn unicast(&mut self, next_hop: Address, payload: Vec<u8>);

    /// Submits a broadcast frame (to [`Address::BROADCAST`]) carrying
    /// `payload`.
    fn broadcast(&mut self, payload: Vec<u8>);
}
