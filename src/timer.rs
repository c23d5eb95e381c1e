//! The timer/process external collaborator (`spec.md` §1/§5: "Timers ...
//! may be cancelled and rearmed idempotently").

use crate::types::{Address, Seconds, TimerId};

/// What a timer was armed for, so the engine can dispatch a fired
/// [`TimerId`] to the right state machine without a separate lookup
/// table duplicating what [`TimerSink`] already tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Periodic hello broadcast (`spec.md` §4.5).
    HelloBroadcast,
    /// Per-neighbour hello-loss timeout (`spec.md` §4.5).
    HelloLoss(Address),
    /// Reactive path setup restart/exhaustion timer (`spec.md` §4.3).
    PathSetupRestart(Address),
    /// Data-transmission-failed process wait timer (`spec.md` §4.6).
    RepairWait(Address),
}

/// The timer/process primitives as seen by the routing engine. The host
/// implements this with whatever scheduler it has (an OS timer wheel, a
/// discrete-event simulation clock, ...); the engine only ever arms,
/// cancels, and gets told when a [`TimerId`] fires.
pub trait TimerSink {
    /// Arms a new timer of `duration` seconds for `kind`, returning its
    /// handle.
    fn arm(&mut self, duration: Seconds, kind: TimerKind) -> TimerId;

    /// Cancels a previously armed timer. Idempotent: cancelling an
    /// already-fired or already-cancelled timer is not an error.
    fn cancel(&mut self, timer: TimerId);
}
