// AntHocNet: swarm-intelligence ad-hoc routing engine
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Whole-scenario tests wiring several [`crate::engine::RoutingEngine`]
//! instances together by hand, analogous to `bgpsim`'s
//! `src/test/test_network.rs` running a whole `Network` instead of
//! exercising one router in isolation. There is no event-loop here:
//! each scenario drives hops explicitly, passing the bytes one engine's
//! [`HarnessMac`] queued straight into the next engine's
//! `on_control_message`/`on_link_result`.

mod scenario_cold_start;
mod scenario_warning_message;

use std::collections::VecDeque;

use crate::engine::RoutingEngine;
use crate::mac::MacLayer;
use crate::message::IcmpType;
use crate::timer::{TimerKind, TimerSink};
use crate::types::{Address, Seconds, TimerId};

/// An in-memory [`MacLayer`] backed by plain `Vec`s, the same role
/// `bgpsim::event::BasicEventQueue` plays for router-to-router delivery
/// in the teacher's scenario tests.
#[derive(Debug, Default)]
pub(crate) struct HarnessMac {
    queue_depth: u32,
    pub(crate) unicasts: Vec<(Address, Vec<u8>)>,
    pub(crate) broadcasts: Vec<Vec<u8>>,
}

impl MacLayer for HarnessMac {
    fn queue_depth(&self) -> u32 {
        self.queue_depth
    }
    fn unicast(&mut self, next_hop: Address, payload: Vec<u8>) {
        self.unicasts.push((next_hop, payload));
    }
    fn broadcast(&mut self, payload: Vec<u8>) {
        self.broadcasts.push(payload);
    }
}

/// An in-memory [`TimerSink`] that just remembers what is armed;
/// scenarios drive expiry explicitly rather than simulating wall-clock
/// time.
#[derive(Debug, Default)]
pub(crate) struct HarnessTimers {
    next_id: u64,
    pub(crate) armed: VecDeque<(TimerId, TimerKind)>,
    pub(crate) cancelled: Vec<TimerId>,
}

impl TimerSink for HarnessTimers {
    fn arm(&mut self, _duration: Seconds, kind: TimerKind) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.armed.push_back((id, kind));
        id
    }
    fn cancel(&mut self, timer: TimerId) {
        self.cancelled.push(timer);
        self.armed.retain(|(id, _)| *id != timer);
    }
}

impl HarnessTimers {
    /// Pops and returns the kind of the oldest still-armed timer whose
    /// kind matches `pred`, panicking if none does — scenarios use this
    /// to fire a specific timer without tracking its id by hand.
    pub(crate) fn fire_matching(&mut self, pred: impl Fn(&TimerKind) -> bool) -> TimerKind {
        let idx = self
            .armed
            .iter()
            .position(|(_, kind)| pred(kind))
            .expect("no armed timer matches");
        self.armed.remove(idx).unwrap().1
    }
}

pub(crate) fn addr(v: u128) -> Address {
    Address::from(v)
}

/// Initializes `env_logger` for a scenario test, the same way
/// `bgpsim`'s own test binaries do; safe to call from every test since
/// `try_init` ignores a second call.
pub(crate) fn init_logging() {
    let _ = env_logger::try_init();
}

/// Runs one round of hello exchange between two already-`init`ed
/// engines, turning them into direct neighbours of each other
/// (`spec.md` §4.5). Grounded on `anthocnet.c: broadcast_hello_messages`
/// and its receive handler.
pub(crate) fn join_neighbours(
    a: &mut RoutingEngine,
    mac_a: &mut HarnessMac,
    timers_a: &mut HarnessTimers,
    b: &mut RoutingEngine,
    mac_b: &mut HarnessMac,
    timers_b: &mut HarnessTimers,
) {
    a.on_timer_fired(TimerKind::HelloBroadcast, mac_a, timers_a);
    let hello_a = mac_a.broadcasts.pop().expect("a should have broadcast a hello");
    b.on_control_message(IcmpType::Hello, &hello_a, 0.0, mac_b, timers_b)
        .expect("well-formed hello");

    b.on_timer_fired(TimerKind::HelloBroadcast, mac_b, timers_b);
    let hello_b = mac_b.broadcasts.pop().expect("b should have broadcast a hello");
    a.on_control_message(IcmpType::Hello, &hello_b, 0.0, mac_a, timers_a)
        .expect("well-formed hello");
}
