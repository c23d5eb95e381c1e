//! Seed scenario 5 (`spec.md` §8): a relaying node with no pheromone
//! entry for the destination sends a warning message upstream instead
//! of dropping the packet silently; the previous hop removes its own
//! route and must set up a fresh path on the next send.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::data_router::RouteOutcome;
use crate::engine::RoutingEngine;
use crate::message::{BackwardAnt, IcmpType, WarningMessage};
use crate::test::{addr, init_logging, join_neighbours, HarnessMac, HarnessTimers};

#[test]
fn warning_message_triggers_removal_and_resetup() {
    init_logging();
    let node_a = addr(1);
    let node_b = addr(2);
    let node_d = addr(99);

    let mut a = RoutingEngine::with_rng(node_a, Config::default(), StdRng::seed_from_u64(11));
    let mut b = RoutingEngine::with_rng(node_b, Config::default(), StdRng::seed_from_u64(12));
    a.init();
    b.init();

    let mut mac_a = HarnessMac::default();
    let mut mac_b = HarnessMac::default();
    let mut timers_a = HarnessTimers::default();
    let mut timers_b = HarnessTimers::default();

    join_neighbours(&mut a, &mut mac_a, &mut timers_a, &mut b, &mut mac_b, &mut timers_b);

    // Seed A with a route to D via B, as if an earlier reactive setup
    // had already completed (current_hop = 1 represents a backward ant
    // that has already been relayed once, by B).
    let seeded = BackwardAnt {
        generation: 1,
        destination: node_a,
        current_hop: 1,
        time_estimate: 0.0,
        length: 2,
        path: vec![node_d, node_b],
    };
    a.on_control_message(IcmpType::ReactiveBackward, &seeded.encode(), 0.0, &mut mac_a, &mut timers_a)
        .unwrap();
    assert!(a.node_is_reachable(node_d));

    // A sends to D: resolves straight to B.
    let payload = vec![7, 7, 7];
    let outcome = a.get_next_hop(node_d, payload.clone(), None, 0.0, &mut mac_a, &mut timers_a);
    assert_eq!(outcome, RouteOutcome::NextHop(node_b));
    let data_at_b = mac_a.unicasts.remove(0).1;

    // B has no entry for D at all: it warns A and drops the packet.
    let outcome = b.get_next_hop(node_d, data_at_b, Some(node_a), 1.0, &mut mac_b, &mut timers_b);
    assert_eq!(outcome, RouteOutcome::None);
    assert_eq!(mac_b.unicasts.len(), 1);
    assert_eq!(mac_b.unicasts[0].0, node_a);
    let wm = WarningMessage::decode(&mac_b.unicasts[0].1).unwrap();
    assert_eq!(wm.destination, node_d);
    assert_eq!(wm.source, node_b);

    // A processes the warning: its route to D through B is gone.
    a.on_control_message(IcmpType::Warning, &mac_b.unicasts[0].1, 1.0, &mut mac_a, &mut timers_a)
        .unwrap();
    assert!(!a.node_is_reachable(node_d));

    // The next send to D has no path: it is buffered and a fresh
    // reactive setup starts instead of silently resolving to B again.
    let outcome = a.get_next_hop(node_d, vec![8, 8, 8], None, 2.0, &mut mac_a, &mut timers_a);
    assert_eq!(outcome, RouteOutcome::Buffered);
    assert!(a.is_busy(node_d));
}
