//! Seed scenario 1 (`spec.md` §8): a three-node chain A–B–C, cold
//! start. Hello exchange establishes both links, a reactive forward ant
//! from A relays through B to C, the matching backward ant relays back
//! through B to A, and the buffered packet is flushed all the way to C.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::data_router::RouteOutcome;
use crate::engine::RoutingEngine;
use crate::message::{BackwardAnt, ForwardAnt, IcmpType};
use crate::test::{addr, init_logging, join_neighbours, HarnessMac, HarnessTimers};

#[test]
fn chain_cold_start_delivers_exactly_once_and_learns_the_path() {
    init_logging();
    let node_a = addr(1);
    let node_b = addr(2);
    let node_c = addr(3);

    let mut a = RoutingEngine::with_rng(node_a, Config::default(), StdRng::seed_from_u64(1));
    let mut b = RoutingEngine::with_rng(node_b, Config::default(), StdRng::seed_from_u64(2));
    let mut c = RoutingEngine::with_rng(node_c, Config::default(), StdRng::seed_from_u64(3));
    a.init();
    b.init();
    c.init();

    let mut mac_a = HarnessMac::default();
    let mut mac_b = HarnessMac::default();
    let mut mac_c = HarnessMac::default();
    let mut timers_a = HarnessTimers::default();
    let mut timers_b = HarnessTimers::default();
    let mut timers_c = HarnessTimers::default();

    join_neighbours(&mut a, &mut mac_a, &mut timers_a, &mut b, &mut mac_b, &mut timers_b);
    join_neighbours(&mut b, &mut mac_b, &mut timers_b, &mut c, &mut mac_c, &mut timers_c);

    // A has no path to C yet: the packet is buffered and a reactive
    // forward ant is broadcast.
    let payload = vec![0xAA, 0xBB, 0xCC];
    let outcome = a.get_next_hop(node_c, payload.clone(), None, 0.0, &mut mac_a, &mut timers_a);
    assert_eq!(outcome, RouteOutcome::Buffered);
    assert!(a.is_busy(node_c));
    assert_eq!(mac_a.broadcasts.len(), 1);
    let rfa_at_b = mac_a.broadcasts.remove(0);

    // B relays the forward ant on to C, its only neighbour with a
    // destination entry for C (C's own self-entry from the hello
    // exchange).
    b.on_control_message(IcmpType::ReactiveForwardOrPathRepair, &rfa_at_b, 0.0, &mut mac_b, &mut timers_b)
        .unwrap();
    assert_eq!(mac_b.unicasts.len(), 1);
    assert_eq!(mac_b.unicasts[0].0, node_c);
    let rfa_at_c = mac_b.unicasts.remove(0).1;
    let relayed = ForwardAnt::decode(&rfa_at_c).unwrap();
    assert_eq!(relayed.path, vec![node_b]);
    assert_eq!(relayed.hops, 1);

    // C is the destination: it emits a backward ant addressed to A,
    // unicast to its own neighbour B.
    c.on_control_message(IcmpType::ReactiveForwardOrPathRepair, &rfa_at_c, 0.0, &mut mac_c, &mut timers_c)
        .unwrap();
    assert_eq!(mac_c.unicasts.len(), 1);
    assert_eq!(mac_c.unicasts[0].0, node_b);
    let rba_at_b = mac_c.unicasts.remove(0).1;
    let rba = BackwardAnt::decode(&rba_at_b).unwrap();
    assert_eq!(rba.destination, node_a);
    assert_eq!(rba.path, vec![node_c, node_b]);

    // B relays the backward ant on to A, the original searcher, since
    // its own position is the last one in the reversed path.
    b.on_control_message(IcmpType::ReactiveBackward, &rba_at_b, 0.0, &mut mac_b, &mut timers_b)
        .unwrap();
    assert_eq!(mac_b.unicasts.len(), 1);
    assert_eq!(mac_b.unicasts[0].0, node_a);
    let rba_at_a = mac_b.unicasts.remove(0).1;

    // A completes the setup and flushes its one buffered packet, which
    // now finds a path through B.
    a.on_control_message(IcmpType::ReactiveBackward, &rba_at_a, 0.0, &mut mac_a, &mut timers_a)
        .unwrap();
    assert!(!a.is_busy(node_c));
    assert!(a.node_is_reachable(node_c));
    assert_eq!(mac_a.unicasts.len(), 1);
    assert_eq!(mac_a.unicasts[0].0, node_b);
    assert_eq!(mac_a.unicasts[0].1, payload);
    let data_at_b = mac_a.unicasts.remove(0).1;

    // B relays the flushed data packet on to C, its only neighbour with
    // an entry for C.
    let outcome = b.get_next_hop(node_c, data_at_b.clone(), Some(node_a), 0.0, &mut mac_b, &mut timers_b);
    assert_eq!(outcome, RouteOutcome::NextHop(node_c));
    assert_eq!(mac_b.unicasts.len(), 1);
    assert_eq!(mac_b.unicasts[0], (node_c, payload));
}
