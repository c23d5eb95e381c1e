//! Proactive path probing (C5): hello-beacon helpers and the proactive
//! forward ant send/relay decision. Grounded on
//! `anthocnet.c: broadcast_hello_messages` and the PFA send/receive
//! handlers. As with [`crate::reactive`], the stateful relay logic that
//! needs the pheromone table, MAC layer and timer sink together lives
//! on [`crate::engine::RoutingEngine`]; this module holds the pure
//! rules the engine applies.

use rand::Rng;

use crate::types::{Address, Seconds};

/// The `T̂_P` a hello message carries (`spec.md` §4.5): the node's own
/// `extend_time_estimate(0)`, clamped to `1.0` when it would otherwise
/// be zero (a brand new node with no MAC-send history yet).
pub fn hello_time_estimate(t_hat_p: Seconds) -> f32 {
    if t_hat_p <= 0.0 {
        1.0
    } else {
        t_hat_p as f32
    }
}

/// Decides whether to broadcast or unicast a proactive forward ant
/// (`spec.md` §4.5): broadcast when no pheromone-chosen neighbour
/// exists, or with probability `broadcast_probability` when one does.
pub fn should_broadcast_pfa(
    chosen_neighbour: Option<Address>,
    broadcast_probability: f64,
    rng: &mut impl Rng,
) -> bool {
    match chosen_neighbour {
        None => true,
        Some(_) => rng.gen_bool(broadcast_probability.clamp(0.0, 1.0)),
    }
}
