//! Link-failure subsystem (C6): the local-repair wait-time rule. The
//! stateful handling — building and broadcasting LFNs, running
//! `update_on_link_failure`, emitting warning messages, driving the
//! data-transmission-failed process — lives on
//! [`crate::engine::RoutingEngine`], grounded on
//! `anthocnet.c: neighbour_node_has_disappeared` and
//! `data_transmission_to_neighbour_has_failed`.

use crate::types::Seconds;

/// The wait time for a path-repair ant's matching backward ant
/// (`spec.md` §4.6): `factor_of_waiting_time_bra · τ_last_neighbour`.
pub fn repair_wait_time(factor: f64, tau_last_neighbour: f64) -> Seconds {
    factor * tau_last_neighbour
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_time_scales_with_factor_and_tau() {
        assert_eq!(repair_wait_time(5.0, 2.0), 10.0);
    }
}
