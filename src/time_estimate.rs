//! Time-estimate engine (C2): the running per-hop MAC-send average, and
//! how it composes end-to-end path time estimates carried by ants.
//!
//! Grounded on `anthocnet.c: update_running_average_T_i_mac` and
//! `calc_time_estimate_T_P`.

use crate::types::Seconds;

/// Maintains `T_i_mac_avg`, the exponential moving average of the time
/// from MAC enqueue to successful transmission, and extends a carried
/// path-time estimate with this node's contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeEstimateEngine {
    alpha: f64,
    t_i_mac_avg: Seconds,
}

impl TimeEstimateEngine {
    /// Creates a new engine with a zeroed running average.
    pub fn new(alpha: f64) -> Self {
        TimeEstimateEngine {
            alpha,
            t_i_mac_avg: 0.0,
        }
    }

    /// Returns the current running average.
    pub fn t_i_mac_avg(&self) -> Seconds {
        self.t_i_mac_avg
    }

    /// Updates the running average after a successful MAC send that took
    /// `t_mac` seconds (`spec.md` §4.2): `T ← α·T + (1-α)·t_mac`.
    pub fn on_mac_sent(&mut self, t_mac: Seconds) {
        self.t_i_mac_avg = self.alpha * self.t_i_mac_avg + (1.0 - self.alpha) * t_mac;
    }

    /// Extends a carried path-time estimate with this node's
    /// contribution: `T̂_P ← T̂_P + (Q_i_mac + 1) · T_i_mac_avg`, where
    /// `q_i_mac` is the current MAC-queue depth reported by the external
    /// collaborator.
    pub fn extend_time_estimate(&self, t_hat_p: Seconds, q_i_mac: u32) -> Seconds {
        t_hat_p + (q_i_mac as f64 + 1.0) * self.t_i_mac_avg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_average_converges_towards_constant_input() {
        let mut e = TimeEstimateEngine::new(0.7);
        for _ in 0..200 {
            e.on_mac_sent(0.01);
        }
        assert!((e.t_i_mac_avg() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn extend_scales_with_queue_depth() {
        let mut e = TimeEstimateEngine::new(0.0);
        e.on_mac_sent(0.02);
        assert_eq!(e.extend_time_estimate(1.0, 0), 1.02);
        assert_eq!(e.extend_time_estimate(1.0, 3), 1.0 + 4.0 * 0.02);
    }
}
