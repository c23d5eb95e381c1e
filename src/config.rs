//! Tunable protocol parameters (`spec.md` §6) with the defaults carried
//! over from the original implementation's `anthocnet-conf.h`.

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All tunable parameters of the routing engine.
///
/// Defaults match the original Contiki-NG implementation so that
/// behaviour is comparable across a reimplementation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Exponent β for `P_nd` when selecting the next hop for forward/
    /// path-repair ants. Must be `>= 1`.
    pub beta_forward: f64,
    /// Exponent β for `P_nd` when selecting the next hop for data
    /// packets (stochastic routing). Must be `>= 1`.
    pub beta_stochastic: f64,
    /// MAC-average smoothing factor α ∈ [0,1] (`spec.md` §4.2).
    pub alpha: f64,
    /// Pheromone smoothing factor γ ∈ [0,1] (`spec.md` §4.1).
    pub gamma: f64,
    /// Unloaded per-hop time constant `T_hop`, in seconds.
    pub t_hop: f64,
    /// Length of the reactive path setup restart timer, in seconds.
    pub restart_path_setup_secs: f64,
    /// Maximum number of reactive path setup retries before the send
    /// buffer is discarded.
    pub max_tries_path_setup: u32,
    /// Tight acceptance factor a1 ∈ (0,1].
    pub a1: f64,
    /// Loose acceptance factor a2 ∈ [1, ∞).
    pub a2: f64,
    /// Number of data packets to a destination within
    /// `pfa_time_threshold` that trigger a proactive forward ant.
    pub pfa_sending_rate: u32,
    /// Time window, in seconds, used to detect a data session for
    /// proactive probing.
    pub pfa_time_threshold: f64,
    /// Probability of broadcasting (rather than unicasting) a proactive
    /// forward ant.
    pub pfa_broadcast_probability: f64,
    /// Maximum number of broadcasts a proactive forward ant may perform
    /// before being dropped.
    pub max_number_broadcasts_pfa: u32,
    /// Interval between hello broadcasts, in seconds.
    pub t_hello_sec: f64,
    /// Number of consecutive missed hellos allowed before a neighbour is
    /// declared lost.
    pub allowed_hello_loss: u32,
    /// Maximum number of broadcasts a path-repair ant may perform before
    /// being dropped.
    pub max_number_broadcasts_path_repair: u32,
    /// Factor multiplied by the failed neighbour's best path-time
    /// estimate to get the wait time for a path-repair backward ant.
    pub factor_of_waiting_time_bra: f64,
    /// Maximum number of hops a reactive forward/path-repair ant may
    /// take before being dropped.
    pub max_hops: u32,
    /// Maximum number of packets held in the send buffer while reactive
    /// path setup is in progress. Not present in the original source
    /// (see `DESIGN.md`); `spec.md` §5 only requires *some* cap, with
    /// oldest-first eviction on overflow.
    pub max_send_buffer_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            beta_forward: 1.0,
            beta_stochastic: 2.0,
            alpha: 0.7,
            gamma: 0.7,
            t_hop: 3.0e-3,
            restart_path_setup_secs: 2.0,
            max_tries_path_setup: 3,
            a1: 0.9,
            a2: 2.0,
            pfa_sending_rate: 5,
            pfa_time_threshold: 0.5,
            pfa_broadcast_probability: 0.1,
            max_number_broadcasts_pfa: 2,
            t_hello_sec: 1.0,
            allowed_hello_loss: 2,
            max_number_broadcasts_path_repair: 2,
            factor_of_waiting_time_bra: 5.0,
            max_hops: 100,
            max_send_buffer_len: 32,
        }
    }
}

impl Config {
    /// Validates the configuration against the bounds `spec.md` §6
    /// requires for each parameter.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.beta_forward < 1.0 {
            return Err(ConfigError::OutOfRange("beta_forward must be >= 1"));
        }
        if self.beta_stochastic < 1.0 {
            return Err(ConfigError::OutOfRange("beta_stochastic must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ConfigError::OutOfRange("alpha must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::OutOfRange("gamma must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.a1) || self.a1 == 0.0 {
            return Err(ConfigError::OutOfRange("a1 must be in (0, 1]"));
        }
        if self.a2 < 1.0 {
            return Err(ConfigError::OutOfRange("a2 must be >= 1"));
        }
        if self.pfa_sending_rate == 0 {
            return Err(ConfigError::OutOfRange("pfa_sending_rate must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.pfa_broadcast_probability) {
            return Err(ConfigError::OutOfRange(
                "pfa_broadcast_probability must be in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Errors produced when validating a [`Config`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A parameter fell outside the range `spec.md` §6 requires.
    #[error("{0}")]
    OutOfRange(&'static str),
}
