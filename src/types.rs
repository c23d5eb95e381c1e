//! Common types shared across the routing engine: node addresses, timer
//! handles, time values, and the crate's error types.

use std::fmt;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A node address. The protocol is address-family agnostic at this layer
/// (the external IPv6 stack owns the wire representation); internally an
/// address is an opaque 128-bit value so a test harness can use small
/// integers while production code plugs in real IPv6 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Address(u128);

impl Address {
    /// The link-local all-nodes multicast address used for broadcasts
    /// (`spec.md` §6, "Broadcasts use the link-local all-nodes multicast
    /// address").
    pub const BROADCAST: Address = Address(u128::MAX);

    /// Returns `true` if this address is the broadcast address.
    pub fn is_broadcast(self) -> bool {
        self == Self::BROADCAST
    }

    /// Returns the raw 128-bit value.
    pub fn raw(self) -> u128 {
        self.0
    }
}

impl From<u128> for Address {
    fn from(value: u128) -> Self {
        Address(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_broadcast() {
            write!(f, "ff02::1")
        } else {
            write!(f, "node-{:x}", self.0)
        }
    }
}

/// A seconds-valued duration. Kept as a newtype (rather than a bare
/// `f64`) so call sites read as "a time", matching the way the teacher
/// crate wraps link weights in a dedicated type.
pub type Seconds = f64;

/// A timer handle returned by [`crate::timer::TimerSink::arm`]. Opaque to
/// the engine other than for equality and re-arming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimerId(pub u64);

/// The crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can surface to the host driver. Protocol-level drops
/// (`spec.md` §7: loops, max-hops, acceptance-filter rejection, missing
/// next hop) are never returned here — they are logged and absorbed.
/// `EngineError` is reserved for driver-misuse and malformed-input
/// conditions that the host genuinely needs to know about.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A driver operation was invoked before [`crate::engine::RoutingEngine::init`].
    #[error("routing engine for {0} has not joined the network yet")]
    NotJoined(Address),
    /// A wire message failed to decode.
    #[error("malformed wire message: {0}")]
    Decode(#[from] crate::message::DecodeError),
    /// The supplied configuration was invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
}
