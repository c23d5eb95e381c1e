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

#![deny(missing_docs, missing_debug_implementations)]

//! # AntHocNet routing engine
//!
//! This crate implements the core routing logic of a single AntHocNet
//! node: a swarm-intelligence routing protocol for mobile, multi-hop
//! ad-hoc networks (Di Caro, Ducatelle, Gambardella).
//!
//! [`engine::RoutingEngine`] is the main entry point. One instance models
//! one node; a network of nodes is built by wiring several instances
//! together through the [`mac::MacLayer`] and [`timer::TimerSink`]
//! collaborator traits, which a test harness or a real IPv6/MAC stack
//! implements.
//!
//! ## Main concepts
//!
//! - [`pheromone::PheromoneTable`]: per-neighbour, per-destination routing
//!   metrics and stochastic neighbour selection.
//! - [`reactive`]: reactive path setup using forward and backward ants.
//! - [`data_router`]: stochastic data forwarding and path probing triggers.
//! - [`probing`]: periodic hello beacons and proactive forward ants.
//! - [`link_failure`]: local repair and link-failure notification.
//!
//! The underlying MAC layer, the IPv6 message dispatch, timer/process
//! primitives, and the host application are external collaborators; this
//! crate only consumes typed events from them and emits typed outbound
//! messages and timer requests.
//!
//! ## Example usage
//!
//! ```
//! use anthocnet::{Config, RoutingEngine, Address};
//!
//! let mut engine = RoutingEngine::new(Address::from(1u128), Config::default());
//! engine.init();
//! assert!(engine.node_has_joined());
//! ```

pub mod best_ants;
pub mod config;
pub mod data_router;
pub mod engine;
pub mod link_failure;
pub mod mac;
pub mod message;
pub mod pheromone;
pub mod probing;
pub mod reactive;
pub mod time_estimate;
pub mod timer;
pub mod types;

pub use config::Config;
pub use engine::RoutingEngine;
pub use types::{Address, EngineError, Result};

#[cfg(test)]
mod test;
