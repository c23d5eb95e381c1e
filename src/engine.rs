//! The routing engine driver (`spec.md` §6): one instance per node, owning
//! C1–C6's state and exposing the host-facing lifecycle/data/control
//! operations plus inbound message and timer dispatch.
//!
//! Grounded on `anthocnet.h`'s public driver functions (`init`,
//! `leave_network`, `node_has_joined`, `get_next_hop`, the link/ICMP
//! callbacks) and, for the shape of a single struct owning per-node
//! protocol state with one handler method per inbound event, on
//! `bgpsim::router::Router`.

use std::collections::HashMap;
use std::fmt;

use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::best_ants::{Acceptance, BestAntsRegistry};
use crate::config::Config;
use crate::data_router::{LastSend, RouteOutcome, SessionTracker};
use crate::link_failure::repair_wait_time;
use crate::mac::{LinkStatus, MacLayer};
use crate::message::{
    BackwardAnt, ForwardAnt, HelloMessage, IcmpType, LinkFailureNotification, PacketType,
    ProactiveForwardAnt, WarningMessage,
};
use crate::pheromone::{PheromoneTable, RefreshOutcome};
use crate::probing::{hello_time_estimate, should_broadcast_pfa};
use crate::reactive::{GenerationCounter, SendBuffer, SetupState};
use crate::time_estimate::TimeEstimateEngine;
use crate::timer::{TimerKind, TimerSink};
use crate::types::{Address, Result, Seconds};

/// One AntHocNet node. Owns the pheromone table, best-ants registry,
/// time-estimate engine, ant-generation counter, per-destination setup
/// state, send buffers and the path-probing session tracker; talks to
/// the rest of the world only through the [`MacLayer`]/[`TimerSink`]
/// collaborators passed into its methods.
pub struct RoutingEngine {
    self_address: Address,
    config: Config,
    joined: bool,
    pheromone: PheromoneTable,
    best_ants: BestAntsRegistry,
    time_estimate: TimeEstimateEngine,
    generation: GenerationCounter,
    setup: HashMap<Address, SetupState>,
    buffers: HashMap<Address, SendBuffer>,
    sessions: SessionTracker,
    last_send: Option<LastSend>,
    rng: Box<dyn RngCore>,
}

impl fmt::Debug for RoutingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingEngine")
            .field("self_address", &self.self_address)
            .field("joined", &self.joined)
            .field("generation", &self.generation.current())
            .field("pheromone", &self.pheromone)
            .field("best_ants", &self.best_ants)
            .finish_non_exhaustive()
    }
}

impl RoutingEngine {
    /// Creates a new, not-yet-joined engine for `self_address`, seeding
    /// its RNG from system entropy.
    pub fn new(self_address: Address, config: Config) -> Self {
        Self::with_rng(self_address, config, StdRng::from_entropy())
    }

    /// Like [`Self::new`], but with an externally supplied RNG
    /// (`spec.md` §9: "the stochastic next-hop draw must be seedable for
    /// reproducible tests").
    pub fn with_rng(self_address: Address, config: Config, rng: impl RngCore + 'static) -> Self {
        let pheromone = PheromoneTable::new(config.gamma, config.t_hop);
        let time_estimate = TimeEstimateEngine::new(config.alpha);
        RoutingEngine {
            self_address,
            config,
            joined: false,
            pheromone,
            best_ants: BestAntsRegistry::new(),
            time_estimate,
            generation: GenerationCounter::default(),
            setup: HashMap::new(),
            buffers: HashMap::new(),
            sessions: SessionTracker::default(),
            last_send: None,
            rng: Box::new(rng),
        }
    }

    /// Joins the network: from this point on, inbound control messages
    /// are accepted (`spec.md` §6, `accept_messages()`). Does not arm the
    /// periodic hello broadcast; call [`Self::arm_hello_timer`]
    /// afterwards for that.
    pub fn init(&mut self) {
        self.joined = true;
        debug!("{} joined the network", self.self_address);
    }

    /// Arms the periodic hello-broadcast timer. Separate from [`Self::init`]
    /// so a host can join before it has a timer sink wired up.
    pub fn arm_hello_timer(&mut self, timers: &mut dyn TimerSink) {
        timers.arm(self.config.t_hello_sec, TimerKind::HelloBroadcast);
    }

    /// Leaves the network: cancels every outstanding timer and resets
    /// all protocol state to its just-constructed values, including the
    /// ant-generation counter (`anthocnet.c: leave_network`; see
    /// `DESIGN.md` for why this follows the original literally).
    pub fn leave_network(&mut self, timers: &mut dyn TimerSink) {
        let neighbours: Vec<Address> = self.pheromone.neighbours().copied().collect();
        for n in neighbours {
            if let Some(timer) = self.pheromone.remove_neighbour(n) {
                timers.cancel(timer);
            }
        }
        for (_, state) in self.setup.drain() {
            match state {
                SetupState::Searching { timer, .. } | SetupState::Repairing { timer, .. } => {
                    timers.cancel(timer);
                }
                SetupState::Idle => {}
            }
        }
        self.buffers.clear();
        self.best_ants = BestAntsRegistry::new();
        self.time_estimate = TimeEstimateEngine::new(self.config.alpha);
        self.generation = GenerationCounter::default();
        self.sessions = SessionTracker::default();
        self.last_send = None;
        self.joined = false;
        debug!("{} left the network", self.self_address);
    }

    /// `node_has_joined()` (`spec.md` §6).
    pub fn node_has_joined(&self) -> bool {
        self.joined
    }

    /// `node_is_reachable(address)` (`spec.md` §6): true for a direct
    /// neighbour, or for any destination some neighbour has a pheromone
    /// entry for.
    pub fn node_is_reachable(&self, address: Address) -> bool {
        self.pheromone.is_neighbour(address)
            || self
                .pheromone
                .neighbours()
                .any(|n| self.pheromone.get_pheromone(*n, address).is_some())
    }

    /// The most recently allocated ant generation, or 0 if none has ever
    /// run.
    pub fn get_current_ant_generation(&self) -> u32 {
        self.generation.current()
    }

    /// `true` if a reactive setup or local repair is in flight for
    /// `destination` (`spec.md` §4.6, `processes_running()` specialised
    /// per destination).
    pub fn is_busy(&self, destination: Address) -> bool {
        self.setup
            .get(&destination)
            .map(SetupState::is_busy)
            .unwrap_or(false)
    }

    /// Routes an outbound data packet (`spec.md` §4.4). `previous_hop` is
    /// `None` for a locally originated packet and `Some(addr)` when
    /// relaying a packet received from `addr`.
    pub fn get_next_hop(
        &mut self,
        destination: Address,
        payload: Vec<u8>,
        previous_hop: Option<Address>,
        now: Seconds,
        mac: &mut dyn MacLayer,
        timers: &mut dyn TimerSink,
    ) -> RouteOutcome {
        if !self.joined {
            warn!("get_next_hop called before {} joined the network", self.self_address);
            return RouteOutcome::None;
        }

        let candidates = self
            .pheromone
            .select_next_hop(destination, self.config.beta_stochastic, &mut self.rng);
        if let Some(next_hop) = candidates.first().copied() {
            self.last_send = Some(LastSend {
                destination,
                next_hop,
                payload: payload.clone(),
            });
            mac.unicast(next_hop, payload);
            if previous_hop.is_none()
                && self.sessions.note_send(
                    destination,
                    now,
                    self.config.pfa_time_threshold,
                    self.config.pfa_sending_rate,
                )
            {
                self.emit_proactive_forward_ant(destination, mac);
            }
            return RouteOutcome::NextHop(next_hop);
        }

        if let Some(prev) = previous_hop {
            debug!("no pheromone for {destination}, warning {prev}");
            let wm = WarningMessage {
                packet_type: PacketType::WarningMessage,
                destination,
                source: self.self_address,
            };
            mac.unicast(prev, wm.encode());
            return RouteOutcome::None;
        }

        if !self.is_busy(destination) {
            self.start_setup(destination, mac, timers);
        }
        self.buffer_packet(destination, payload);
        RouteOutcome::Buffered
    }

    fn buffer_packet(&mut self, destination: Address, payload: Vec<u8>) {
        let buffer = self.buffers.entry(destination).or_default();
        if buffer.push(payload, self.config.max_send_buffer_len) {
            warn!("send buffer for {destination} full, dropped oldest packet");
        }
    }

    /// Reports the outcome of an outbound frame (`spec.md` §6, the link
    /// callback). `neighbour` is the frame's link-layer destination.
    pub fn on_link_result(
        &mut self,
        neighbour: Address,
        status: LinkStatus,
        t_mac: Seconds,
        mac: &mut dyn MacLayer,
        timers: &mut dyn TimerSink,
    ) {
        self.time_estimate.on_mac_sent(t_mac);

        match status {
            LinkStatus::Success => {
                if self.pheromone.is_neighbour(neighbour) {
                    if let Some(old) = self.pheromone.neighbour(neighbour).and_then(|e| e.hello_timer) {
                        timers.cancel(old);
                    }
                    let timer = timers.arm(self.config.t_hello_sec, TimerKind::HelloLoss(neighbour));
                    self.pheromone.set_hello_timer(neighbour, timer);
                }
            }
            LinkStatus::Deferred => {}
            LinkStatus::PermanentFailure => {
                self.handle_data_transmission_failure(neighbour, mac, timers);
            }
        }
    }

    fn handle_data_transmission_failure(
        &mut self,
        neighbour: Address,
        mac: &mut dyn MacLayer,
        timers: &mut dyn TimerSink,
    ) {
        let Some(last) = self.last_send.take() else {
            trace!("link failure for {neighbour} did not follow a data send, ignoring");
            return;
        };
        if last.next_hop != neighbour {
            trace!("stale link failure for {neighbour}, last data send targeted {}", last.next_hop);
            self.last_send = Some(last);
            return;
        }

        let retry = self
            .pheromone
            .select_next_hop(last.destination, self.config.beta_stochastic, &mut self.rng)
            .into_iter()
            .find(|n| *n != neighbour);

        if let Some(alt) = retry {
            debug!("retrying data send to {} via {alt} after {neighbour} failed", last.destination);
            self.last_send = Some(LastSend {
                destination: last.destination,
                next_hop: alt,
                payload: last.payload.clone(),
            });
            mac.unicast(alt, last.payload);
            return;
        }

        if self.is_busy(last.destination) {
            trace!("data-transmission-failed: setup already in flight for {}", last.destination);
            return;
        }
        self.start_data_transmission_failed(last.destination, neighbour, mac, timers);
    }

    fn start_data_transmission_failed(
        &mut self,
        destination: Address,
        failed_neighbour: Address,
        mac: &mut dyn MacLayer,
        timers: &mut dyn TimerSink,
    ) {
        let Some(tau) = self.pheromone.get_pheromone(failed_neighbour, destination) else {
            trace!("no pheromone value for {failed_neighbour}->{destination}, skipping repair");
            return;
        };
        let generation = self.generation.advance();
        self.emit_forward_ant(generation, destination, PacketType::PathRepairAnt, 0, mac);
        let wait = repair_wait_time(self.config.factor_of_waiting_time_bra, tau);
        let timer = timers.arm(wait, TimerKind::RepairWait(destination));
        self.setup.insert(
            destination,
            SetupState::Repairing {
                generation,
                failed_neighbour,
                timer,
            },
        );
        debug!("data-transmission-failed process started for {destination} via {failed_neighbour}");
    }

    fn start_setup(&mut self, destination: Address, mac: &mut dyn MacLayer, timers: &mut dyn TimerSink) {
        let generation = self.generation.advance();
        self.emit_forward_ant(generation, destination, PacketType::ReactiveForwardAnt, 0, mac);
        let timer = timers.arm(self.config.restart_path_setup_secs, TimerKind::PathSetupRestart(destination));
        self.setup.insert(
            destination,
            SetupState::Searching {
                generation,
                tries_remaining: self.config.max_tries_path_setup,
                timer,
            },
        );
        debug!("reactive path setup started for {destination}, generation {generation}");
    }

    fn emit_forward_ant(
        &self,
        generation: u32,
        destination: Address,
        kind: PacketType,
        number_broadcasts: u32,
        mac: &mut dyn MacLayer,
    ) {
        let ant = ForwardAnt {
            kind,
            generation,
            source: self.self_address,
            destination,
            time_estimate: 0.0,
            number_broadcasts,
            hops: 0,
            path: Vec::new(),
        };
        mac.broadcast(ant.encode());
    }

    fn emit_proactive_forward_ant(&mut self, destination: Address, mac: &mut dyn MacLayer) {
        let ant = ProactiveForwardAnt {
            source: self.self_address,
            destination,
            number_of_broadcasts: 0,
            hops: 0,
            path: Vec::new(),
        };
        self.send_or_relay_pfa(ant, mac);
    }

    /// Dispatches an inbound control message (`spec.md` §6). A no-op
    /// (logged at `trace`) before [`Self::init`], matching the original's
    /// `accept_messages()` gate.
    pub fn on_control_message(
        &mut self,
        icmp_type: IcmpType,
        payload: &[u8],
        now: Seconds,
        mac: &mut dyn MacLayer,
        timers: &mut dyn TimerSink,
    ) -> Result<()> {
        if !self.joined {
            trace!("dropping inbound control message: {} has not joined yet", self.self_address);
            return Ok(());
        }
        match icmp_type {
            IcmpType::ReactiveForwardOrPathRepair => {
                let ant = ForwardAnt::decode(payload)?;
                self.handle_forward_ant(ant, mac);
            }
            IcmpType::ReactiveBackward => {
                let ant = BackwardAnt::decode(payload)?;
                self.handle_backward_ant(ant, now, mac, timers);
            }
            IcmpType::ProactiveForward => {
                let ant = ProactiveForwardAnt::decode(payload)?;
                self.handle_proactive_forward_ant(ant, mac);
            }
            IcmpType::Hello => {
                let hm = HelloMessage::decode(payload)?;
                self.handle_hello_message(hm, timers);
            }
            IcmpType::Warning => {
                let wm = WarningMessage::decode(payload)?;
                debug!("warning message from {} removed destination {}", wm.source, wm.destination);
                self.pheromone.remove_destination(wm.source, wm.destination);
            }
            IcmpType::LinkFailureNotification => {
                let lfn = LinkFailureNotification::decode(payload)?;
                self.handle_link_failure_notification(lfn, mac);
            }
        }
        Ok(())
    }

    /// Reactive forward/path-repair ant relay (`spec.md` §4.3): loop and
    /// max-hops drop, acceptance filter, destination-reached backward-ant
    /// emission, and unicast-or-broadcast relay.
    fn handle_forward_ant(&mut self, mut ant: ForwardAnt, mac: &mut dyn MacLayer) {
        if ant.source == self.self_address {
            trace!("dropping forward ant: self-sourced");
            return;
        }
        if ant.path.contains(&self.self_address) {
            trace!("dropping forward ant from {}: loop detected", ant.source);
            return;
        }
        ant.hops += 1;
        if ant.hops > self.config.max_hops {
            trace!("dropping forward ant from {}: max hops exceeded", ant.source);
            return;
        }
        ant.path.push(self.self_address);

        if ant.destination == self.self_address {
            debug!("forward ant from {} reached destination in {} hops", ant.source, ant.hops);
            self.emit_backward_ant(&ant, mac);
            return;
        }

        ant.time_estimate = self
            .time_estimate
            .extend_time_estimate(ant.time_estimate as Seconds, mac.queue_depth()) as f32;

        let first_hop = ant.path[0];
        let acceptance = self.best_ants.accept(
            ant.source,
            ant.generation,
            first_hop,
            ant.time_estimate as Seconds,
            self.config.a1,
            self.config.a2,
        );
        if acceptance == Acceptance::Drop {
            trace!("forward ant from {} generation {} rejected by acceptance filter", ant.source, ant.generation);
            return;
        }

        let candidates = self
            .pheromone
            .select_next_hop(ant.destination, self.config.beta_forward, &mut self.rng);
        if let Some(next_hop) = candidates.first().copied() {
            mac.unicast(next_hop, ant.encode());
            return;
        }

        if ant.kind == PacketType::PathRepairAnt && ant.number_broadcasts >= self.config.max_number_broadcasts_path_repair
        {
            trace!("dropping path repair ant from {}: broadcast cap reached", ant.source);
            return;
        }
        ant.number_broadcasts += 1;
        mac.broadcast(ant.encode());
    }

    fn emit_backward_ant(&self, ant: &ForwardAnt, mac: &mut dyn MacLayer) {
        let mut path = ant.path.clone();
        path.reverse();
        if path.len() < 2 || !self.pheromone.is_neighbour(path[1]) {
            debug!("backward ant to {} has no reachable next hop, dropping", ant.source);
            return;
        }
        let next_hop = path[1];
        let rba = BackwardAnt {
            generation: ant.generation,
            destination: ant.source,
            current_hop: 0,
            time_estimate: 0.0,
            length: path.len() as u8,
            path,
        };
        mac.unicast(next_hop, rba.encode());
    }

    /// Reactive backward ant relay (`spec.md` §4.3): pheromone update at
    /// every hop (`DESIGN.md`'s off-by-one resolution), generation-gated
    /// setup completion at the originator, unicast relay otherwise.
    fn handle_backward_ant(
        &mut self,
        mut ant: BackwardAnt,
        now: Seconds,
        mac: &mut dyn MacLayer,
        timers: &mut dyn TimerSink,
    ) {
        ant.current_hop += 1;
        ant.time_estimate = self
            .time_estimate
            .extend_time_estimate(ant.time_estimate as Seconds, mac.queue_depth()) as f32;

        if let Some(new_neighbour) =
            self.pheromone
                .update_on_backward_ant(&ant.path, ant.current_hop, ant.time_estimate as Seconds)
        {
            let timer = timers.arm(self.config.t_hello_sec, TimerKind::HelloLoss(new_neighbour));
            self.pheromone.set_hello_timer(new_neighbour, timer);
            debug!("backward ant seeded new neighbour {new_neighbour}");
        }

        if ant.destination == self.self_address {
            if let Some(searched) = ant.path.first().copied() {
                self.complete_setup(searched, ant.generation, now, mac, timers);
            }
            return;
        }

        let position = ant.current_hop as usize + 1;
        let next_hop = if position < ant.path.len() {
            ant.path[position]
        } else {
            ant.destination
        };
        if !self.pheromone.is_neighbour(next_hop) {
            debug!("backward ant relay to {next_hop} has no reachable hop, dropping");
            return;
        }
        mac.unicast(next_hop, ant.encode());
    }

    fn complete_setup(
        &mut self,
        destination: Address,
        generation: u32,
        now: Seconds,
        mac: &mut dyn MacLayer,
        timers: &mut dyn TimerSink,
    ) {
        let matches_active = match self.setup.get(&destination) {
            Some(SetupState::Searching { generation: g, .. }) => *g == generation,
            Some(SetupState::Repairing { generation: g, .. }) => *g == generation,
            _ => false,
        };
        if !matches_active {
            trace!("backward ant for {destination} generation {generation} does not match active setup, ignoring");
            return;
        }

        if let Some(state) = self.setup.remove(&destination) {
            let timer = match state {
                SetupState::Searching { timer, .. } | SetupState::Repairing { timer, .. } => Some(timer),
                SetupState::Idle => None,
            };
            if let Some(t) = timer {
                timers.cancel(t);
            }
        }

        if let Some(mut buffer) = self.buffers.remove(&destination) {
            let flushed = buffer.len();
            debug!("reactive path setup to {destination} completed, flushing {flushed} buffered packet(s)");
            for packet in buffer.drain().collect::<Vec<_>>() {
                self.get_next_hop(destination, packet, None, now, mac, timers);
            }
        }
    }

    fn handle_path_setup_restart(
        &mut self,
        destination: Address,
        mac: &mut dyn MacLayer,
        timers: &mut dyn TimerSink,
    ) {
        let tries_remaining = match self.setup.get(&destination) {
            Some(SetupState::Searching { tries_remaining, .. }) => *tries_remaining,
            _ => {
                trace!("stale path-setup-restart timer for {destination}, ignoring");
                return;
            }
        };

        let generation = self.generation.advance();
        self.emit_forward_ant(generation, destination, PacketType::ReactiveForwardAnt, 0, mac);
        let tries_remaining = tries_remaining - 1;

        if tries_remaining == 0 {
            self.setup.insert(destination, SetupState::Idle);
            if let Some(mut buffer) = self.buffers.remove(&destination) {
                let dropped = buffer.drain().count();
                if dropped > 0 {
                    warn!("reactive path setup to {destination} exhausted, discarded {dropped} buffered packet(s)");
                }
            }
            return;
        }

        let timer = timers.arm(self.config.restart_path_setup_secs, TimerKind::PathSetupRestart(destination));
        self.setup.insert(
            destination,
            SetupState::Searching {
                generation,
                tries_remaining,
                timer,
            },
        );
        debug!("reactive path setup restarted for {destination}, generation {generation}");
    }

    fn handle_repair_wait_timeout(&mut self, destination: Address, mac: &mut dyn MacLayer, timers: &mut dyn TimerSink) {
        let failed_neighbour = match self.setup.get(&destination) {
            Some(SetupState::Repairing { failed_neighbour, .. }) => *failed_neighbour,
            _ => {
                trace!("stale repair-wait timer for {destination}, ignoring");
                return;
            }
        };
        self.setup.insert(destination, SetupState::Idle);
        if let Some(mut buffer) = self.buffers.remove(&destination) {
            let dropped = buffer.drain().count();
            if dropped > 0 {
                warn!("path repair for {destination} timed out, discarded {dropped} buffered packet(s)");
            }
        }
        self.neighbour_lost(failed_neighbour, mac, timers);
    }

    /// Proactive forward ant relay (`spec.md` §4.5).
    fn handle_proactive_forward_ant(&mut self, mut ant: ProactiveForwardAnt, mac: &mut dyn MacLayer) {
        ant.hops += 1;
        ant.path.push(self.self_address);

        if ant.destination == self.self_address {
            debug!("proactive forward ant from {} reached destination", ant.source);
            self.emit_backward_ant_for_probe(&ant, mac);
            return;
        }
        self.send_or_relay_pfa(ant, mac);
    }

    fn emit_backward_ant_for_probe(&self, ant: &ProactiveForwardAnt, mac: &mut dyn MacLayer) {
        let mut path = ant.path.clone();
        path.reverse();
        if path.len() < 2 || !self.pheromone.is_neighbour(path[1]) {
            debug!("backward ant for proactive probe from {} has no reachable next hop", ant.source);
            return;
        }
        let next_hop = path[1];
        let rba = BackwardAnt {
            generation: self.generation.current(),
            destination: ant.source,
            current_hop: 0,
            time_estimate: 0.0,
            length: path.len() as u8,
            path,
        };
        mac.unicast(next_hop, rba.encode());
    }

    fn send_or_relay_pfa(&mut self, mut ant: ProactiveForwardAnt, mac: &mut dyn MacLayer) {
        let candidates = self
            .pheromone
            .select_next_hop(ant.destination, self.config.beta_forward, &mut self.rng);
        let chosen = candidates.first().copied();

        if should_broadcast_pfa(chosen, self.config.pfa_broadcast_probability, &mut self.rng) {
            if ant.number_of_broadcasts as u32 >= self.config.max_number_broadcasts_pfa {
                trace!("dropping proactive forward ant to {}: broadcast cap reached", ant.destination);
                return;
            }
            ant.number_of_broadcasts += 1;
            mac.broadcast(ant.encode());
        } else if let Some(next_hop) = chosen {
            mac.unicast(next_hop, ant.encode());
        }
    }

    /// Hello message reception (`spec.md` §4.5): seeds or refreshes the
    /// sender's neighbour entry and (re-)arms its hello-loss timer.
    fn handle_hello_message(&mut self, hm: HelloMessage, timers: &mut dyn TimerSink) {
        let tau_hat = 1.0 / ((hm.time_estimate as f64 + self.config.t_hop) / 2.0);
        let tau_seed = (1.0 - self.config.gamma) * tau_hat;
        match self.pheromone.add_or_refresh_neighbour(hm.source, tau_seed) {
            RefreshOutcome::New => {
                let timer = timers.arm(self.config.t_hello_sec, TimerKind::HelloLoss(hm.source));
                self.pheromone.set_hello_timer(hm.source, timer);
                debug!("new neighbour {} discovered via hello", hm.source);
            }
            RefreshOutcome::Refreshed { old_timer } => {
                if let Some(old) = old_timer {
                    timers.cancel(old);
                }
                let timer = timers.arm(self.config.t_hello_sec, TimerKind::HelloLoss(hm.source));
                self.pheromone.set_hello_timer(hm.source, timer);
            }
        }
    }

    fn handle_hello_loss(&mut self, n: Address, mac: &mut dyn MacLayer, timers: &mut dyn TimerSink) {
        let Some(count) = self.pheromone.record_hello_loss(n) else {
            trace!("hello-loss timer fired for unknown neighbour {n}");
            return;
        };
        if count > self.config.allowed_hello_loss {
            debug!("neighbour {n} declared lost after {count} missed hellos");
            self.neighbour_lost(n, mac, timers);
        } else {
            let timer = timers.arm(self.config.t_hello_sec, TimerKind::HelloLoss(n));
            self.pheromone.set_hello_timer(n, timer);
        }
    }

    fn handle_hello_broadcast(&mut self, mac: &mut dyn MacLayer, timers: &mut dyn TimerSink) {
        let t_hat_p = self.time_estimate.extend_time_estimate(0.0, mac.queue_depth());
        let hm = HelloMessage {
            source: self.self_address,
            time_estimate: hello_time_estimate(t_hat_p),
        };
        mac.broadcast(hm.encode());
        timers.arm(self.config.t_hello_sec, TimerKind::HelloBroadcast);
    }

    fn neighbour_lost(&mut self, n: Address, mac: &mut dyn MacLayer, timers: &mut dyn TimerSink) {
        let entries = self.pheromone.build_link_failure_entries(n);
        if !entries.is_empty() {
            let lfn = LinkFailureNotification {
                source: self.self_address,
                failed_link: n,
                entries,
            };
            mac.broadcast(lfn.encode());
            debug!("broadcast link failure notification for lost neighbour {n}");
        }
        if let Some(timer) = self.pheromone.remove_neighbour(n) {
            timers.cancel(timer);
        }
        self.best_ants.remove_source(n);
    }

    /// Link failure notification reception (`spec.md` §4.6): blends
    /// alternative entries into the local table and re-propagates any
    /// entries this node has its own alternative for.
    fn handle_link_failure_notification(&mut self, lfn: LinkFailureNotification, mac: &mut dyn MacLayer) {
        let repropagate = self.pheromone.update_on_link_failure(&lfn);
        if !repropagate.is_empty() {
            let rebroadcast = LinkFailureNotification {
                source: self.self_address,
                failed_link: lfn.failed_link,
                entries: repropagate,
            };
            mac.broadcast(rebroadcast.encode());
            debug!("re-propagated link failure notification for failed link {}", lfn.failed_link);
        }
    }

    /// Dispatches a fired timer (`spec.md` §6) to the handler for its
    /// [`TimerKind`].
    pub fn on_timer_fired(&mut self, kind: TimerKind, mac: &mut dyn MacLayer, timers: &mut dyn TimerSink) {
        match kind {
            TimerKind::HelloBroadcast => self.handle_hello_broadcast(mac, timers),
            TimerKind::HelloLoss(n) => self.handle_hello_loss(n, mac, timers),
            TimerKind::PathSetupRestart(d) => self.handle_path_setup_restart(d, mac, timers),
            TimerKind::RepairWait(d) => self.handle_repair_wait_timeout(d, mac, timers),
        }
    }
}
