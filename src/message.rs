//! Wire-level control messages (`spec.md` §6): reactive forward/path
//! repair ants, reactive backward ants, proactive forward ants, hello
//! messages, warning messages and link-failure notifications.
//!
//! Carried in ICMPv6 with the experimental type codes from the original
//! `anthocnet-icmpv6.h` (230–235). Each message is a fixed-size header
//! followed by a variable-length trailer of addresses or LFN entries,
//! encoded big-endian with no padding.

use thiserror::Error;

use crate::types::Address;

/// ICMPv6 type codes used by the protocol (`anthocnet-icmpv6.h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IcmpType {
    /// Reactive forward ant / path repair ant.
    ReactiveForwardOrPathRepair = 230,
    /// Reactive backward ant.
    ReactiveBackward = 231,
    /// Proactive forward ant.
    ProactiveForward = 232,
    /// Hello message.
    Hello = 233,
    /// Warning message.
    Warning = 234,
    /// Link failure notification.
    LinkFailureNotification = 235,
}

/// The kind of ant/packet a message represents, mirroring the original
/// `type_of_packet` enum. Reused both as the `ant_type` tag on
/// forward/path-repair ants and as the `packet_type` field of a warning
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Reactive forward ant.
    ReactiveForwardAnt = 0,
    /// Path repair ant (an RFA relabelled for local repair).
    PathRepairAnt = 1,
    /// Reactive backward ant.
    BackwardAnt = 2,
    /// Warning message.
    WarningMessage = 3,
}

impl PacketType {
    fn from_u8(v: u8) -> Result<Self, DecodeError> {
        Ok(match v {
            0 => PacketType::ReactiveForwardAnt,
            1 => PacketType::PathRepairAnt,
            2 => PacketType::BackwardAnt,
            3 => PacketType::WarningMessage,
            other => return Err(DecodeError::BadTag(other)),
        })
    }
}

/// Errors produced while decoding a wire message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before a fixed-size field could be read.
    #[error("buffer too short")]
    Truncated,
    /// An enum tag byte did not match any known variant.
    #[error("unknown packet type tag: {0}")]
    BadTag(u8),
    /// The declared `hops`/`length`/`list_length` implied a trailer the
    /// buffer does not actually contain, or exceeded a sanity bound.
    #[error("implausible trailer length: {0}")]
    ImplausibleLength(u32),
}

/// Trailers longer than this are rejected outright as malformed
/// (`spec.md` §7, "Invariant violation"); real paths are bounded by
/// `Config::max_hops` (100) long before this.
const MAX_TRAILER_LEN: u32 = 4096;

fn push_address(buf: &mut Vec<u8>, addr: Address) {
    buf.extend_from_slice(&addr.raw().to_be_bytes());
}

fn read_address(buf: &[u8], pos: &mut usize) -> Result<Address, DecodeError> {
    let bytes = buf.get(*pos..*pos + 16).ok_or(DecodeError::Truncated)?;
    *pos += 16;
    let mut raw = [0u8; 16];
    raw.copy_from_slice(bytes);
    Ok(Address::from(u128::from_be_bytes(raw)))
}

fn read_u32(buf: &[u8], pos: &mut usize) -> Result<u32, DecodeError> {
    let bytes = buf.get(*pos..*pos + 4).ok_or(DecodeError::Truncated)?;
    *pos += 4;
    Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
}

fn read_u8(buf: &[u8], pos: &mut usize) -> Result<u8, DecodeError> {
    let b = *buf.get(*pos).ok_or(DecodeError::Truncated)?;
    *pos += 1;
    Ok(b)
}

fn read_f32(buf: &[u8], pos: &mut usize) -> Result<f32, DecodeError> {
    Ok(f32::from_bits(read_u32(buf, pos)?))
}

fn check_len(declared: u32) -> Result<(), DecodeError> {
    if declared > MAX_TRAILER_LEN {
        Err(DecodeError::ImplausibleLength(declared))
    } else {
        Ok(())
    }
}

/// A reactive forward ant or a path repair ant (`spec.md` §6, RFA/PRA,
/// ICMPv6 type 230). Both share this wire format; `kind` distinguishes
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardAnt {
    /// Whether this is a fresh reactive setup ant or a local-repair ant.
    pub kind: PacketType,
    /// The ant generation this message belongs to.
    pub generation: u32,
    /// The node that originated the ant.
    pub source: Address,
    /// The destination the ant is searching a path to.
    pub destination: Address,
    /// Accumulated path-time estimate, in seconds.
    pub time_estimate: f32,
    /// Number of times this ant has been broadcast so far.
    pub number_broadcasts: u32,
    /// Number of hops taken so far / length of `path`.
    pub hops: u32,
    /// The ordered list of nodes the ant has visited.
    pub path: Vec<Address>,
}

impl ForwardAnt {
    /// Encodes this message to its wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(21 + self.path.len() * 16);
        buf.push(self.kind as u8);
        buf.extend_from_slice(&self.generation.to_be_bytes());
        push_address(&mut buf, self.source);
        push_address(&mut buf, self.destination);
        buf.extend_from_slice(&self.time_estimate.to_bits().to_be_bytes());
        buf.extend_from_slice(&self.number_broadcasts.to_be_bytes());
        buf.extend_from_slice(&self.hops.to_be_bytes());
        for a in &self.path {
            push_address(&mut buf, *a);
        }
        buf
    }

    /// Decodes a message previously produced by [`Self::encode`].
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut pos = 0;
        let kind = PacketType::from_u8(read_u8(buf, &mut pos)?)?;
        let generation = read_u32(buf, &mut pos)?;
        let source = read_address(buf, &mut pos)?;
        let destination = read_address(buf, &mut pos)?;
        let time_estimate = read_f32(buf, &mut pos)?;
        let number_broadcasts = read_u32(buf, &mut pos)?;
        let hops = read_u32(buf, &mut pos)?;
        check_len(hops)?;
        let path = (0..hops)
            .map(|_| read_address(buf, &mut pos))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ForwardAnt {
            kind,
            generation,
            source,
            destination,
            time_estimate,
            number_broadcasts,
            hops,
            path,
        })
    }
}

/// A reactive backward ant (`spec.md` §6, RBA, ICMPv6 type 231).
#[derive(Debug, Clone, PartialEq)]
pub struct BackwardAnt {
    /// The ant generation of the forward ant this backward ant answers.
    pub generation: u32,
    /// The node that originated the forward ant and expects this
    /// backward ant.
    pub destination: Address,
    /// Index of the current hop in `path`, starting at 0.
    pub current_hop: u32,
    /// Accumulated path-time estimate, in seconds.
    pub time_estimate: f32,
    /// Length of `path`.
    pub length: u8,
    /// The reversed path the forward ant took.
    pub path: Vec<Address>,
}

impl BackwardAnt {
    /// Encodes this message to its wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(14 + self.path.len() * 16);
        buf.extend_from_slice(&self.generation.to_be_bytes());
        push_address(&mut buf, self.destination);
        buf.extend_from_slice(&self.current_hop.to_be_bytes());
        buf.extend_from_slice(&self.time_estimate.to_bits().to_be_bytes());
        buf.push(self.length);
        for a in &self.path {
            push_address(&mut buf, *a);
        }
        buf
    }

    /// Decodes a message previously produced by [`Self::encode`].
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut pos = 0;
        let generation = read_u32(buf, &mut pos)?;
        let destination = read_address(buf, &mut pos)?;
        let current_hop = read_u32(buf, &mut pos)?;
        let time_estimate = read_f32(buf, &mut pos)?;
        let length = read_u8(buf, &mut pos)?;
        check_len(length as u32)?;
        let path = (0..length)
            .map(|_| read_address(buf, &mut pos))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BackwardAnt {
            generation,
            destination,
            current_hop,
            time_estimate,
            length,
            path,
        })
    }
}

/// A proactive forward ant (`spec.md` §6, PFA, ICMPv6 type 232). Carries
/// no generation: path probing is asynchronous with reactive setup.
#[derive(Debug, Clone, PartialEq)]
pub struct ProactiveForwardAnt {
    /// The node that originated this probe.
    pub source: Address,
    /// The destination being probed.
    pub destination: Address,
    /// Number of times this ant has been broadcast so far.
    pub number_of_broadcasts: u8,
    /// Number of hops taken so far / length of `path`.
    pub hops: u32,
    /// The ordered list of nodes the ant has visited.
    pub path: Vec<Address>,
}

impl ProactiveForwardAnt {
    /// Encodes this message to its wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(37 + self.path.len() * 16);
        push_address(&mut buf, self.source);
        push_address(&mut buf, self.destination);
        buf.push(self.number_of_broadcasts);
        buf.extend_from_slice(&self.hops.to_be_bytes());
        for a in &self.path {
            push_address(&mut buf, *a);
        }
        buf
    }

    /// Decodes a message previously produced by [`Self::encode`].
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut pos = 0;
        let source = read_address(buf, &mut pos)?;
        let destination = read_address(buf, &mut pos)?;
        let number_of_broadcasts = read_u8(buf, &mut pos)?;
        let hops = read_u32(buf, &mut pos)?;
        check_len(hops)?;
        let path = (0..hops)
            .map(|_| read_address(buf, &mut pos))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProactiveForwardAnt {
            source,
            destination,
            number_of_broadcasts,
            hops,
            path,
        })
    }
}

/// A hello liveness beacon (`spec.md` §6, HM, ICMPv6 type 233).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelloMessage {
    /// The broadcasting node.
    pub source: Address,
    /// That node's current path-time estimate, clamped to at least 1.0
    /// when zero (`spec.md` §4.5).
    pub time_estimate: f32,
}

impl HelloMessage {
    /// Encodes this message to its wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(20);
        push_address(&mut buf, self.source);
        buf.extend_from_slice(&self.time_estimate.to_bits().to_be_bytes());
        buf
    }

    /// Decodes a message previously produced by [`Self::encode`].
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut pos = 0;
        let source = read_address(buf, &mut pos)?;
        let time_estimate = read_f32(buf, &mut pos)?;
        Ok(HelloMessage {
            source,
            time_estimate,
        })
    }
}

/// A warning message (`spec.md` §6, WM, ICMPv6 type 234): sent when a
/// forwarding node has no pheromone for a destination a data packet
/// arrived for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarningMessage {
    /// The kind of packet that triggered this warning.
    pub packet_type: PacketType,
    /// The destination the sender could not route towards.
    pub destination: Address,
    /// The node emitting the warning (the previous hop removes its
    /// `(source, destination)` entry on receipt).
    pub source: Address,
}

impl WarningMessage {
    /// Encodes this message to its wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(33);
        buf.push(self.packet_type as u8);
        push_address(&mut buf, self.destination);
        push_address(&mut buf, self.source);
        buf
    }

    /// Decodes a message previously produced by [`Self::encode`].
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut pos = 0;
        let packet_type = PacketType::from_u8(read_u8(buf, &mut pos)?)?;
        let destination = read_address(buf, &mut pos)?;
        let source = read_address(buf, &mut pos)?;
        Ok(WarningMessage {
            packet_type,
            destination,
            source,
        })
    }
}

/// One entry of a link failure notification. The sentinel
/// `{hops=0, value=-100.0}` marks a total loss (no alternative path);
/// see `DESIGN.md` for why this is kept at the wire layer but not
/// compared as a float anywhere else in the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LfnOutcome {
    /// No alternative neighbour exists for this destination; receivers
    /// must invalidate, not update, their entry.
    TotalLoss,
    /// An alternative neighbour exists; `hops`/`value` is the value the
    /// receiver should blend into its own pheromone update (`spec.md`
    /// §9: this reuses the `T̂_P` wire field name for a rate-like
    /// quantity — documented here as `value`, not a time estimate).
    Alternative {
        /// Hop count of the alternative path.
        hops: u32,
        /// The blending input for the receiver's τ update.
        value: f32,
    },
}

/// One destination entry inside a [`LinkFailureNotification`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfnEntry {
    /// The destination this entry concerns.
    pub destination: Address,
    /// Either the alternative path data, or the total-loss marker.
    pub outcome: LfnOutcome,
}

impl LfnEntry {
    const WIRE_LEN: usize = 24;
    const TOTAL_LOSS_SENTINEL: f32 = -100.0;

    fn encode(&self, buf: &mut Vec<u8>) {
        push_address(buf, self.destination);
        match self.outcome {
            LfnOutcome::TotalLoss => {
                buf.extend_from_slice(&0u32.to_be_bytes());
                buf.extend_from_slice(&Self::TOTAL_LOSS_SENTINEL.to_bits().to_be_bytes());
            }
            LfnOutcome::Alternative { hops, value } => {
                buf.extend_from_slice(&hops.to_be_bytes());
                buf.extend_from_slice(&value.to_bits().to_be_bytes());
            }
        }
    }

    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, DecodeError> {
        let destination = read_address(buf, pos)?;
        let hops = read_u32(buf, pos)?;
        let value = read_f32(buf, pos)?;
        let outcome = if hops == 0 && value == Self::TOTAL_LOSS_SENTINEL {
            LfnOutcome::TotalLoss
        } else {
            LfnOutcome::Alternative { hops, value }
        };
        Ok(LfnEntry {
            destination,
            outcome,
        })
    }
}

/// A link failure notification (`spec.md` §6, LFN, ICMPv6 type 235).
#[derive(Debug, Clone, PartialEq)]
pub struct LinkFailureNotification {
    /// The node (re-)broadcasting this notification.
    pub source: Address,
    /// The neighbour whose loss originally triggered this notification.
    pub failed_link: Address,
    /// The affected destinations.
    pub entries: Vec<LfnEntry>,
}

impl LinkFailureNotification {
    /// Encodes this message to its wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(33 + self.entries.len() * LfnEntry::WIRE_LEN);
        push_address(&mut buf, self.source);
        push_address(&mut buf, self.failed_link);
        buf.push(self.entries.len() as u8);
        for entry in &self.entries {
            entry.encode(&mut buf);
        }
        buf
    }

    /// Decodes a message previously produced by [`Self::encode`].
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut pos = 0;
        let source = read_address(buf, &mut pos)?;
        let failed_link = read_address(buf, &mut pos)?;
        let list_length = read_u8(buf, &mut pos)?;
        check_len(list_length as u32)?;
        let entries = (0..list_length)
            .map(|_| LfnEntry::decode(buf, &mut pos))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LinkFailureNotification {
            source,
            failed_link,
            entries,
        })
    }
}
