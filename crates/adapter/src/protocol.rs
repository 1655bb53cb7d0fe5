//! Protocol module - JSON message types for the adapter
//!
//! Line-delimited JSON. All messages carry: type, seq (sequence number), ts
//! (timestamp in ms).

use serde::{Deserialize, Serialize};

use crate::types::{
    CoreEvent, DotColor, GameState, PieceKind, Position, SpecialSpawn, WorldPoint,
};
use dotlink_core::{GridSnapshot, Solvability};

/// Major version accepted from clients
pub const PROTOCOL_MAJOR: &str = "1.";

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HelloType {
    #[serde(rename = "hello")]
    #[default]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CommandType {
    #[serde(rename = "command")]
    #[default]
    Command,
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    #[serde(default = "default_true")]
    pub stream_events: bool,
    #[serde(default = "default_true")]
    pub stream_observations: bool,
}

impl Default for RequestedCapabilities {
    fn default() -> Self {
        Self {
            stream_events: true,
            stream_observations: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Command message (controller only)
#[derive(Debug, Clone, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub action: ActionName,
    #[serde(default)]
    pub x: Option<i32>,
    #[serde(default)]
    pub y: Option<i32>,
}

impl CommandMessage {
    /// Tile named by `x`/`y`, when both are present
    pub fn position(&self) -> Option<Position> {
        Some(Position::new(self.x?, self.y?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionName {
    DragStart,
    DragUpdate,
    DragEnd,
    Tap,
    Shuffle,
    Hint,
    Snapshot,
}

impl ActionName {
    pub const ALL: [ActionName; 7] = [
        ActionName::DragStart,
        ActionName::DragUpdate,
        ActionName::DragEnd,
        ActionName::Tap,
        ActionName::Shuffle,
        ActionName::Hint,
        ActionName::Snapshot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::DragStart => "dragStart",
            ActionName::DragUpdate => "dragUpdate",
            ActionName::DragEnd => "dragEnd",
            ActionName::Tap => "tap",
            ActionName::Shuffle => "shuffle",
            ActionName::Hint => "hint",
            ActionName::Snapshot => "snapshot",
        }
    }
}

impl<'de> Deserialize<'de> for ActionName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        ActionName::ALL
            .into_iter()
            .find(|a| s.eq_ignore_ascii_case(a.as_str()))
            .ok_or_else(|| serde::de::Error::custom("unknown action"))
    }
}

impl Serialize for ActionName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "event")]
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "not_controller")]
    NotController,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "backpressure")]
    Backpressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    pub game_id: String,
    pub actions: Vec<ActionName>,
}

/// Acknowledgment for an applied command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// One core event, streamed to every subscribed client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub msg_type: EventType,
    pub seq: u64,
    pub ts: u64,
    pub event: WireEvent,
}

/// Grid observation (sent on request and after every command)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub state: String,
    pub solvability: String,
    pub dragging: bool,
    pub chain: Vec<WirePosition>,
    pub pending_refills: usize,
    pub grid: GridObservation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridObservation {
    pub width: u8,
    pub height: u8,
    /// Top row first; `R G B Y P` normal pieces, `L` line bomb, `C` color bomb, `.` empty
    pub rows: Vec<String>,
}

impl From<&GridSnapshot> for GridObservation {
    fn from(value: &GridSnapshot) -> Self {
        Self {
            width: value.width,
            height: value.height,
            rows: value.to_rows(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WirePosition {
    pub x: i32,
    pub y: i32,
}

impl From<Position> for WirePosition {
    fn from(value: Position) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub x: f32,
    pub y: f32,
}

impl From<WorldPoint> for WirePoint {
    fn from(value: WorldPoint) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }
}

/// Serializable mirror of `CoreEvent`
///
/// Enum payloads are carried as their lowercase/camelCase names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum WireEvent {
    GameStateChanged {
        state: String,
    },
    #[serde(rename_all = "camelCase")]
    ChainResolved {
        positions: Vec<WirePosition>,
        bomb_color: Option<String>,
        contains_color_bomb: bool,
        spawn: Option<String>,
    },
    BombExploded {
        position: WirePosition,
        radius: u8,
    },
    PieceSpawned {
        id: u32,
        kind: String,
        color: Option<String>,
        position: WirePosition,
        from: WirePoint,
        to: WirePoint,
    },
    PieceMoved {
        id: u32,
        from: WirePosition,
        to: WirePosition,
        target: WirePoint,
    },
    PieceCleared {
        id: u32,
        kind: String,
        position: WirePosition,
    },
    GridShuffled,
    HintFound {
        path: Vec<WirePosition>,
    },
    HintUnavailable,
    LineStarted {
        color: String,
        anchor: WirePoint,
    },
    LineExtended {
        anchor: WirePoint,
    },
    LineEnded,
}

fn color_name(color: DotColor) -> String {
    color.as_str().to_string()
}

fn kind_name(kind: PieceKind) -> String {
    kind.as_str().to_string()
}

fn state_name(state: GameState) -> String {
    state.as_str().to_string()
}

fn spawn_name(spawn: SpecialSpawn) -> String {
    match spawn {
        SpecialSpawn::LineBomb => PieceKind::LineBomb,
        SpecialSpawn::ColorBomb => PieceKind::ColorBomb,
    }
    .as_str()
    .to_string()
}

fn positions(list: &[Position]) -> Vec<WirePosition> {
    list.iter().copied().map(WirePosition::from).collect()
}

impl From<&CoreEvent> for WireEvent {
    fn from(value: &CoreEvent) -> Self {
        match value {
            CoreEvent::GameStateChanged { state } => WireEvent::GameStateChanged {
                state: state_name(*state),
            },
            CoreEvent::ChainResolved(chain) => WireEvent::ChainResolved {
                positions: positions(&chain.positions),
                bomb_color: chain.bomb_color.map(color_name),
                contains_color_bomb: chain.contains_color_bomb,
                spawn: chain.spawn.map(spawn_name),
            },
            CoreEvent::BombExploded(bomb) => WireEvent::BombExploded {
                position: bomb.position.into(),
                radius: bomb.radius,
            },
            CoreEvent::PieceSpawned {
                id,
                kind,
                color,
                position,
                from,
                to,
            } => WireEvent::PieceSpawned {
                id: *id,
                kind: kind_name(*kind),
                color: color.map(color_name),
                position: (*position).into(),
                from: (*from).into(),
                to: (*to).into(),
            },
            CoreEvent::PieceMoved {
                id,
                from,
                to,
                target,
            } => WireEvent::PieceMoved {
                id: *id,
                from: (*from).into(),
                to: (*to).into(),
                target: (*target).into(),
            },
            CoreEvent::PieceCleared { id, kind, position } => WireEvent::PieceCleared {
                id: *id,
                kind: kind_name(*kind),
                position: (*position).into(),
            },
            CoreEvent::GridShuffled => WireEvent::GridShuffled,
            CoreEvent::HintFound { path } => WireEvent::HintFound {
                path: positions(path),
            },
            CoreEvent::HintUnavailable => WireEvent::HintUnavailable,
            CoreEvent::LineStarted { color, anchor } => WireEvent::LineStarted {
                color: color_name(*color),
                anchor: (*anchor).into(),
            },
            CoreEvent::LineExtended { anchor } => WireEvent::LineExtended {
                anchor: (*anchor).into(),
            },
            CoreEvent::LineEnded => WireEvent::LineEnded,
        }
    }
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Err(e) => {
            // Unknown message type is not a hard parse error for the protocol.
            #[derive(Debug, Deserialize)]
            struct TypeOnly<'a> {
                #[serde(rename = "type")]
                #[serde(borrow)]
                msg_type: Option<&'a str>,
                seq: Option<u64>,
            }
            let head = serde_json::from_str::<TypeOnly>(json)?;
            match head.msg_type {
                Some("hello") | Some("command") => Err(e),
                _ => Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: head.seq.unwrap_or(0),
                })),
            }
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities::default(),
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        game_id: "dotlink".to_string(),
        actions: ActionName::ALL.to_vec(),
    }
}

/// Create an acknowledgment
pub fn create_ack(seq: u64) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Wrap a core event for the wire
pub fn create_event(seq: u64, event: &CoreEvent) -> EventMessage {
    EventMessage {
        msg_type: EventType::Event,
        seq,
        ts: current_timestamp_ms(),
        event: event.into(),
    }
}

/// Describe a session as an observation
pub fn create_observation(seq: u64, session: &dotlink_core::Session) -> ObservationMessage {
    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        state: state_name(session.game_state()),
        solvability: solvability_name(session.solvability()),
        dragging: session.is_dragging(),
        chain: positions(&session.drag_chain()),
        pending_refills: session.pending_refills(),
        grid: GridObservation::from(&session.snapshot()),
    }
}

fn solvability_name(value: Solvability) -> String {
    value.as_str().to_string()
}

/// Get current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
