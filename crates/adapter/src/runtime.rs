//! Adapter runtime integration.
//!
//! Bridges the sync game loop with the async TCP server.

use anyhow::Context;
use log::{info, warn};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::protocol::{
    create_ack, create_event, create_observation, AckMessage, ErrorMessage, EventMessage,
    ObservationMessage,
};
use crate::server::{run_server, ServerConfig, ServerState};
use crate::types::{Command, CoreEvent};
use dotlink_core::{EventSink, Session};

/// Command delivered to the game loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundPayload {
    Command(ClientCommand),
    /// Sent on behalf of a client that asked for observations in its hello
    SnapshotRequest,
}

/// Command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    Core(Command),
    Snapshot,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClientAck { client_id: usize, ack: AckMessage },
    ToClientError { client_id: usize, err: ErrorMessage },
    ToClientObservation { client_id: usize, obs: ObservationMessage },
    BroadcastObservation { obs: ObservationMessage },
    BroadcastEvent { event: EventMessage },
}

/// Event sink that streams core events to subscribed clients
#[derive(Debug, Clone)]
pub struct EventForwarder {
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    next_seq: u64,
}

impl EventForwarder {
    pub fn new(out_tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self { out_tx, next_seq: 1 }
    }

    /// Next outbound sequence number
    pub fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl EventSink for EventForwarder {
    fn emit(&mut self, event: CoreEvent) {
        let seq = self.next_seq();
        let _ = self.out_tx.send(OutboundMessage::BroadcastEvent {
            event: create_event(seq, &event),
        });
    }
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    events: EventForwarder,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns `Ok(None)` if `DOTLINK_AI_DISABLED` is set.
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        if ServerState::is_disabled() {
            info!("adapter disabled via DOTLINK_AI_DISABLED");
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()).map(Some)
    }

    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

        let rt = Runtime::new().context("failed to create tokio runtime")?;
        rt.spawn(async move {
            if let Err(e) = run_server(config, cmd_tx, out_rx, None).await {
                warn!("adapter server stopped: {e:#}");
            }
        });

        Ok(Self {
            _rt: rt,
            cmd_rx,
            events: EventForwarder::new(out_tx.clone()),
            out_tx,
        })
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    /// Sink for session events
    pub fn events(&mut self) -> &mut EventForwarder {
        &mut self.events
    }

    /// Apply one inbound command to `session` and answer its sender
    pub fn dispatch(&mut self, session: &mut Session, inbound: InboundCommand) {
        apply_inbound(session, inbound, &mut self.events, &self.out_tx);
    }
}

/// Apply one inbound command, then ack and broadcast the resulting observation
///
/// Shared by the threaded `Adapter` and async hosts that own the channels.
pub fn apply_inbound(
    session: &mut Session,
    inbound: InboundCommand,
    events: &mut EventForwarder,
    out_tx: &mpsc::UnboundedSender<OutboundMessage>,
) {
    let client_id = inbound.client_id;
    match inbound.payload {
        InboundPayload::SnapshotRequest | InboundPayload::Command(ClientCommand::Snapshot) => {
            let obs = create_observation(events.next_seq(), session);
            let _ = out_tx.send(OutboundMessage::ToClientObservation { client_id, obs });
            if matches!(inbound.payload, InboundPayload::Command(_)) {
                let _ = out_tx.send(OutboundMessage::ToClientAck {
                    client_id,
                    ack: create_ack(inbound.seq),
                });
            }
        }
        InboundPayload::Command(ClientCommand::Core(command)) => {
            session.apply(command, events);
            let _ = out_tx.send(OutboundMessage::ToClientAck {
                client_id,
                ack: create_ack(inbound.seq),
            });
            let obs = create_observation(events.next_seq(), session);
            let _ = out_tx.send(OutboundMessage::BroadcastObservation { obs });
        }
    }
}
