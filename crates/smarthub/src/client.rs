//! `HubClient` builder and session loop.
//!
//! This is the entry point for running a hub session. It ties together all
//! the layers: transport → protocol → registry → automation, with every
//! exchange timed by the hub's own virtual clock.

use std::collections::VecDeque;
use std::convert::Infallible;

use smarthub_automation::{AutomationEngine, SetStatusCommand};
use smarthub_protocol::{Address, Command, DeviceType, PacketEncoder, Payload, decode_response};
use smarthub_registry::{Device, DeviceRegistry};
use smarthub_transport::{STATUS_NO_CONTENT, STATUS_OK, Transport, TransportError};
use tracing::{debug, info, trace, warn};

use crate::round::{IDLE_BODY, Round, RoundOutcome};
use crate::{HubConfig, HubError};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Running counters for a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Completed polling rounds.
    pub rounds: u64,
    /// Individual request/response exchanges.
    pub exchanges: u64,
    /// Payloads decoded from responses.
    pub payloads: u64,
    /// Records dropped for a bad checksum.
    pub corrupt_records: u64,
    /// Records that passed the checksum but not the grammar.
    pub undecodable_records: u64,
    /// Responses that weren't valid Base64 at all.
    pub invalid_responses: u64,
    /// `SetStatus` commands sent.
    pub commands_sent: u64,
    /// Devices removed for not answering.
    pub evictions: u64,
    /// Most recent hub timestamp seen.
    pub latest_tick: Option<u64>,
}

/// What a session looked like when the hub ended it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub stats: SessionStats,
    /// Devices still registered at the end.
    pub devices: usize,
}

/// Why the driver stopped.
enum Halt {
    /// The hub answered 204.
    Finished,
    Fatal(HubError),
}

impl From<HubError> for Halt {
    fn from(err: HubError) -> Self {
        Self::Fatal(err)
    }
}

impl From<TransportError> for Halt {
    fn from(err: TransportError) -> Self {
        Self::Fatal(err.into())
    }
}

impl From<smarthub_protocol::ProtocolError> for Halt {
    fn from(err: smarthub_protocol::ProtocolError) -> Self {
        Self::Fatal(err.into())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`HubClient`].
///
/// # Example
///
/// ```rust,ignore
/// let transport = HttpTransport::new("http://localhost:9998")?;
/// let mut client = HubClientBuilder::new(parse_hub_address("ef0")?)
///     .config(HubConfig::default())
///     .build(transport);
/// let summary = client.run().await?;
/// ```
#[derive(Debug, Clone)]
pub struct HubClientBuilder {
    address: Address,
    config: HubConfig,
}

impl HubClientBuilder {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            config: HubConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the name the client announces.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the virtual-time window per round, in hub milliseconds.
    pub fn window_ms(mut self, window_ms: u64) -> Self {
        self.config.window.window_ms = window_ms;
        self
    }

    pub fn build<T: Transport>(self, transport: T) -> HubClient<T> {
        HubClient::new(transport, self.address, self.config)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A hub session: discovery, status polling and automation over one
/// [`Transport`].
pub struct HubClient<T: Transport> {
    transport: T,
    config: HubConfig,
    encoder: PacketEncoder,
    registry: DeviceRegistry,
    engine: AutomationEngine,
    /// Records waiting to be dispatched, oldest first.
    queue: VecDeque<Payload>,
    stats: SessionStats,
}

impl<T: Transport> HubClient<T> {
    pub fn new(transport: T, address: Address, config: HubConfig) -> Self {
        let config = HubConfig {
            window: config.window.validated(),
            ..config
        };
        Self {
            transport,
            encoder: PacketEncoder::new(address, config.name.clone()),
            config,
            registry: DeviceRegistry::new(),
            engine: AutomationEngine::new(),
            queue: VecDeque::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.encoder.src()
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs the session until the hub ends it.
    ///
    /// Returns `Ok` when the hub answers 204. Any other non-200 status, or
    /// a failed exchange, ends the session with an error. Nothing is
    /// retried.
    pub async fn run(&mut self) -> Result<SessionSummary, HubError> {
        info!(
            address = %self.address(),
            name = %self.config.name,
            window_ms = self.config.window.window_ms,
            "hub session starting"
        );

        let halt = match self.drive().await {
            Ok(never) => match never {},
            Err(halt) => halt,
        };

        match halt {
            Halt::Finished => {
                info!(
                    devices = self.registry.len(),
                    rounds = self.stats.rounds,
                    commands = self.stats.commands_sent,
                    evictions = self.stats.evictions,
                    "hub ended the session"
                );
                Ok(SessionSummary {
                    stats: self.stats.clone(),
                    devices: self.registry.len(),
                })
            }
            Halt::Fatal(err) => {
                warn!(error = %err, rounds = self.stats.rounds, "hub session failed");
                Err(err)
            }
        }
    }

    // -- Phases --------------------------------------------------------------

    async fn drive(&mut self) -> Result<Infallible, Halt> {
        self.discover().await?;
        self.pull_initial_status().await?;

        loop {
            if self.queue.is_empty() {
                let outcome = self.round(IDLE_BODY).await?;
                self.enqueue(outcome.records);
            }

            while let Some(payload) = self.queue.pop_front() {
                self.dispatch(payload).await?;
            }
        }
    }

    /// Broadcasts `WhoIsHere` and registers everyone who answers.
    async fn discover(&mut self) -> Result<(), Halt> {
        let packet = self.encoder.who_is_here()?;
        let outcome = self.round(&packet).await?;

        let mut deferred = Vec::new();
        for payload in outcome.records {
            if payload.cmd == Command::IAmHere {
                self.register(&payload);
            } else {
                deferred.push(payload);
            }
        }
        self.enqueue(deferred);

        info!(devices = self.registry.len(), "discovery complete");
        Ok(())
    }

    /// Asks every known device for its state once, queueing whatever comes
    /// back.
    async fn pull_initial_status(&mut self) -> Result<(), Halt> {
        for address in self.registry.addresses() {
            let Some(dev_type) = self.registry.get(address).map(|d| d.dev_type) else {
                continue;
            };
            let packet = self.encoder.get_status(address, dev_type)?;
            let outcome = self.round(&packet).await?;
            self.enqueue(outcome.records);
        }
        Ok(())
    }

    // -- Dispatch ------------------------------------------------------------

    async fn dispatch(&mut self, payload: Payload) -> Result<(), Halt> {
        match payload.cmd {
            Command::WhoIsHere => self.on_who_is_here(&payload).await,
            Command::Status => self.on_status(&payload).await,
            cmd => {
                trace!(src = %payload.src, %cmd, "ignoring queued record");
                Ok(())
            }
        }
    }

    /// A device joined: register it, answer, then check it's alive.
    async fn on_who_is_here(&mut self, payload: &Payload) -> Result<(), Halt> {
        let Some(device) = self.register(payload) else {
            return Ok(());
        };

        let packet = self.encoder.i_am_here()?;
        let outcome = self.round(&packet).await?;
        self.enqueue(outcome.records);

        if device.dev_type == DeviceType::Timer {
            return Ok(());
        }

        let packet = self.encoder.get_status(device.address, device.dev_type)?;
        self.send_and_confirm(device.address, &packet).await
    }

    /// Runs automation for a status report and sends what it plans.
    async fn on_status(&mut self, payload: &Payload) -> Result<(), Halt> {
        let commands = self.engine.plan(&self.registry, payload);
        if !commands.is_empty() {
            debug!(src = %payload.src, commands = commands.len(), "automation planned commands");
        }

        for command in commands {
            self.send_command(command).await?;
        }
        Ok(())
    }

    async fn send_command(&mut self, command: SetStatusCommand) -> Result<(), Halt> {
        // An earlier command from the same plan may have evicted this target.
        if !self.registry.contains(command.address) {
            debug!(
                address = %command.address,
                target = %command.target,
                "target evicted before command was sent"
            );
            return Ok(());
        }

        info!(
            address = %command.address,
            target = %command.target,
            on = command.on,
            reason = %command.reason,
            "setting device status"
        );
        let packet = self
            .encoder
            .set_status(command.address, command.dev_type, command.on)?;
        self.stats.commands_sent += 1;
        self.send_and_confirm(command.address, &packet).await
    }

    /// Sends `packet` and evicts `target` unless it reports its status
    /// before the round's window closes.
    async fn send_and_confirm(&mut self, target: Address, packet: &str) -> Result<(), Halt> {
        let outcome = self.round(packet).await?;
        let (answered, rest) = outcome.take_answer(target);
        self.enqueue(rest);

        if !answered {
            if let Some(device) = self.registry.remove(target) {
                self.stats.evictions += 1;
                info!(address = %target, name = %device.name, "device did not answer, evicted");
            }
        }
        Ok(())
    }

    // -- Plumbing ------------------------------------------------------------

    /// Runs one polling round and turns its final status into control flow.
    async fn round(&mut self, first: &str) -> Result<RoundOutcome, Halt> {
        let mut round = Round::new(self.config.window.clone());

        while !round.is_complete() {
            let response = self.transport.post(round.body(first)).await?;
            self.stats.exchanges += 1;
            let payloads = self.decode(response.body.as_deref());
            round.absorb(response.status, payloads);
        }

        let outcome = round.finish();
        self.stats.rounds += 1;
        if outcome.latest_tick.is_some() {
            self.stats.latest_tick = outcome.latest_tick;
        }
        trace!(
            status = outcome.status,
            exchanges = outcome.exchanges,
            elapsed = ?outcome.elapsed,
            records = outcome.records.len(),
            "round complete"
        );

        match outcome.status {
            STATUS_OK => Ok(outcome),
            STATUS_NO_CONTENT => Err(Halt::Finished),
            status => Err(Halt::Fatal(HubError::Terminated { status })),
        }
    }

    /// Decodes one response line. Garbage is logged and treated as empty.
    fn decode(&mut self, body: Option<&str>) -> Vec<Payload> {
        let Some(text) = body else {
            return Vec::new();
        };

        let decoded = match decode_response(text) {
            Ok(decoded) => decoded,
            Err(error) => {
                self.stats.invalid_responses += 1;
                warn!(%error, len = text.len(), "response is not a valid packet, ignoring");
                return Vec::new();
            }
        };
        self.stats.corrupt_records += decoded.corrupt as u64;
        self.stats.undecodable_records += decoded.undecodable as u64;
        self.stats.payloads += decoded.payloads.len() as u64;
        decoded.payloads
    }

    /// Adds records to the back of the work queue. Ticks are dropped; they
    /// have already done their job in the round that carried them.
    fn enqueue(&mut self, records: Vec<Payload>) {
        self.queue
            .extend(records.into_iter().filter(|p| p.cmd != Command::Tick));
    }

    /// Upserts the device announced by `payload`, returning a copy.
    fn register(&mut self, payload: &Payload) -> Option<Device> {
        let Some(device) = Device::from_announce(payload) else {
            debug!(src = %payload.src, dev_type = %payload.dev_type, "announcement without a body, skipping");
            return None;
        };
        self.registry.upsert(device.clone());
        Some(device)
    }
}
