//! One polling round: send a request, then keep polling until the hub's
//! virtual clock says enough time has passed.
//!
//! ```text
//!   Sending ──(first 200)──→ AwaitingFirstTick ──(tick)──→ Accumulating
//!      │                           │                           │
//!      │                           └─────(non-200)─────┐       │ (elapsed ≥ window
//!      └──────────────(non-200)────────────────────────┤       │  or non-200)
//!                                                      ▼       ▼
//!                                                      Complete
//! ```
//!
//! [`Round`] is pure bookkeeping; the controller does the I/O and feeds it
//! each response.

use smarthub_protocol::{Address, Command, Payload};
use smarthub_tick::{ResponseWindow, WindowConfig, WindowState};
use smarthub_transport::STATUS_OK;

/// Body sent on every exchange after the first in a round.
pub const IDLE_BODY: &str = " ";

/// Where a round is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// Nothing sent yet.
    Sending,
    /// Polling, but no tick has arrived so the clock hasn't started.
    AwaitingFirstTick,
    /// Polling with the clock running.
    Accumulating,
    /// Window closed or the hub answered non-200. Stop polling.
    Complete,
}

/// Accumulates responses for one round.
#[derive(Debug)]
pub struct Round {
    window: ResponseWindow,
    /// The latest first-tick-of-a-response.
    tick: Option<Payload>,
    /// Every other record, in delivery order.
    records: Vec<Payload>,
    exchanges: u32,
    status: Option<u16>,
}

impl Round {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            window: ResponseWindow::new(config),
            tick: None,
            records: Vec::new(),
            exchanges: 0,
            status: None,
        }
    }

    /// The body for the next exchange: `first` once, then [`IDLE_BODY`].
    pub fn body<'a>(&self, first: &'a str) -> &'a str {
        if self.exchanges == 0 { first } else { IDLE_BODY }
    }

    /// Records one exchange's status and decoded payloads.
    ///
    /// The first `Tick` in `payloads` replaces the round's tick slot and
    /// advances the clock. Everything else (including any further ticks) is
    /// appended. A response without a tick leaves the clock where it was.
    pub fn absorb(&mut self, status: u16, payloads: Vec<Payload>) -> RoundState {
        self.exchanges += 1;
        self.status = Some(status);

        let mut first_tick = None;
        for payload in payloads {
            if first_tick.is_none() {
                if let Some(timestamp) = payload.tick_timestamp() {
                    first_tick = Some(timestamp);
                    self.tick = Some(payload);
                    continue;
                }
            }
            self.records.push(payload);
        }

        if let Some(timestamp) = first_tick {
            self.window.observe(timestamp);
        }

        self.state()
    }

    pub fn state(&self) -> RoundState {
        match self.status {
            None => RoundState::Sending,
            Some(status) if status != STATUS_OK => RoundState::Complete,
            Some(_) => match self.window.state() {
                WindowState::AwaitingFirstTick => RoundState::AwaitingFirstTick,
                WindowState::Accumulating { .. } => RoundState::Accumulating,
                WindowState::Closed { .. } => RoundState::Complete,
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state() == RoundState::Complete
    }

    pub fn exchanges(&self) -> u32 {
        self.exchanges
    }

    /// Consumes the round.
    pub fn finish(self) -> RoundOutcome {
        RoundOutcome {
            status: self.status.unwrap_or(STATUS_OK),
            latest_tick: self.tick.as_ref().and_then(Payload::tick_timestamp),
            elapsed: self.window.elapsed(),
            records: self.records,
            exchanges: self.exchanges,
        }
    }
}

/// What a finished round produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Status of the last exchange.
    pub status: u16,
    /// Timestamp in the tick slot when the round ended.
    pub latest_tick: Option<u64>,
    /// Virtual time covered by the round.
    pub elapsed: Option<u64>,
    /// Non-tick-slot records in delivery order.
    pub records: Vec<Payload>,
    pub exchanges: u32,
}

impl RoundOutcome {
    /// Splits the records into "did `target` answer?" and everything else.
    ///
    /// An answer is a `Status` from `target`. Answers are consumed; all
    /// other records are returned in order for the work queue.
    pub fn take_answer(self, target: Address) -> (bool, Vec<Payload>) {
        let mut answered = false;
        let mut rest = Vec::with_capacity(self.records.len());
        for payload in self.records {
            if payload.is_status_from(target) {
                answered = true;
            } else {
                rest.push(payload);
            }
        }
        (answered, rest)
    }
}
