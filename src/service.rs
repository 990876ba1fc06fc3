//! Poll-loop glue: one expander, both engines, one command queue.
//!
//! The service is the composition a host firmware actually runs:
//!
//! ```text
//!   loop {
//!       service.submit(..)?;           // from RPC / MQTT / UI, as needed
//!       service.poll(now_ms, &mut input_sink, &mut output_sink);
//!   }
//! ```
//!
//! Each poll samples the expander word, runs the input engine over it,
//! drains queued output commands, advances output delays, and drives
//! every accepted transition back out through the expander port. Wiring
//! input events to output commands is deliberately left to the host —
//! the sinks give it everything it needs.

use heapless::Deque;
use log::warn;

use crate::config::BankConfig;
use crate::error::{Error, Result};
use crate::events::{CHANNEL_COUNT, OutputEvent, OutputState};
use crate::input::InputEngine;
use crate::output::OutputEngine;
use crate::ports::{ExpanderPort, InputSink, OutputSink};

/// Commands waiting for the next poll. Sized for a burst of one command
/// per channel.
const COMMAND_QUEUE_CAP: usize = CHANNEL_COUNT;

/// Worst-case transitions in one poll: each drained command applies at
/// most one transition, and each channel's pending delay or timer can
/// expire at most once.
const POLL_EVENT_CAP: usize = COMMAND_QUEUE_CAP + CHANNEL_COUNT;

/// One queued output command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub id: u8,
    pub channel: u8,
    pub state: OutputState,
}

/// One I/O bank: expander port, input engine, output engine.
pub struct IoBankService<P: ExpanderPort> {
    expander: P,
    input: InputEngine,
    output: OutputEngine,
    commands: Deque<Command, COMMAND_QUEUE_CAP>,
}

impl<P: ExpanderPort> IoBankService<P> {
    /// Build a service around `expander` with `config` applied.
    pub fn new(expander: P, config: &BankConfig) -> Result<Self> {
        let mut input = InputEngine::default();
        let mut output = OutputEngine::default();
        config.apply_to(&mut input, &mut output)?;
        Ok(Self {
            expander,
            input,
            output,
            commands: Deque::new(),
        })
    }

    /// Queue an output command for the next poll.
    pub fn submit(&mut self, command: Command) -> Result<()> {
        self.commands.push_back(command).map_err(|_| {
            warn!("command queue full, dropping command for ch={}", command.channel);
            Error::QueueFull
        })
    }

    /// Run one loop iteration: sample, detect input events, dispatch
    /// queued commands, advance delays, and drive accepted transitions
    /// out through the expander.
    pub fn poll<I: InputSink, O: OutputSink>(
        &mut self,
        correlation_id: u8,
        now_ms: u32,
        input_sink: &mut I,
        output_sink: &mut O,
    ) {
        let word = self.expander.read_word();
        self.input.process(correlation_id, word, now_ms, input_sink);

        // Collect transitions first; the expander and the engine cannot be
        // borrowed inside the same sink call. `POLL_EVENT_CAP` covers the
        // worst case, so no transition is ever dropped here.
        let mut fired: heapless::Vec<OutputEvent, POLL_EVENT_CAP> = heapless::Vec::new();
        {
            let mut collect = |e: &OutputEvent| {
                // Cannot overflow: capacity matches the per-poll bound.
                let _ = fired.push(*e);
            };

            while let Some(cmd) = self.commands.pop_front() {
                if let Err(err) =
                    self.output
                        .handle_command(cmd.id, cmd.channel, cmd.state, &mut collect)
                {
                    warn!("rejected command for ch={}: {err}", cmd.channel);
                }
            }
            self.output.process(now_ms, &mut collect);
        }

        for event in &fired {
            self.expander.write_pin(event.channel, event.state.is_on());
            output_sink.on_output_event(event);
        }
    }

    /// Re-announce the stable state of every input channel, e.g. after a
    /// host reconnect.
    pub fn announce<I: InputSink>(&self, id: u8, sink: &mut I) {
        self.input.query_all(id, sink);
    }

    /// Direct access for reconfiguration between polls.
    pub fn input_mut(&mut self) -> &mut InputEngine {
        &mut self.input
    }

    pub fn output_mut(&mut self) -> &mut OutputEngine {
        &mut self.output
    }
}
