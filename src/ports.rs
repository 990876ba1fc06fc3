//! Port traits — the boundary between the engines and the outside world.
//!
//! ```text
//!   bus adapter ──▶ ExpanderPort ──▶ IoBankService ──▶ engines
//!   engines ──▶ InputSink / OutputSink ──▶ host application
//! ```
//!
//! Sinks are invoked synchronously, on the caller's thread, in ascending
//! channel order, before `process` returns. A sink implementation must not
//! re-enter the engine that is calling it and must not block — a stalled
//! sink stalls the polling loop and therefore debounce timing for every
//! channel in the bank.

use crate::events::{InputEvent, OutputEvent};

/// Receives semantic input events from [`InputEngine`](crate::input::InputEngine).
pub trait InputSink {
    fn on_input_event(&mut self, event: &InputEvent);
}

/// Receives physical output transitions from
/// [`OutputEngine`](crate::output::OutputEngine).
pub trait OutputSink {
    fn on_output_event(&mut self, event: &OutputEvent);
}

// Closures work directly as sinks, which keeps test and host wiring light.
impl<F: FnMut(&InputEvent)> InputSink for F {
    fn on_input_event(&mut self, event: &InputEvent) {
        self(event);
    }
}

impl<F: FnMut(&OutputEvent)> OutputSink for F {
    fn on_output_event(&mut self, event: &OutputEvent) {
        self(event);
    }
}

/// The acquisition/drive black box: one 16-bit I/O expander.
///
/// The engines never perform I/O themselves; the service samples the bank
/// through this port once per poll and pushes accepted output transitions
/// back through it. Adapters wrap whatever bus the expander sits on
/// (I2C MCP23017, SPI MCP23S17, or an in-memory fake for host tests).
pub trait ExpanderPort {
    /// Sample all 16 pins as one word, bit `n` = channel `n`.
    fn read_word(&mut self) -> u16;

    /// Drive a single output pin.
    fn write_pin(&mut self, channel: u8, on: bool);
}
