//! iobank — event engines for a 16-channel digital I/O bank.
//!
//! Turns raw, periodically-sampled pin states from an MCP23017-class
//! expander into semantic events, and discrete commands into safe relay
//! transitions:
//!
//! - [`input::InputEngine`] — debounce, multi-click and hold detection,
//!   quadrature rotary decode, 4-wire security-loop classification.
//! - [`output::OutputEngine`] — command dispatch with interlock settling
//!   delays and timed auto-off.
//! - [`service::IoBankService`] — the poll-loop composition of both
//!   engines around an [`ports::ExpanderPort`].
//!
//! The engines do no I/O, allocate nothing in the hot path, and never
//! block: the host loop samples hardware, passes the word and its
//! millisecond clock to `process`, and receives events synchronously
//! through sink traits before the call returns.

pub mod config;
pub mod events;
pub mod input;
pub mod output;
pub mod ports;
pub mod service;

mod error;

pub use config::{BankConfig, InputChannelConfig, OutputChannelConfig};
pub use error::{Error, Result};
pub use events::{
    CHANNEL_COUNT, InputCode, InputEvent, InputType, OutputEvent, OutputState, OutputType,
};
pub use input::InputEngine;
pub use output::OutputEngine;
pub use ports::{ExpanderPort, InputSink, OutputSink};
pub use service::{Command, IoBankService};
