//! Unified error types for the I/O bank engines.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! host control loop's error handling uniform. All variants are `Copy` so
//! they can be cheaply passed around without allocation.
//!
//! Out-of-range channel and request ids are hard errors here. Silently
//! masking indices into range hides wiring mistakes until hardware
//! misbehaves, so every public entry point validates instead.

use core::fmt;

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Channel index is outside `0..CHANNEL_COUNT`.
    InvalidChannel(u8),
    /// Request/correlation id exceeds the 6-bit range carried through
    /// delayed transitions.
    InvalidRequestId(u8),
    /// Configuration is invalid; the message names the offending field.
    Config(&'static str),
    /// The service command queue is full; the command was not accepted.
    QueueFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChannel(ch) => write!(f, "invalid channel: {ch}"),
            Self::InvalidRequestId(id) => write!(f, "invalid request id: {id}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::QueueFull => write!(f, "command queue full"),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_channel() {
        let msg = format!("{}", Error::InvalidChannel(42));
        assert!(msg.contains("42"));
    }

    #[test]
    fn errors_are_copy() {
        let e = Error::QueueFull;
        let e2 = e;
        assert_eq!(e, e2);
    }
}
