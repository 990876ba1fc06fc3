//! Output control engine — command dispatch with interlocks and timers.
//!
//! Commands arrive as `(request id, channel, state)` triples; the host
//! loop additionally calls [`OutputEngine::process`] every iteration to
//! advance pending delays. Three concerns sit on top of the bare relay
//! word:
//!
//! - **Idempotence** — a transition only reports (and only counts) when
//!   the requested state differs from the current one.
//! - **Interlocks** — two channels configured as partners can never be on
//!   together. Activating one forces the other off first and, if that
//!   actually switched something, delays the activation so physical
//!   contacts settle (500 ms relay, 2000 ms motor).
//! - **Timers** — a TIMER channel switched on schedules its own off after
//!   the configured duration; switching it off cancels the schedule.
//!
//! Elapsed time uses the same wrapping-delta bookkeeping as the input
//! engine, so the caller's u32 millisecond clock may wrap freely.

use log::debug;

use crate::error::{Error, Result};
use crate::events::{CHANNEL_COUNT, OutputEvent, OutputState, OutputType};
use crate::ports::OutputSink;

/// Settling delay between an interlocked deactivation and activation.
const RELAY_INTERLOCK_DELAY_MS: u32 = 500;
const MOTOR_INTERLOCK_DELAY_MS: u32 = 2000;

/// Default auto-off duration for TIMER channels.
pub const DEFAULT_TIMER_SECS: u16 = 60;

/// Request ids ride through delayed transitions in a 6-bit field.
const MAX_REQUEST_ID: u8 = 63;

#[derive(Debug, Clone, Copy)]
struct Channel {
    ty: OutputType,
    /// Interlocked partner channel; self means no interlock.
    interlock: u8,
    timer_secs: u16,
    current: OutputState,
    /// State to apply when the pending delay expires.
    next: OutputState,
    /// Request id to report the delayed transition under.
    pending_id: u8,
    /// Milliseconds since the delay was armed; reset when armed.
    elapsed_ms: u32,
    /// Outstanding delay in milliseconds; 0 = nothing pending.
    delay_ms: u32,
}

impl Channel {
    fn new(index: u8, ty: OutputType) -> Self {
        Self {
            ty,
            interlock: index,
            timer_secs: DEFAULT_TIMER_SECS,
            current: OutputState::Off,
            next: OutputState::Off,
            pending_id: 0,
            elapsed_ms: 0,
            delay_ms: 0,
        }
    }
}

/// The output control engine for one bank of 16 channels.
pub struct OutputEngine {
    channels: [Channel; CHANNEL_COUNT],
    last_update_ms: u32,
    primed: bool,
}

impl Default for OutputEngine {
    fn default() -> Self {
        Self::new(OutputType::Relay)
    }
}

impl OutputEngine {
    /// Create an engine with every channel set to `default_type`, off,
    /// un-interlocked, and with the default timer duration.
    pub fn new(default_type: OutputType) -> Self {
        Self {
            channels: core::array::from_fn(|i| Channel::new(i as u8, default_type)),
            last_update_ms: 0,
            primed: false,
        }
    }

    // ── Configuration ─────────────────────────────────────────────

    pub fn get_type(&self, channel: u8) -> Result<OutputType> {
        Ok(self.channel(channel)?.ty)
    }

    /// Set a channel's type and clear its delay bookkeeping so a pending
    /// transition configured under the old semantics cannot fire.
    pub fn set_type(&mut self, channel: u8, ty: OutputType) -> Result<()> {
        let ch = self.channel_mut(channel)?;
        ch.ty = ty;
        ch.elapsed_ms = 0;
        ch.delay_ms = 0;
        Ok(())
    }

    pub fn get_interlock(&self, channel: u8) -> Result<u8> {
        Ok(self.channel(channel)?.interlock)
    }

    /// Link a channel to an interlock partner. Passing the channel's own
    /// index removes the interlock.
    pub fn set_interlock(&mut self, channel: u8, partner: u8) -> Result<()> {
        if usize::from(partner) >= CHANNEL_COUNT {
            return Err(Error::InvalidChannel(partner));
        }
        self.channel_mut(channel)?.interlock = partner;
        Ok(())
    }

    pub fn get_timer(&self, channel: u8) -> Result<u16> {
        Ok(self.channel(channel)?.timer_secs)
    }

    /// Set the auto-off duration for a TIMER channel, in seconds.
    pub fn set_timer(&mut self, channel: u8, secs: u16) -> Result<()> {
        if secs == 0 {
            return Err(Error::Config("timer duration must be non-zero"));
        }
        self.channel_mut(channel)?.timer_secs = secs;
        Ok(())
    }

    /// Current physical state of a channel.
    pub fn state(&self, channel: u8) -> Result<OutputState> {
        Ok(self.channel(channel)?.current)
    }

    // ── Commands ──────────────────────────────────────────────────

    /// Dispatch one command. Any resulting transition is reported through
    /// `sink` before returning; transitions deferred by an interlock delay
    /// are reported from a later [`process`](Self::process) call instead.
    pub fn handle_command<S: OutputSink>(
        &mut self,
        id: u8,
        channel: u8,
        command: OutputState,
        sink: &mut S,
    ) -> Result<()> {
        if id > MAX_REQUEST_ID {
            return Err(Error::InvalidRequestId(id));
        }
        let ch = self.channel(channel)?;
        let ty = ch.ty;
        let partner = ch.interlock;

        if ty == OutputType::Timer {
            self.apply(id, channel, command, sink);
            let ch = &mut self.channels[usize::from(channel)];
            if command == OutputState::On {
                // Schedule the automatic off.
                let duration_ms = u32::from(ch.timer_secs) * 1000;
                Self::arm_delay(ch, id, OutputState::Off, duration_ms);
            } else {
                // An explicit off cancels any pending auto-off.
                ch.delay_ms = 0;
            }
            return Ok(());
        }

        if partner != channel && command == OutputState::On {
            // Force the partner off before activating; only delay if that
            // actually switched contacts that now need to settle.
            if self.apply(id, partner, OutputState::Off, sink) {
                let delay = interlock_delay_ms(ty);
                let ch = &mut self.channels[usize::from(channel)];
                Self::arm_delay(ch, id, OutputState::On, delay);
                return Ok(());
            }
        }

        self.apply(id, channel, command, sink);
        // A fresh command overwrites any pending delayed transition.
        self.channels[usize::from(channel)].delay_ms = 0;
        Ok(())
    }

    /// Advance pending delays and timers. Call once per host loop
    /// iteration with the monotonic millisecond clock.
    pub fn process<S: OutputSink>(&mut self, now_ms: u32, sink: &mut S) {
        let delta = if self.primed {
            now_ms.wrapping_sub(self.last_update_ms)
        } else {
            0
        };
        self.primed = true;
        self.last_update_ms = now_ms;

        for i in 0..CHANNEL_COUNT {
            let ch = &mut self.channels[i];
            ch.elapsed_ms = ch.elapsed_ms.wrapping_add(delta);

            if ch.delay_ms > 0 && ch.elapsed_ms > ch.delay_ms {
                let id = ch.pending_id;
                let next = ch.next;
                ch.delay_ms = 0;
                self.apply(id, i as u8, next, sink);
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────────

    fn channel(&self, channel: u8) -> Result<&Channel> {
        self.channels
            .get(usize::from(channel))
            .ok_or(Error::InvalidChannel(channel))
    }

    fn channel_mut(&mut self, channel: u8) -> Result<&mut Channel> {
        self.channels
            .get_mut(usize::from(channel))
            .ok_or(Error::InvalidChannel(channel))
    }

    /// Apply a state to a channel, reporting through `sink` only when the
    /// physical state actually changes. Returns whether it did.
    ///
    /// Activation of an interlocked channel whose partner is currently on
    /// is refused outright — interlocked pairs can never be on together,
    /// not even through a stale delayed transition.
    fn apply<S: OutputSink>(
        &mut self,
        id: u8,
        channel: u8,
        state: OutputState,
        sink: &mut S,
    ) -> bool {
        let idx = usize::from(channel);
        let ch = &self.channels[idx];

        if ch.current == state {
            return false;
        }

        let partner = ch.interlock;
        if partner != channel
            && state == OutputState::On
            && self.channels[usize::from(partner)].current == OutputState::On
        {
            return false;
        }

        let ty = ch.ty;
        debug!(
            "output transition: ch={} type={:?} state={:?} id={}",
            channel, ty, state, id
        );
        sink.on_output_event(&OutputEvent {
            id,
            channel,
            channel_type: ty,
            state,
        });
        self.channels[idx].current = state;
        true
    }

    fn arm_delay(ch: &mut Channel, id: u8, next: OutputState, delay_ms: u32) {
        ch.elapsed_ms = 0;
        ch.delay_ms = delay_ms;
        ch.pending_id = id;
        ch.next = next;
    }
}

fn interlock_delay_ms(ty: OutputType) -> u32 {
    match ty {
        OutputType::Motor => MOTOR_INTERLOCK_DELAY_MS,
        _ => RELAY_INTERLOCK_DELAY_MS,
    }
}
