//! Bank configuration.
//!
//! One [`BankConfig`] describes both engines for a 16-channel bank. A
//! host loads it from whatever storage it has (NVS blob, provisioning
//! JSON), validates it, and pushes it into the engines through the public
//! setters via [`BankConfig::apply_to`]. The engines themselves never
//! touch storage, and nothing here persists across restarts.
//!
//! Validation rejects invalid values outright rather than clamping —
//! silently "fixing" a miswired interlock partner is how relays end up
//! fighting each other.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::events::{CHANNEL_COUNT, InputType, OutputType};
use crate::input::InputEngine;
use crate::output::{DEFAULT_TIMER_SECS, OutputEngine};

/// Configuration for one input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputChannelConfig {
    #[serde(rename = "type")]
    pub channel_type: InputType,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl Default for InputChannelConfig {
    fn default() -> Self {
        Self {
            channel_type: InputType::Switch,
            invert: false,
            disabled: false,
        }
    }
}

/// Configuration for one output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChannelConfig {
    #[serde(rename = "type")]
    pub channel_type: OutputType,
    /// Interlocked partner; the channel's own index means no interlock.
    pub interlock: u8,
    /// Auto-off duration in seconds, used by TIMER channels.
    pub timer_secs: u16,
}

/// Full configuration for one I/O bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankConfig {
    pub inputs: [InputChannelConfig; CHANNEL_COUNT],
    pub outputs: [OutputChannelConfig; CHANNEL_COUNT],
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            inputs: [InputChannelConfig::default(); CHANNEL_COUNT],
            outputs: core::array::from_fn(|i| OutputChannelConfig {
                channel_type: OutputType::Relay,
                interlock: i as u8,
                timer_secs: DEFAULT_TIMER_SECS,
            }),
        }
    }
}

impl BankConfig {
    /// Check cross-channel consistency. Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        // Disabled channels still count: the engine groups by type alone
        // so a disabled member freezes its pair or loop without shifting
        // later groups.
        let rotary = self
            .inputs
            .iter()
            .filter(|c| c.channel_type == InputType::Rotary)
            .count();
        if rotary % 2 != 0 {
            return Err(Error::Config("rotary channels must come in pairs"));
        }

        let security = self
            .inputs
            .iter()
            .filter(|c| c.channel_type == InputType::Security)
            .count();
        if security % 4 != 0 {
            return Err(Error::Config("security channels must come in groups of four"));
        }

        for out in &self.outputs {
            if usize::from(out.interlock) >= CHANNEL_COUNT {
                return Err(Error::Config("interlock partner out of range"));
            }
            if out.timer_secs == 0 {
                return Err(Error::Config("timer duration must be non-zero"));
            }
        }

        Ok(())
    }

    /// Validate and push this configuration into both engines.
    pub fn apply_to(&self, input: &mut InputEngine, output: &mut OutputEngine) -> Result<()> {
        self.validate()?;

        for (i, cfg) in self.inputs.iter().enumerate() {
            let ch = i as u8;
            input.set_type(ch, cfg.channel_type)?;
            input.set_invert(ch, cfg.invert)?;
            input.set_disabled(ch, cfg.disabled)?;
        }
        for (i, cfg) in self.outputs.iter().enumerate() {
            let ch = i as u8;
            output.set_type(ch, cfg.channel_type)?;
            output.set_interlock(ch, cfg.interlock)?;
            output.set_timer(ch, cfg.timer_secs)?;
        }

        log::info!("bank configuration applied");
        Ok(())
    }

    /// Serialise for provisioning transports.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|_| Error::Config("JSON encode failed"))
    }

    /// Parse a provisioning payload. The result still needs `validate`.
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|_| Error::Config("JSON decode failed"))
    }

    /// Serialise as a compact blob for NVS-style storage.
    pub fn to_postcard(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::Config("blob encode failed"))
    }

    /// Decode an NVS-style blob. The result still needs `validate`.
    pub fn from_postcard(blob: &[u8]) -> Result<Self> {
        postcard::from_bytes(blob).map_err(|_| Error::Config("blob decode failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{InputEvent, OutputState};

    #[test]
    fn default_config_is_valid() {
        let cfg = BankConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.inputs[0].channel_type, InputType::Switch);
        assert_eq!(cfg.outputs[5].interlock, 5);
        assert_eq!(cfg.outputs[0].timer_secs, DEFAULT_TIMER_SECS);
    }

    #[test]
    fn odd_rotary_count_is_rejected() {
        let mut cfg = BankConfig::default();
        cfg.inputs[0].channel_type = InputType::Rotary;
        assert_eq!(
            cfg.validate(),
            Err(Error::Config("rotary channels must come in pairs"))
        );

        cfg.inputs[1].channel_type = InputType::Rotary;
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_security_group_is_rejected() {
        let mut cfg = BankConfig::default();
        for ch in 0..3 {
            cfg.inputs[ch].channel_type = InputType::Security;
        }
        assert!(cfg.validate().is_err());

        cfg.inputs[3].channel_type = InputType::Security;
        cfg.validate().unwrap();

        // A disabled member still counts toward its group.
        cfg.inputs[1].disabled = true;
        cfg.validate().unwrap();
    }

    #[test]
    fn bad_output_settings_are_rejected() {
        let mut cfg = BankConfig::default();
        cfg.outputs[0].interlock = 16;
        assert_eq!(
            cfg.validate(),
            Err(Error::Config("interlock partner out of range"))
        );

        cfg.outputs[0].interlock = 0;
        cfg.outputs[3].timer_secs = 0;
        assert_eq!(
            cfg.validate(),
            Err(Error::Config("timer duration must be non-zero"))
        );
    }

    #[test]
    fn apply_to_configures_both_engines() {
        let mut cfg = BankConfig::default();
        cfg.inputs[2].channel_type = InputType::Button;
        cfg.inputs[2].invert = true;
        cfg.outputs[0].channel_type = OutputType::Timer;
        cfg.outputs[0].timer_secs = 5;
        cfg.outputs[1].interlock = 2;

        let mut input = InputEngine::default();
        let mut output = OutputEngine::default();
        cfg.apply_to(&mut input, &mut output).unwrap();

        assert_eq!(input.get_type(2).unwrap(), InputType::Button);
        assert!(input.get_invert(2).unwrap());
        assert_eq!(output.get_type(0).unwrap(), OutputType::Timer);
        assert_eq!(output.get_timer(0).unwrap(), 5);
        assert_eq!(output.get_interlock(1).unwrap(), 2);
    }

    #[test]
    fn apply_resets_inflight_channel_state() {
        let mut input = InputEngine::default();
        let mut events = Vec::new();
        // Drive channel 0 into the stable active state.
        input.process(1, 0xFFFF, 0, &mut |e: &InputEvent| events.push(*e));
        input.process(1, 0xFFFE, 10, &mut |e: &InputEvent| events.push(*e));
        input.process(1, 0xFFFE, 70, &mut |e: &InputEvent| events.push(*e));
        assert_eq!(events.len(), 1);

        let mut output = OutputEngine::default();
        let mut out_events = Vec::new();
        output
            .handle_command(1, 0, OutputState::On, &mut |e: &crate::events::OutputEvent| {
                out_events.push(*e)
            })
            .unwrap();

        BankConfig::default()
            .apply_to(&mut input, &mut output)
            .unwrap();

        // Input state machine was reset; the still-active value debounces
        // and reports again.
        events.clear();
        input.process(1, 0xFFFE, 80, &mut |e: &InputEvent| events.push(*e));
        input.process(1, 0xFFFE, 140, &mut |e: &InputEvent| events.push(*e));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn json_roundtrip() {
        let mut cfg = BankConfig::default();
        cfg.inputs[4].channel_type = InputType::Rotary;
        cfg.inputs[5].channel_type = InputType::Rotary;
        cfg.outputs[7].channel_type = OutputType::Motor;

        let json = cfg.to_json().unwrap();
        let back = BankConfig::from_json(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn json_uses_lowercase_type_names() {
        let json = BankConfig::default().to_json().unwrap();
        assert!(json.contains("\"switch\""));
        assert!(json.contains("\"relay\""));
    }

    #[test]
    fn postcard_roundtrip() {
        let mut cfg = BankConfig::default();
        cfg.inputs[0].channel_type = InputType::Button;
        cfg.outputs[0].channel_type = OutputType::Timer;
        cfg.outputs[0].timer_secs = 30;

        let blob = cfg.to_postcard().unwrap();
        let back = BankConfig::from_postcard(&blob).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn garbage_payloads_are_rejected() {
        assert!(BankConfig::from_json("{not json").is_err());
        assert!(BankConfig::from_postcard(&[0xFF; 3]).is_err());
    }
}
