//! RC channel state and stick positions
//!
//! Channels are in the usual 988..2012 microsecond range, 1500 centered.

use crate::fixed::Fix32;

/// Number of RC channels delivered by the link
pub const RC_CHANNEL_COUNT: usize = 16;

/// Channel value at stick center
pub const CHANNEL_CENTER: u16 = 1500;

/// Throttle channel value that maps to zero throttle
pub const THROTTLE_ZERO: u16 = 988;

/// Latest frame from the RC link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RcChannels {
    pub channels: [u16; RC_CHANNEL_COUNT],
    pub link_up: bool,
    /// Link quality in percent
    pub link_quality: u8,
    /// Microseconds since the last valid message
    pub since_last_message_us: u32,
}

impl RcChannels {
    pub const ROLL: usize = 0;
    pub const PITCH: usize = 1;
    pub const THROTTLE: usize = 2;
    pub const YAW: usize = 3;
    pub const ARM: usize = 4;
    pub const MODE: usize = 5;

    /// Channel value, center for indices the link does not carry
    pub fn channel(&self, index: usize) -> u16 {
        self.channels.get(index).copied().unwrap_or(CHANNEL_CENTER)
    }

    pub fn set_channel(&mut self, index: usize, value: u16) {
        if let Some(slot) = self.channels.get_mut(index) {
            *slot = value;
        }
    }
}

impl Default for RcChannels {
    /// Sticks centered, throttle low, arm switch off, link down
    fn default() -> Self {
        let mut channels = [CHANNEL_CENTER; RC_CHANNEL_COUNT];
        channels[Self::THROTTLE] = 1000;
        channels[Self::ARM] = 1000;
        channels[Self::MODE] = 1000;
        Self {
            channels,
            link_up: false,
            link_quality: 0,
            since_last_message_us: 0,
        }
    }
}

/// Stick positions in controller units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sticks {
    /// -1..1, right positive
    pub roll: Fix32,
    /// -1..1, forward positive
    pub pitch: Fix32,
    /// -1..1, right positive
    pub yaw: Fix32,
    /// 0..1024 (slightly beyond at the channel extremes)
    pub throttle: Fix32,
}

impl Sticks {
    pub fn from_channels(rc: &RcChannels) -> Self {
        let centered =
            |index: usize| Fix32::from_int(rc.channel(index) as i32 - CHANNEL_CENTER as i32) >> 9;
        Self {
            roll: centered(RcChannels::ROLL),
            pitch: centered(RcChannels::PITCH),
            yaw: centered(RcChannels::YAW),
            throttle: Fix32::from_int(rc.channel(RcChannels::THROTTLE) as i32 - THROTTLE_ZERO as i32),
        }
    }
}
