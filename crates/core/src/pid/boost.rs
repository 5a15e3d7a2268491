//! PID boost on fast throttle changes
//!
//! Rapid collective changes disturb attitude (the "anti-gravity" effect).
//! The filtered throttle slew rate scales P, I and D up while it lasts.

use crate::filters::Pt1;
use crate::fixed::Fix32;

/// Axes the boost applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoostAxes {
    #[default]
    Off,
    RollPitch,
    All,
}

impl BoostAxes {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoostAxes::Off => "Off",
            BoostAxes::RollPitch => "RollPitch",
            BoostAxes::All => "All",
        }
    }

    pub fn from_index(index: i32) -> Self {
        match index {
            1 => BoostAxes::RollPitch,
            2 => BoostAxes::All,
            _ => BoostAxes::Off,
        }
    }
}

/// P/I/D multipliers for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostFactors {
    pub p: Fix32,
    pub i: Fix32,
    pub d: Fix32,
}

impl BoostFactors {
    pub const NONE: Self = Self {
        p: Fix32::ONE,
        i: Fix32::ONE,
        d: Fix32::ONE,
    };
}

#[derive(Debug, Clone, Copy)]
pub struct PidBoost {
    axes: BoostAxes,
    filter: Pt1<Fix32>,
    sample_rate: i32,
    /// Throttle slew (1/1024 per second) where the boost starts
    start: Fix32,
    /// Throttle slew where the boost is at full effect
    full: Fix32,
    /// Extra gain at full effect: 5 means P is 6x
    p_gain: Fix32,
    i_gain: Fix32,
    d_gain: Fix32,
    last_throttle: Fix32,
}

impl PidBoost {
    pub fn new(axes: BoostAxes, cutoff_hz: f32, sample_hz: f32) -> Self {
        Self {
            axes,
            filter: Pt1::new(cutoff_hz, sample_hz),
            sample_rate: sample_hz as i32,
            start: Fix32::from_int(2_000),
            full: Fix32::from_int(6_000),
            p_gain: Fix32::from_int(5),
            i_gain: Fix32::from_int(5),
            d_gain: Fix32::ZERO,
            last_throttle: Fix32::ZERO,
        }
    }

    /// Slew thresholds in throttle units per second
    pub fn with_thresholds(mut self, start: Fix32, full: Fix32) -> Self {
        self.start = start;
        self.full = full.max(start + Fix32::ONE);
        self
    }

    pub fn with_gains(mut self, p: Fix32, i: Fix32, d: Fix32) -> Self {
        self.p_gain = p;
        self.i_gain = i;
        self.d_gain = d;
        self
    }

    pub fn axes(&self) -> BoostAxes {
        self.axes
    }

    /// Feed this cycle's throttle setpoint; returns the factors for roll/pitch
    pub fn update(&mut self, throttle: Fix32) -> BoostFactors {
        if self.axes == BoostAxes::Off {
            return BoostFactors::NONE;
        }
        let slew = self.filter.update(throttle - self.last_throttle);
        self.last_throttle = throttle;
        let strength = ((slew.abs() * self.sample_rate - self.start) / (self.full - self.start))
            .clamp(Fix32::ZERO, Fix32::ONE);
        BoostFactors {
            p: Fix32::ONE + self.p_gain * strength,
            i: Fix32::ONE + self.i_gain * strength,
            d: Fix32::ONE + self.d_gain * strength,
        }
    }

    /// Whether yaw gets the P and D factors too
    pub fn boosts_yaw(&self) -> bool {
        self.axes == BoostAxes::All
    }

    pub fn reset(&mut self) {
        self.filter.set(Fix32::ZERO);
        self.last_throttle = Fix32::ZERO;
    }
}
