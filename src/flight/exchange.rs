//! State exchanged between the flight loop and housekeeping
//!
//! One `LoopExchange` sits behind a `SharedState`. The flight loop writes
//! the snapshot every cycle and takes staged settings at a macro-cycle
//! boundary; the configuration path only stages, telemetry only reads.

use kolibri_core::parameters::FlightSettings;
use kolibri_core::state::TelemetrySnapshot;

use crate::traits::{SharedState, TelemetrySink};

/// Settings double buffer
///
/// `stage` replaces any earlier staged copy that the loop has not yet
/// taken, so only the newest configuration is ever applied.
#[derive(Debug, Clone, Default)]
pub struct SettingsBank {
    staged: Option<FlightSettings>,
    generation: u32,
}

impl SettingsBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue settings for the next macro-cycle boundary
    pub fn stage(&mut self, settings: FlightSettings) {
        self.staged = Some(settings);
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Hand the staged copy to the flight loop
    pub fn take(&mut self) -> Option<FlightSettings> {
        let settings = self.staged.take()?;
        self.generation = self.generation.wrapping_add(1);
        Some(settings)
    }

    /// Number of swaps performed so far
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoopExchange {
    pub snapshot: TelemetrySnapshot,
    pub settings: SettingsBank,
}

/// Housekeeping side: forwards fresh snapshots to a sink at its own rate
#[derive(Debug, Clone)]
pub struct TelemetryForwarder {
    interval_us: u64,
    last_sent_us: Option<u64>,
    last_cycle: Option<u32>,
}

impl TelemetryForwarder {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            interval_us: 1_000_000 / rate_hz.max(1) as u64,
            last_sent_us: None,
            last_cycle: None,
        }
    }

    /// Publish when the interval elapsed and the loop produced a new cycle
    pub fn poll<X, T>(&mut self, exchange: &X, sink: &mut T, now_us: u64) -> bool
    where
        X: SharedState<LoopExchange>,
        T: TelemetrySink,
    {
        if let Some(last) = self.last_sent_us {
            if now_us.saturating_sub(last) < self.interval_us {
                return false;
            }
        }
        let snapshot = exchange.with(|x| x.snapshot);
        if self.last_cycle == Some(snapshot.cycle) {
            return false;
        }
        sink.publish(&snapshot);
        self.last_sent_us = Some(now_us);
        self.last_cycle = Some(snapshot.cycle);
        true
    }
}
