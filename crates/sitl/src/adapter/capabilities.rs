/// Describes which sensor types a simulator can provide.
#[derive(Debug, Clone)]
pub struct SensorCapabilities {
    pub imu: bool,
    pub gps: bool,
    pub compass: bool,
    pub barometer: bool,
}

impl Default for SensorCapabilities {
    fn default() -> Self {
        Self {
            imu: true,
            gps: true,
            compass: true,
            barometer: true,
        }
    }
}

/// Describes the overall capabilities of a simulator backend.
#[derive(Debug, Clone)]
pub struct SimulatorCapabilities {
    /// Which sensor types are available.
    pub sensors: SensorCapabilities,
    /// Maximum simulation update rate in Hz.
    pub max_rate_hz: u32,
    /// Whether the adapter follows velocity guidance instead of
    /// integrating motor thrust.
    pub velocity_guidance: bool,
}

impl Default for SimulatorCapabilities {
    fn default() -> Self {
        Self {
            sensors: SensorCapabilities::default(),
            max_rate_hz: 3200,
            velocity_guidance: false,
        }
    }
}
