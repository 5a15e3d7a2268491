//! Flight modes

/// Flight mode, ordered by how much the controller takes over
///
/// The ordering is meaningful: mode entry effects are keyed on crossing the
/// `Angle` and `AltHold` boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlightMode {
    /// Sticks command rotation rates
    #[default]
    Acro = 0,
    /// Sticks command tilt, yaw stick commands heading rate
    Angle = 1,
    /// Angle plus throttle stick commanding vertical velocity
    AltHold = 2,
    /// Sticks command horizontal velocity; position lock when released
    GpsVelocity = 3,
    /// Autopilot return to home
    GpsPosition = 4,
}

impl FlightMode {
    pub const ALL: [FlightMode; 5] = [
        FlightMode::Acro,
        FlightMode::Angle,
        FlightMode::AltHold,
        FlightMode::GpsVelocity,
        FlightMode::GpsPosition,
    ];

    /// Mode selected by the mode-switch channel: `(ch - 900) / 200`
    ///
    /// Anything outside the five slots selects `Acro`.
    pub fn from_channel(channel: u16) -> Self {
        let offset = channel as i32 - 900;
        if offset < 0 {
            return FlightMode::Acro;
        }
        Self::from_index((offset / 200) as u8).unwrap_or(FlightMode::Acro)
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlightMode::Acro => "ACRO",
            FlightMode::Angle => "ANGLE",
            FlightMode::AltHold => "ALT",
            FlightMode::GpsVelocity => "GPS",
            FlightMode::GpsPosition => "RTH",
        }
    }

    /// Self-levelling modes run the time-sliced angle pipeline
    pub fn is_sliced(&self) -> bool {
        *self >= FlightMode::Angle
    }

    /// Throttle comes from the vertical velocity controller
    pub fn holds_altitude(&self) -> bool {
        *self >= FlightMode::AltHold
    }

    pub fn uses_gps(&self) -> bool {
        *self >= FlightMode::GpsVelocity
    }
}
