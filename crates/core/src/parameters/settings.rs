//! All flight parameter groups together

use super::altitude::AltitudeParams;
use super::angle::AngleParams;
use super::error::ParameterError;
use super::pid_gains::PidParams;
use super::position::PositionParams;
use super::rates::RateParams;
use super::storage::ParameterStore;

/// Every tunable the flight pipeline reads
///
/// Loaded once at boot and again after each configurator "set"; the
/// integration layer swaps a new copy in between control cycles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlightSettings {
    pub rates: RateParams,
    pub pid: PidParams,
    pub angle: AngleParams,
    pub altitude: AltitudeParams,
    pub position: PositionParams,
}

impl FlightSettings {
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        RateParams::register_defaults(store)?;
        PidParams::register_defaults(store)?;
        AngleParams::register_defaults(store)?;
        AltitudeParams::register_defaults(store)?;
        PositionParams::register_defaults(store)?;
        Ok(())
    }

    pub fn from_store(store: &ParameterStore) -> Self {
        Self {
            rates: RateParams::from_store(store),
            pid: PidParams::from_store(store),
            angle: AngleParams::from_store(store),
            altitude: AltitudeParams::from_store(store),
            position: PositionParams::from_store(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{ParamValue, MAX_PARAMS};

    #[test]
    fn test_all_groups_fit_in_store() {
        let mut store = ParameterStore::new();
        FlightSettings::register_defaults(&mut store).unwrap();
        assert!(store.len() <= MAX_PARAMS);
        assert_eq!(FlightSettings::from_store(&store), FlightSettings::default());
    }

    #[test]
    fn test_register_twice_keeps_values() {
        let mut store = ParameterStore::new();
        FlightSettings::register_defaults(&mut store).unwrap();
        store.set("ANG_MAX", ParamValue::Float(25.0)).unwrap();
        FlightSettings::register_defaults(&mut store).unwrap();
        assert_eq!(FlightSettings::from_store(&store).angle.max_angle, 25.0);
    }
}
