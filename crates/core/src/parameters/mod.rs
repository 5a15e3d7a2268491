//! Parameter management types
//!
//! Named parameters live in a fixed-capacity [`ParameterStore`]. Each group
//! registers its defaults and loads itself back with out-of-range values
//! clamped, never rejected. Persisting the store is up to the platform.

pub mod altitude;
pub mod angle;
pub mod error;
pub mod pid_gains;
pub mod position;
pub mod rates;
pub mod settings;
pub mod storage;

pub use altitude::AltitudeParams;
pub use angle::AngleParams;
pub use error::ParameterError;
pub use pid_gains::PidParams;
pub use position::PositionParams;
pub use rates::{AxisRate, RateParams, MAX_RATE_LIMIT};
pub use settings::FlightSettings;
pub use storage::{ParamFlags, ParamMetadata, ParamValue, ParameterStore};
pub use storage::{MAX_PARAMS, PARAM_NAME_LEN};
