//! Estimator configuration

use crate::fixed::Fix32;
use crate::sensors::{BaroCalibration, BoardAlignment};

/// How the three per-axis gyro increments are composed onto the attitude
///
/// Quaternion products do not commute, so the order is part of the
/// estimator's definition. Each increment is left-multiplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntegrationOrder {
    /// Roll increment first, then pitch, then yaw
    #[default]
    Xyz,
    /// Yaw increment first, then pitch, then roll
    Zyx,
    /// One first-order increment carrying all three axes
    Combined,
}

impl IntegrationOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationOrder::Xyz => "Xyz",
            IntegrationOrder::Zyx => "Zyx",
            IntegrationOrder::Combined => "Combined",
        }
    }
}

/// Cutoff equivalent to blending 1e-4 of the measurement per 3200 Hz cycle
pub const SLOW_FUSION_CUTOFF_HZ: f32 = 0.0509;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AhrsConfig {
    /// Gyro/accelerometer sample rate; the estimator runs once per sample
    pub gyro_rate_hz: u32,
    pub integration_order: IntegrationOrder,
    pub gyro_alignment: BoardAlignment,
    pub accel_alignment: BoardAlignment,
    pub mag_alignment: BoardAlignment,
    /// Stationary samples averaged into the gyro bias at boot
    pub gyro_calibration_samples: u32,
    /// Accelerometer low-pass before tilt correction and velocity integration
    pub accel_cutoff_hz: f32,
    /// Largest tilt correction applied per accelerometer sample, radians
    pub accel_correction_limit: f32,

    pub mag_rate_hz: f32,
    pub mag_heading_cutoff_hz: f32,
    /// Added to the magnetometer heading, radians (east positive)
    pub mag_declination: Fix32,

    pub baro_rate_hz: f32,
    pub baro_calibration: BaroCalibration,
    /// Pull of the barometric altitude on the fused altitude
    pub baro_altitude_cutoff_hz: f32,
    /// Pull of the barometric climb rate on the vertical velocity (no 3D fix)
    pub baro_velocity_cutoff_hz: f32,
    /// Smoothing of the differentiated barometric altitude
    pub baro_derivative_cutoff_hz: f32,

    pub gps_rate_hz: f32,
    /// Pull of the GPS altitude on the fused altitude
    pub gps_altitude_cutoff_hz: f32,
    /// Pull of the GPS down velocity on the vertical velocity
    pub gps_velocity_cutoff_hz: f32,
    /// Pull of the GPS north/east velocity on the horizontal velocity
    pub horizontal_velocity_cutoff_hz: f32,
}

impl Default for AhrsConfig {
    fn default() -> Self {
        Self {
            gyro_rate_hz: 3200,
            integration_order: IntegrationOrder::Xyz,
            gyro_alignment: BoardAlignment::default(),
            accel_alignment: BoardAlignment::default(),
            mag_alignment: BoardAlignment::IDENTITY,
            gyro_calibration_samples: 3200,
            accel_cutoff_hz: 100.0,
            accel_correction_limit: 0.000_02,
            mag_rate_hz: 75.0,
            mag_heading_cutoff_hz: 0.02,
            mag_declination: Fix32::from_raw(3_698),
            baro_rate_hz: 50.0,
            baro_calibration: BaroCalibration::default(),
            baro_altitude_cutoff_hz: SLOW_FUSION_CUTOFF_HZ,
            baro_velocity_cutoff_hz: SLOW_FUSION_CUTOFF_HZ,
            baro_derivative_cutoff_hz: 1.0,
            gps_rate_hz: 10.0,
            gps_altitude_cutoff_hz: SLOW_FUSION_CUTOFF_HZ,
            gps_velocity_cutoff_hz: SLOW_FUSION_CUTOFF_HZ,
            horizontal_velocity_cutoff_hz: 0.2,
        }
    }
}

impl AhrsConfig {
    /// Builder-style override of the integration order
    pub fn with_integration_order(mut self, order: IntegrationOrder) -> Self {
        self.integration_order = order;
        self
    }

    pub fn with_gyro_calibration_samples(mut self, samples: u32) -> Self {
        self.gyro_calibration_samples = samples;
        self
    }
}
