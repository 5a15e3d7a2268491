//! Attitude, altitude and velocity estimator
//!
//! Frames: body is forward-right-down, world is north-east-down. The
//! integrated quaternion maps world vectors into the body frame; Euler
//! angles are reported for the body-to-world rotation, so roll right,
//! pitch up and yaw right (clockwise from above) are positive.
//!
//! Rates:
//! - gyro and accelerometer: every sample (`gyro_rate_hz`)
//! - magnetometer, barometer, GPS: whenever the driver has new data
//!
//! A sensor that stops delivering simply stops nudging the state; the
//! gyro integration never depends on it. GPS is the exception that has to
//! be noticed: its vertical velocity displaces the barometric one, so a
//! receiver that goes quiet for `GPS_TIMEOUT_PERIODS` is treated as a lost
//! fix.

use super::calibration::GyroCalibration;
use super::config::{AhrsConfig, IntegrationOrder};
use super::heading_filter::MagHeadingFilter;
use crate::filters::{alpha_for, Pt1};
use crate::fixed::{trig, Fix32, Fix64};
use crate::geometry::{Axis, Quaternion, Vector3};
use crate::sensors::{
    BaroSample, FixType, GeoPoint, GpsFix, MagSample, ACCEL_RAW_TO_M_PER_SEC2, GRAVITY,
    GYRO_RAW_TO_RAD_PER_SEC,
};

/// Raw gyro count to deg/s (2000 / 32768, exact in Q16.16)
pub const GYRO_RAW_TO_DEG_PER_SEC: Fix32 = Fix32::from_raw(4000);

/// Missed GPS solutions after which the last 3D fix is dropped
pub const GPS_TIMEOUT_PERIODS: f32 = 5.0;

/// Orientation estimate
#[derive(Debug, Clone, Copy)]
pub struct Attitude {
    /// World-to-body rotation as integrated
    pub quaternion: Quaternion<f32>,
    pub roll: Fix32,
    pub pitch: Fix32,
    /// Gyro-integrated yaw, radians in [-pi, pi)
    pub yaw: Fix32,
    /// Yaw plus the filtered magnetometer correction, radians in [-pi, pi)
    pub heading: Fix32,
    /// Last tilt-compensated magnetometer heading
    pub mag_heading: Fix32,
    pub sin_roll: Fix32,
    pub cos_roll: Fix32,
    pub sin_pitch: Fix32,
    pub cos_pitch: Fix32,
    pub sin_heading: Fix32,
    pub cos_heading: Fix32,
}

impl Default for Attitude {
    fn default() -> Self {
        Self {
            quaternion: Quaternion::identity(),
            roll: Fix32::ZERO,
            pitch: Fix32::ZERO,
            yaw: Fix32::ZERO,
            heading: Fix32::ZERO,
            mag_heading: Fix32::ZERO,
            sin_roll: Fix32::ZERO,
            cos_roll: Fix32::ONE,
            sin_pitch: Fix32::ZERO,
            cos_pitch: Fix32::ONE,
            sin_heading: Fix32::ZERO,
            cos_heading: Fix32::ONE,
        }
    }
}

/// Position and velocity estimate
#[derive(Debug, Clone, Copy, Default)]
pub struct Navigation {
    /// Fused altitude above mean sea level, metres
    pub altitude: Fix32,
    /// Climb rate, m/s (up positive)
    pub vertical_velocity: Fix32,
    /// Vertical specific force, m/s^2 (1 g at rest)
    pub vertical_accel: Fix32,
    pub north_velocity: Fix32,
    pub east_velocity: Fix32,
    /// Last barometric altitude, metres
    pub baro_altitude: Fix32,
    /// Last 3D-fix position
    pub position: Option<GeoPoint>,
    pub fix_type: FixType,
    pub satellites: u8,
}

/// Sensor fusion state
///
/// The vertical channel is integrated on Q48.16 accumulators that hold
/// velocity times the sample rate and altitude times the rate squared, so
/// per-sample increments far below one Q16.16 step are not truncated away.
#[derive(Debug, Clone)]
pub struct Estimator {
    config: AhrsConfig,
    rate_hz: i64,
    half_angle_per_count: f32,
    gyro_cal: GyroCalibration,
    q: Quaternion<f32>,
    rates_dps: [Fix32; 3],
    accel_filter: [Pt1<Fix32>; 3],
    attitude: Attitude,

    mag_filter: MagHeadingFilter,
    mag_seen: bool,

    velocity_scaled: Fix64,
    altitude_scaled: Fix64,
    altitude_seeded: bool,
    vertical_accel: Fix32,

    baro_altitude_alpha: Fix32,
    baro_velocity_alpha: Fix32,
    baro_derivative: Pt1<Fix32>,
    last_baro_altitude: Option<Fix32>,
    baro_altitude: Fix32,

    gps_altitude_alpha: Fix32,
    gps_velocity_alpha: Fix32,
    gps_vertical_valid: bool,
    /// Gyro samples since the last 3D fix, saturating
    gps_age: u32,
    gps_timeout: u32,
    north_velocity: Pt1<Fix32>,
    east_velocity: Pt1<Fix32>,
    position: Option<GeoPoint>,
    fix_type: FixType,
    satellites: u8,
}

/// Saturating conversion of an aligned raw count
fn counts(v: i32) -> Fix32 {
    Fix32::from_int(v.clamp(-32767, 32767))
}

impl Estimator {
    pub fn new(config: AhrsConfig) -> Self {
        let rate = config.gyro_rate_hz.max(1);
        let rate_f = rate as f32;
        let accel_stage = Pt1::new(config.accel_cutoff_hz, rate_f);
        Self {
            rate_hz: rate as i64,
            half_angle_per_count: GYRO_RAW_TO_RAD_PER_SEC / rate_f / 2.0,
            gyro_cal: GyroCalibration::new(config.gyro_calibration_samples),
            q: Quaternion::identity(),
            rates_dps: [Fix32::ZERO; 3],
            accel_filter: [accel_stage; 3],
            attitude: Attitude::default(),
            mag_filter: MagHeadingFilter::new(config.mag_heading_cutoff_hz, config.mag_rate_hz),
            mag_seen: false,
            velocity_scaled: Fix64::ZERO,
            altitude_scaled: Fix64::ZERO,
            altitude_seeded: false,
            vertical_accel: GRAVITY,
            baro_altitude_alpha: Fix32::from_f32(alpha_for(
                config.baro_altitude_cutoff_hz,
                config.baro_rate_hz,
            )),
            baro_velocity_alpha: Fix32::from_f32(alpha_for(
                config.baro_velocity_cutoff_hz,
                config.baro_rate_hz,
            )),
            baro_derivative: Pt1::new(config.baro_derivative_cutoff_hz, config.baro_rate_hz),
            last_baro_altitude: None,
            baro_altitude: Fix32::ZERO,
            gps_altitude_alpha: Fix32::from_f32(alpha_for(
                config.gps_altitude_cutoff_hz,
                config.gps_rate_hz,
            )),
            gps_velocity_alpha: Fix32::from_f32(alpha_for(
                config.gps_velocity_cutoff_hz,
                config.gps_rate_hz,
            )),
            gps_vertical_valid: false,
            gps_age: 0,
            gps_timeout: gps_timeout_samples(rate_f, config.gps_rate_hz),
            north_velocity: Pt1::new(config.horizontal_velocity_cutoff_hz, config.gps_rate_hz),
            east_velocity: Pt1::new(config.horizontal_velocity_cutoff_hz, config.gps_rate_hz),
            position: None,
            fix_type: FixType::NoFix,
            satellites: 0,
            config,
        }
    }

    pub fn config(&self) -> &AhrsConfig {
        &self.config
    }

    pub fn is_gyro_calibrated(&self) -> bool {
        self.gyro_cal.is_calibrated()
    }

    pub fn gyro_calibration(&self) -> &GyroCalibration {
        &self.gyro_cal
    }

    /// Restart the boot-time gyro bias average
    pub fn recalibrate_gyro(&mut self) {
        self.gyro_cal.restart();
    }

    /// Bias-corrected body rates, deg/s (roll, pitch, yaw)
    pub fn rates_dps(&self) -> [Fix32; 3] {
        self.rates_dps
    }

    pub fn attitude(&self) -> &Attitude {
        &self.attitude
    }

    pub fn navigation(&self) -> Navigation {
        Navigation {
            altitude: self.altitude(),
            vertical_velocity: self.vertical_velocity(),
            vertical_accel: self.vertical_accel,
            north_velocity: self.north_velocity.value(),
            east_velocity: self.east_velocity.value(),
            baro_altitude: self.baro_altitude,
            position: self.position,
            fix_type: self.fix_type,
            satellites: self.satellites,
        }
    }

    fn altitude(&self) -> Fix32 {
        (self.altitude_scaled / (self.rate_hz * self.rate_hz)).to_fix32_saturating()
    }

    fn vertical_velocity(&self) -> Fix32 {
        (self.velocity_scaled / self.rate_hz).to_fix32_saturating()
    }

    /// One gyro sample: rate output and attitude integration
    ///
    /// While the boot calibration is running the sample only feeds the bias
    /// average and the attitude is held.
    pub fn update_gyro(&mut self, raw: [i16; 3]) {
        self.age_gps();
        let body = self.config.gyro_alignment.apply(raw);
        if !self.gyro_cal.is_calibrated() {
            self.gyro_cal.accumulate(body);
            for (r, b) in self.rates_dps.iter_mut().zip(body) {
                *r = counts(b) * GYRO_RAW_TO_DEG_PER_SEC;
            }
            return;
        }

        let bias = self.gyro_cal.bias();
        let mut rate_counts = [Fix32::ZERO; 3];
        for i in 0..3 {
            rate_counts[i] = counts(body[i]) - bias[i];
            self.rates_dps[i] = rate_counts[i] * GYRO_RAW_TO_DEG_PER_SEC;
        }

        // world-to-body: the body turning by +w turns the world by -w
        let k = -2.0 * self.half_angle_per_count;
        let angle = [
            rate_counts[0].to_f32() * k,
            rate_counts[1].to_f32() * k,
            rate_counts[2].to_f32() * k,
        ];
        self.q = integrate(self.q, angle, self.config.integration_order).normalize();
        self.refresh_attitude();
    }

    /// One accelerometer sample: filter, tilt correction, vertical and
    /// horizontal velocity integration
    pub fn update_accel(&mut self, raw: [i16; 3]) {
        let body = self.config.accel_alignment.apply(raw);
        for (f, b) in self.accel_filter.iter_mut().zip(body) {
            f.update(counts(b));
        }

        if self.gyro_cal.is_calibrated() {
            self.correct_tilt(body);
            self.refresh_attitude();
        }
        self.integrate_velocity();
    }

    fn correct_tilt(&mut self, body: [i32; 3]) {
        let accel = Vector3::new(body[0] as f32, body[1] as f32, body[2] as f32);
        let Some(measured_up) = accel.normalize() else {
            return;
        };
        let q = self.q;
        // world up (0, 0, -1) expressed in the body frame
        let predicted_up = Vector3::new(
            -2.0 * (q.w * q.y + q.x * q.z),
            2.0 * (q.w * q.x - q.y * q.z),
            -q.z * q.z + q.y * q.y + q.x * q.x - q.w * q.w,
        );
        let arc = Quaternion::from_unit_vecs(predicted_up, measured_up);
        let (axis, angle) = arc.to_axis_angle();
        let angle = angle.min(self.config.accel_correction_limit);
        let half = angle * 0.5;
        let correction = Quaternion::from_parts(1.0, axis.scale(half));
        self.q = (correction * self.q).normalize();
    }

    fn refresh_attitude(&mut self) {
        // Euler angles of the body-to-world rotation
        let q = self.q.conjugate().cast::<Fix32>();
        let two = Fix32::from_int(2);
        let roll = trig::atan2(
            two * (q.w * q.x + q.y * q.z),
            Fix32::ONE - two * (q.x * q.x + q.y * q.y),
        );
        let pitch = trig::asin(two * (q.w * q.y - q.z * q.x));
        let yaw = trig::atan2(
            two * (q.w * q.z + q.x * q.y),
            Fix32::ONE - two * (q.y * q.y + q.z * q.z),
        )
        .wrap_pi();
        let heading = (self.mag_filter.correction() + yaw).wrap_pi();

        let (sin_roll, cos_roll) = trig::sin_cos(roll);
        let (sin_pitch, cos_pitch) = trig::sin_cos(pitch);
        let (sin_heading, cos_heading) = trig::sin_cos(heading);
        self.attitude = Attitude {
            quaternion: self.q,
            roll,
            pitch,
            yaw,
            heading,
            mag_heading: self.attitude.mag_heading,
            sin_roll,
            cos_roll,
            sin_pitch,
            cos_pitch,
            sin_heading,
            cos_heading,
        };
    }

    fn integrate_velocity(&mut self) {
        let a = &self.attitude;
        let [bx, by, bz] = [
            self.accel_filter[0].value(),
            self.accel_filter[1].value(),
            self.accel_filter[2].value(),
        ];

        // specific force along world up
        let up_counts =
            a.sin_pitch * bx - a.sin_roll * a.cos_pitch * by - a.cos_roll * a.cos_pitch * bz;
        self.vertical_accel = up_counts * ACCEL_RAW_TO_M_PER_SEC2;
        self.velocity_scaled += self.vertical_accel - GRAVITY;
        self.altitude_scaled += self.velocity_scaled;

        // level-frame forward/right, then north/east
        let right = a.cos_roll * by - a.sin_roll * bz;
        let forward = a.cos_pitch * bx + a.sin_pitch * (a.sin_roll * by + a.cos_roll * bz);
        let north = forward * a.cos_heading - right * a.sin_heading;
        let east = right * a.cos_heading + forward * a.sin_heading;
        let rate = self.rate_hz as i32;
        self.north_velocity.add(north * ACCEL_RAW_TO_M_PER_SEC2 / rate);
        self.east_velocity.add(east * ACCEL_RAW_TO_M_PER_SEC2 / rate);
    }

    /// One magnetometer sample: tilt-compensated heading and the
    /// heading-correction filter
    pub fn update_mag(&mut self, sample: &MagSample) {
        let m = self.config.mag_alignment.apply(sample.field);
        let (mx, my, mz) = (counts(m[0]), counts(m[1]), counts(m[2]));
        let a = &self.attitude;
        let right = a.cos_roll * my - a.sin_roll * mz;
        let front = a.cos_pitch * mx + a.sin_pitch * (a.sin_roll * my + a.cos_roll * mz);
        if right.is_zero() && front.is_zero() {
            return;
        }
        let heading = (trig::atan2(-right, front) + self.config.mag_declination).wrap_pi();
        let yaw = a.yaw;
        if self.mag_seen {
            self.mag_filter.update(heading, yaw);
        } else {
            self.mag_filter.reset_to(heading - yaw);
            self.mag_seen = true;
        }
        self.attitude.mag_heading = heading;
        let combined = (self.mag_filter.correction() + yaw).wrap_pi();
        let (s, c) = trig::sin_cos(combined);
        self.attitude.heading = combined;
        self.attitude.sin_heading = s;
        self.attitude.cos_heading = c;
    }

    /// One barometer sample: altitude and climb-rate pull
    pub fn update_baro(&mut self, sample: &BaroSample) {
        let altitude = self.config.baro_calibration.altitude_m(sample);
        self.baro_altitude = altitude;
        if !self.altitude_seeded {
            self.seed_altitude(altitude);
        }

        if let Some(last) = self.last_baro_altitude {
            let rate = self.config.baro_rate_hz as i32;
            self.baro_derivative.update((altitude - last) * rate.max(1));
        }
        self.last_baro_altitude = Some(altitude);

        self.pull_altitude(altitude, self.baro_altitude_alpha);
        if !self.gps_vertical_valid {
            self.pull_velocity(self.baro_derivative.value(), self.baro_velocity_alpha);
        }
    }

    /// One GPS solution: horizontal velocity, vertical velocity and altitude
    /// pull, position
    pub fn update_gps(&mut self, fix: &GpsFix) {
        self.fix_type = fix.fix_type;
        self.satellites = fix.satellites;
        if !fix.has_3d_fix() {
            self.drop_gps_fix();
            return;
        }
        self.gps_vertical_valid = true;
        self.gps_age = 0;
        self.position = Some(fix.position());
        self.north_velocity.update(fix.vel_north());
        self.east_velocity.update(fix.vel_east());

        let altitude = fix.altitude_m();
        if !self.altitude_seeded {
            self.seed_altitude(altitude);
        }
        self.pull_altitude(altitude, self.gps_altitude_alpha);
        self.pull_velocity(fix.vel_up(), self.gps_velocity_alpha);
    }

    /// Samples since the last 3D fix; past the timeout the fix is stale
    fn age_gps(&mut self) {
        if !self.gps_vertical_valid {
            return;
        }
        self.gps_age = self.gps_age.saturating_add(1);
        if self.gps_age > self.gps_timeout {
            self.fix_type = FixType::NoFix;
            self.satellites = 0;
            self.drop_gps_fix();
        }
    }

    fn drop_gps_fix(&mut self) {
        self.gps_vertical_valid = false;
        self.position = None;
    }

    fn seed_altitude(&mut self, altitude: Fix32) {
        self.altitude_scaled = altitude * Fix64::from_int(self.rate_hz * self.rate_hz);
        self.altitude_seeded = true;
    }

    fn pull_altitude(&mut self, measured: Fix32, alpha: Fix32) {
        let error = measured - self.altitude();
        self.altitude_scaled += (alpha * error) * Fix64::from_int(self.rate_hz * self.rate_hz);
    }

    fn pull_velocity(&mut self, measured: Fix32, alpha: Fix32) {
        let error = measured - self.vertical_velocity();
        self.velocity_scaled += (alpha * error) * Fix64::from_int(self.rate_hz);
    }
}

fn gps_timeout_samples(sample_hz: f32, gps_rate_hz: f32) -> u32 {
    let periods = GPS_TIMEOUT_PERIODS / gps_rate_hz.max(0.1);
    libm::ceilf(sample_hz * periods) as u32
}

/// Compose one sample of body rotation (radians per axis) onto `q`
fn integrate(q: Quaternion<f32>, angle: [f32; 3], order: IntegrationOrder) -> Quaternion<f32> {
    match order {
        IntegrationOrder::Xyz => {
            let q = Quaternion::from_small_angle(Axis::X, angle[0]) * q;
            let q = Quaternion::from_small_angle(Axis::Y, angle[1]) * q;
            Quaternion::from_small_angle(Axis::Z, angle[2]) * q
        }
        IntegrationOrder::Zyx => {
            let q = Quaternion::from_small_angle(Axis::Z, angle[2]) * q;
            let q = Quaternion::from_small_angle(Axis::Y, angle[1]) * q;
            Quaternion::from_small_angle(Axis::X, angle[0]) * q
        }
        IntegrationOrder::Combined => {
            let h = Vector3::new(angle[0] * 0.5, angle[1] * 0.5, angle[2] * 0.5);
            Quaternion::from_parts(1.0, h) * q
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_G: i16 = 2048;

    fn estimator() -> Estimator {
        Estimator::new(AhrsConfig::default().with_gyro_calibration_samples(0))
    }

    /// Raw gyro counts for a body rate in deg/s, default board alignment
    fn gyro_raw(roll: f32, pitch: f32, yaw: f32) -> [i16; 3] {
        let c = |v: f32| libm::roundf(v * 16.384) as i16;
        [c(pitch), c(roll), -c(yaw)]
    }

    /// Raw accelerometer counts for a level board at rest
    fn level_accel() -> [i16; 3] {
        [0, 0, ONE_G]
    }

    #[test]
    fn test_starts_level() {
        let e = estimator();
        assert_eq!(e.attitude().roll, Fix32::ZERO);
        assert_eq!(e.attitude().cos_roll, Fix32::ONE);
        assert_eq!(e.navigation().position, None);
    }

    #[test]
    fn test_gyro_integration_signs() {
        for (raw, axis) in [
            (gyro_raw(90.0, 0.0, 0.0), 0),
            (gyro_raw(0.0, 90.0, 0.0), 1),
            (gyro_raw(0.0, 0.0, 90.0), 2),
        ] {
            let mut e = estimator();
            // 90 deg/s for 0.5 s
            for _ in 0..1600 {
                e.update_gyro(raw);
            }
            let a = e.attitude();
            let angles = [a.roll, a.pitch, a.yaw];
            for (i, v) in angles.iter().enumerate() {
                let expected = if i == axis { 45.0 } else { 0.0 };
                let deg = v.to_f32().to_degrees();
                assert!((deg - expected).abs() < 0.5, "axis {} angle {} = {}", axis, i, deg);
            }
            assert!((e.attitude().quaternion.norm() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_rates_in_deg_per_sec() {
        let mut e = estimator();
        e.update_gyro(gyro_raw(100.0, -50.0, 25.0));
        let r = e.rates_dps();
        assert!((r[0].to_f32() - 100.0).abs() < 0.1);
        assert!((r[1].to_f32() + 50.0).abs() < 0.1);
        assert!((r[2].to_f32() - 25.0).abs() < 0.1);
    }

    #[test]
    fn test_integration_orders_agree_for_small_rotations() {
        let raw = gyro_raw(30.0, -20.0, 10.0);
        let mut results = [Fix32::ZERO; 3];
        for (i, order) in [IntegrationOrder::Xyz, IntegrationOrder::Zyx, IntegrationOrder::Combined]
            .into_iter()
            .enumerate()
        {
            let mut e = Estimator::new(
                AhrsConfig::default()
                    .with_gyro_calibration_samples(0)
                    .with_integration_order(order),
            );
            for _ in 0..320 {
                e.update_gyro(raw);
            }
            results[i] = e.attitude().roll;
        }
        assert!((results[0] - results[1]).abs().to_f32() < 1e-3);
        assert!((results[0] - results[2]).abs().to_f32() < 1e-3);
    }

    #[test]
    fn test_calibration_holds_attitude_and_removes_bias() {
        let mut e = Estimator::new(AhrsConfig::default().with_gyro_calibration_samples(100));
        let biased = [5i16, -7, 3];
        for _ in 0..100 {
            e.update_gyro(biased);
        }
        assert!(e.is_gyro_calibrated());
        assert_eq!(e.attitude().quaternion, Quaternion::identity());
        for _ in 0..3200 {
            e.update_gyro(biased);
        }
        assert!(e.attitude().roll.abs().to_f32() < 1e-3);
        assert!(e.rates_dps()[0].abs() < Fix32::from_f32(0.01));
    }

    #[test]
    fn test_accel_pulls_tilt_back_to_level() {
        let mut e = estimator();
        for _ in 0..320 {
            e.update_gyro(gyro_raw(200.0, 0.0, 0.0));
        }
        let tilted = e.attitude().roll.to_f32();
        assert!(tilted > 0.3, "tilt {}", tilted);
        for _ in 0..3200 {
            e.update_gyro([0, 0, 0]);
            e.update_accel(level_accel());
        }
        let after = e.attitude().roll.to_f32();
        // 0.00002 rad per sample at most
        assert!(after < tilted - 0.05, "before {} after {}", tilted, after);
        assert!(after >= tilted - 0.0641, "before {} after {}", tilted, after);
    }

    #[test]
    fn test_zero_accel_is_skipped() {
        let mut e = estimator();
        e.update_accel([0, 0, 0]);
        let q = e.attitude().quaternion;
        assert!((q.norm() - 1.0).abs() < 1e-6);
        assert_eq!(q, Quaternion::identity());
    }

    #[test]
    fn test_vertical_accel_at_rest_is_one_g() {
        let mut e = estimator();
        for _ in 0..200 {
            e.update_gyro([0, 0, 0]);
            e.update_accel(level_accel());
        }
        let v = e.navigation().vertical_accel.to_f32();
        assert!((v - 9.81).abs() < 0.05, "vertical accel {}", v);
    }

    #[test]
    fn test_mag_heading_drives_combined_heading() {
        let mut e = estimator();
        // nose east: north is on the left
        let east = MagSample {
            field: [0, -400, 300],
        };
        e.update_mag(&east);
        let a = e.attitude();
        let expected = core::f32::consts::FRAC_PI_2 + 0.05643;
        assert!((a.mag_heading.to_f32() - expected).abs() < 1e-3);
        assert!((a.heading.to_f32() - expected).abs() < 1e-3);
        assert_eq!(a.yaw, Fix32::ZERO);
    }

    #[test]
    fn test_baro_seeds_and_tracks_altitude() {
        let mut e = estimator();
        let sea = crate::sensors::baro::hpa_from_altitude(100.0);
        let sample = BaroSample {
            pressure_raw: libm::roundf(sea * 100.0) as i32,
            temperature_raw: 0,
        };
        e.update_baro(&sample);
        let alt = e.navigation().altitude.to_f32();
        assert!((alt - 100.0).abs() < 0.2, "altitude {}", alt);
    }

    #[test]
    fn test_gps_updates_velocity_and_position() {
        let mut e = estimator();
        let fix = GpsFix {
            lat_e7: 480_000_000,
            lon_e7: 110_000_000,
            alt_mm: 500_000,
            vel_n_mm_s: 2000,
            fix_type: FixType::Fix3d,
            satellites: 12,
            ..Default::default()
        };
        for _ in 0..100 {
            e.update_gps(&fix);
        }
        let nav = e.navigation();
        assert!((nav.north_velocity.to_f32() - 2.0).abs() < 0.05);
        assert_eq!(nav.position, Some(GeoPoint::new(480_000_000, 110_000_000)));
        assert!((nav.altitude.to_f32() - 500.0).abs() < 0.5);

        let lost = GpsFix {
            fix_type: FixType::NoFix,
            ..fix
        };
        e.update_gps(&lost);
        assert_eq!(e.navigation().position, None);
        assert!((e.navigation().north_velocity.to_f32() - 2.0).abs() < 0.05);
    }

    /// Level board, accelerometer reading 1 % high, steady baro at 100 m;
    /// `fixes` 3D solutions at 10 Hz before the receiver goes quiet
    fn climb_rate_after(fixes: usize, seconds: usize) -> (Estimator, f32) {
        let mut e = estimator();
        let sea = crate::sensors::baro::hpa_from_altitude(100.0);
        let baro = BaroSample {
            pressure_raw: libm::roundf(sea * 100.0) as i32,
            temperature_raw: 0,
        };
        let fix = GpsFix {
            alt_mm: 100_000,
            fix_type: FixType::Fix3d,
            satellites: 10,
            ..Default::default()
        };
        for i in 0..seconds * 3200 {
            if i % 320 == 0 && i / 320 < fixes {
                e.update_gps(&fix);
            }
            if i % 64 == 0 {
                e.update_baro(&baro);
            }
            e.update_gyro([0, 0, 0]);
            e.update_accel([0, 0, 2068]);
        }
        let climb = e.navigation().vertical_velocity.to_f32();
        (e, climb)
    }

    #[test]
    fn test_silent_gps_hands_climb_rate_back_to_baro() {
        let (_, baro_only) = climb_rate_after(0, 10);
        let (e, silent) = climb_rate_after(1, 10);
        assert!(baro_only.abs() < 0.5, "baro only {}", baro_only);
        assert!(
            (silent - baro_only).abs() < 0.05,
            "silent gps {} baro only {}",
            silent,
            baro_only
        );
        let nav = e.navigation();
        assert_eq!(nav.position, None);
        assert_eq!(nav.fix_type, FixType::NoFix);
    }

    #[test]
    fn test_regular_fixes_keep_position() {
        let (e, _) = climb_rate_after(usize::MAX, 2);
        let nav = e.navigation();
        assert_eq!(nav.position, Some(GeoPoint::new(0, 0)));
        assert_eq!(nav.fix_type, FixType::Fix3d);

        // just inside the timeout after the last of ten fixes
        let (e, _) = climb_rate_after(10, 1);
        assert!(e.navigation().position.is_some());
        let (e, _) = climb_rate_after(10, 2);
        assert_eq!(e.navigation().position, None);
    }
}
