//! Point-mass quadcopter adapter.
//!
//! No attitude dynamics: the frame stays level and either follows the
//! velocity guidance of the position/altitude controllers with a first-order
//! lag, or climbs and sinks on collective thrust alone. Sensor output is
//! synthesized in raw driver units with seeded Gaussian noise, so the whole
//! estimator runs exactly as it would on hardware.

use async_trait::async_trait;
use kolibri_core::ahrs::AhrsConfig;
use kolibri_core::motor::MotorOutputs;
use kolibri_core::sensors::baro::hpa_from_altitude;
use kolibri_core::sensors::{
    BaroSample, FixType, GeoPoint, GpsFix, MagSample, ACCEL_RAW_TO_M_PER_SEC2,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::adapter::capabilities::{SensorCapabilities, SimulatorCapabilities};
use crate::adapter::SimulatorAdapter;
use crate::error::SimulatorError;
use crate::types::{ActuatorCommands, SensorData, VelocityGuidance};

const GRAVITY: f32 = 9.81;

/// Configuration for the quad simulator.
#[derive(Debug, Clone)]
pub struct QuadConfig {
    /// Physics and gyro rate in Hz.
    pub rate_hz: u32,
    /// Take-off point.
    pub origin: GeoPoint,
    /// Ground height above mean sea level in meters.
    pub ground_altitude_m: f32,
    /// Average motor command that exactly balances gravity.
    pub hover_motor: f32,
    /// Time constant of the velocity response to guidance in seconds.
    pub response_time_s: f32,
    /// Horizontal velocity decay without guidance, 1/s.
    pub drag: f32,
    /// Gyro noise standard deviation in raw counts.
    pub gyro_noise: f32,
    /// Accelerometer noise standard deviation in raw counts.
    pub accel_noise: f32,
    /// Barometric altitude noise standard deviation in meters.
    pub baro_noise_m: f32,
    /// GPS position and altitude noise standard deviation in meters.
    pub gps_noise_m: f32,
    pub baro_rate_hz: u32,
    pub gps_rate_hz: u32,
    pub mag_rate_hz: u32,
    /// Horizontal and vertical earth field in raw magnetometer counts.
    pub mag_field: [f32; 2],
    /// Magnetic declination the flight loop is configured with, radians.
    pub declination_rad: f32,
    /// RNG seed for deterministic mode. None = random.
    pub seed: Option<u64>,
}

impl Default for QuadConfig {
    fn default() -> Self {
        Self {
            rate_hz: 3200,
            origin: GeoPoint::new(473_977_420, 85_455_940),
            ground_altitude_m: 420.0,
            hover_motor: 1000.0,
            response_time_s: 0.3,
            drag: 0.5,
            gyro_noise: 1.0,
            accel_noise: 2.0,
            baro_noise_m: 0.05,
            gps_noise_m: 0.1,
            baro_rate_hz: 50,
            gps_rate_hz: 10,
            mag_rate_hz: 75,
            mag_field: [400.0, 300.0],
            declination_rad: AhrsConfig::default().mag_declination.to_f32(),
            seed: None,
        }
    }
}

/// Kinematic state, north-east-up
#[derive(Debug, Clone, Default)]
struct VehicleState {
    north: f32,
    east: f32,
    height: f32,
    velocity: [f32; 3],
    accel: [f32; 3],
}

/// Point-mass quad with raw sensor synthesis.
pub struct QuadAdapter {
    config: QuadConfig,
    name: String,
    state: VehicleState,
    motors: MotorOutputs,
    guidance: Option<VelocityGuidance>,
    rng: StdRng,
    sim_time_us: u64,
    step_count: u64,
    pending: Option<SensorData>,
    connected: bool,
}

impl QuadAdapter {
    pub fn new(name: &str, config: QuadConfig) -> Self {
        let rng = seeded_rng(config.seed);
        Self {
            config,
            name: name.to_string(),
            state: VehicleState::default(),
            motors: MotorOutputs::disarmed(),
            guidance: None,
            rng,
            sim_time_us: 0,
            step_count: 0,
            pending: None,
            connected: false,
        }
    }

    /// Deterministic adapter with default physics.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(
            "quad",
            QuadConfig {
                seed: Some(seed),
                ..QuadConfig::default()
            },
        )
    }

    pub fn config(&self) -> &QuadConfig {
        &self.config
    }

    /// North and east offset from the origin in meters.
    pub fn position(&self) -> (f32, f32) {
        (self.state.north, self.state.east)
    }

    /// Height above ground in meters.
    pub fn height(&self) -> f32 {
        self.state.height
    }

    /// North, east, up velocity in m/s.
    pub fn velocity(&self) -> [f32; 3] {
        self.state.velocity
    }

    pub fn on_ground(&self) -> bool {
        self.state.height <= 0.0
    }

    pub fn motors(&self) -> &MotorOutputs {
        &self.motors
    }

    fn dt(&self) -> f32 {
        1.0 / self.config.rate_hz.max(1) as f32
    }

    fn integrate(&mut self) {
        let dt = self.dt();
        let previous = self.state.velocity;
        let mut v = previous;

        match self.guidance {
            Some(g) => {
                let k = (dt / self.config.response_time_s.max(dt)).min(1.0);
                v[0] += (g.north - v[0]) * k;
                v[1] += (g.east - v[1]) * k;
                v[2] += (g.vertical - v[2]) * k;
            }
            None => {
                let values = self.motors.values();
                let climb = if self.motors.is_stopped() {
                    -GRAVITY
                } else {
                    let mean = values.iter().map(|&m| m as f32).sum::<f32>() / 4.0;
                    GRAVITY * (mean / self.config.hover_motor - 1.0)
                };
                v[2] += climb * dt;
                let decay = (1.0 - self.config.drag * dt).max(0.0);
                v[0] *= decay;
                v[1] *= decay;
            }
        }

        self.state.north += v[0] * dt;
        self.state.east += v[1] * dt;
        self.state.height += v[2] * dt;
        if self.state.height <= 0.0 {
            self.state.height = 0.0;
            v[2] = v[2].max(0.0);
            if self.motors.is_stopped() {
                v[0] = 0.0;
                v[1] = 0.0;
            }
        }

        for axis in 0..3 {
            self.state.accel[axis] = (v[axis] - previous[axis]) / dt;
        }
        self.state.velocity = v;
    }

    fn synthesize_sensors(&mut self) -> SensorData {
        let accel = Some(self.synthesize_accel());
        let gyro = [
            self.noisy_count(0.0, self.config.gyro_noise),
            self.noisy_count(0.0, self.config.gyro_noise),
            self.noisy_count(0.0, self.config.gyro_noise),
        ];
        let baro = self
            .due(self.config.baro_rate_hz)
            .then(|| self.synthesize_baro());
        let gps = self.due(self.config.gps_rate_hz).then(|| self.synthesize_gps());
        let mag = self.due(self.config.mag_rate_hz).then(|| self.synthesize_mag());
        SensorData {
            timestamp_us: self.sim_time_us,
            gyro,
            accel,
            mag,
            baro,
            gps,
        }
    }

    /// Whether a sensor at `rate_hz` samples on this step
    fn due(&self, rate_hz: u32) -> bool {
        if rate_hz == 0 {
            return false;
        }
        let every = (self.config.rate_hz / rate_hz).max(1) as u64;
        self.step_count.is_multiple_of(every)
    }

    /// Level frame, nose north: body forward/right/down is north/east/down
    fn synthesize_accel(&mut self) -> [i16; 3] {
        let scale = ACCEL_RAW_TO_M_PER_SEC2.to_f32();
        let [an, ae, au] = self.state.accel;
        let forward = an / scale;
        let right = ae / scale;
        let down = -(GRAVITY + au) / scale;
        let noise = self.config.accel_noise;
        // sensor axes: x right, y forward, z up
        [
            self.noisy_count(right, noise),
            self.noisy_count(forward, noise),
            self.noisy_count(-down, noise),
        ]
    }

    fn synthesize_baro(&mut self) -> BaroSample {
        let altitude = self.config.ground_altitude_m
            + self.state.height
            + self.gaussian_noise(self.config.baro_noise_m);
        BaroSample {
            pressure_raw: (hpa_from_altitude(altitude) * 100.0).round() as i32,
            temperature_raw: 2_500,
        }
    }

    fn synthesize_gps(&mut self) -> GpsFix {
        let noise = self.config.gps_noise_m;
        let north = self.state.north + self.gaussian_noise(noise);
        let east = self.state.east + self.gaussian_noise(noise);
        let altitude =
            self.config.ground_altitude_m + self.state.height + self.gaussian_noise(noise);
        let position = self.config.origin.displaced(north, east);
        let [vn, ve, vu] = self.state.velocity;
        GpsFix {
            lat_e7: position.lat_e7,
            lon_e7: position.lon_e7,
            alt_mm: (altitude * 1000.0).round() as i32,
            vel_n_mm_s: (vn * 1000.0).round() as i32,
            vel_e_mm_s: (ve * 1000.0).round() as i32,
            vel_d_mm_s: (-vu * 1000.0).round() as i32,
            fix_type: FixType::Fix3d,
            satellites: 12,
        }
    }

    /// Earth field for a nose-north frame, magnetic north off by the
    /// declination
    fn synthesize_mag(&mut self) -> MagSample {
        let [horizontal, vertical] = self.config.mag_field;
        let d = self.config.declination_rad;
        MagSample {
            field: [
                (horizontal * d.cos()).round() as i16,
                (horizontal * d.sin()).round() as i16,
                vertical.round() as i16,
            ],
        }
    }

    fn noisy_count(&mut self, value: f32, stddev: f32) -> i16 {
        let v = value + self.gaussian_noise(stddev);
        v.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
    }

    /// Generate Gaussian noise using Box-Muller transform.
    fn gaussian_noise(&mut self, stddev: f32) -> f32 {
        if stddev == 0.0 {
            return 0.0;
        }
        let u1: f32 = self.rng.gen::<f32>().max(f32::EPSILON);
        let u2: f32 = self.rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
        z * stddev
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl std::fmt::Debug for QuadAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadAdapter")
            .field("name", &self.name)
            .field("connected", &self.connected)
            .field("sim_time_us", &self.sim_time_us)
            .field("height", &self.state.height)
            .finish()
    }
}

#[async_trait]
impl SimulatorAdapter for QuadAdapter {
    fn adapter_type(&self) -> &'static str {
        "quad"
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&mut self) -> Result<(), SimulatorError> {
        self.state = VehicleState::default();
        self.motors = MotorOutputs::disarmed();
        self.guidance = None;
        self.sim_time_us = 0;
        self.step_count = 0;
        self.pending = None;
        self.rng = seeded_rng(self.config.seed);
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SimulatorError> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn receive_sensors(&mut self) -> Result<Option<SensorData>, SimulatorError> {
        if !self.connected {
            return Err(SimulatorError::NotConnected);
        }
        Ok(self.pending.take())
    }

    async fn send_actuators(&mut self, commands: &ActuatorCommands) -> Result<(), SimulatorError> {
        if !self.connected {
            return Err(SimulatorError::NotConnected);
        }
        if let Some(g) = commands.guidance {
            if !(g.north.is_finite() && g.east.is_finite() && g.vertical.is_finite()) {
                return Err(SimulatorError::InvalidCommand(format!(
                    "non-finite guidance {:?}",
                    g
                )));
            }
        }
        self.motors = commands.motors;
        self.guidance = commands.guidance;
        Ok(())
    }

    async fn step(&mut self) -> Result<(), SimulatorError> {
        if !self.connected {
            return Err(SimulatorError::NotConnected);
        }
        self.integrate();
        self.sim_time_us += 1_000_000 / self.config.rate_hz.max(1) as u64;
        self.pending = Some(self.synthesize_sensors());
        self.step_count += 1;
        Ok(())
    }

    fn sim_time_us(&self) -> u64 {
        self.sim_time_us
    }

    fn capabilities(&self) -> SimulatorCapabilities {
        SimulatorCapabilities {
            sensors: SensorCapabilities::default(),
            max_rate_hz: self.config.rate_hz,
            velocity_guidance: true,
        }
    }
}
