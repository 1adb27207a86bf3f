//! Bank profile generators
//!
//! A [`BankSimulator`] carries a "true" SOC, integrates the commanded current
//! and produces the terminal voltage the chemistry's own voltage model
//! predicts, plus sensor noise. Profiles are built from phases of constant
//! current so scenarios read like a duty cycle.

use socguard_core::{
    chemistry::{Chemistry, ChemistryId},
    constants::physics::COULOMBS_PER_AMP_HOUR,
    voltage::BatteryModel,
    MonitorInput,
};

use super::TestRng;

/// Constant-current segment of a profile
#[derive(Debug, Clone, Copy)]
pub struct Phase {
    /// Bank current (A, positive charging)
    pub current: f64,
    /// Length (s)
    pub duration_s: f64,
    /// Battery temperature (°C)
    pub temperature: f64,
}

impl Phase {
    pub fn charge(current: f64, duration_s: f64) -> Self {
        Self {
            current: current.abs(),
            duration_s,
            temperature: 25.0,
        }
    }

    pub fn discharge(current: f64, duration_s: f64) -> Self {
        Self {
            current: -current.abs(),
            duration_s,
            temperature: 25.0,
        }
    }

    pub fn rest(duration_s: f64) -> Self {
        Self {
            current: 0.0,
            duration_s,
            temperature: 25.0,
        }
    }

    pub fn at(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Synthetic bank producing measurements consistent with a chemistry
pub struct BankSimulator {
    chemistry: Chemistry,
    model: BatteryModel,
    capacity_c: f64,
    soc: f64,
    rng: TestRng,
    voltage_noise: f64,
    current_noise: f64,
}

impl BankSimulator {
    pub fn new(id: ChemistryId, capacity_ah: f64, series: u8, parallel: u8, soc: f64) -> Self {
        Self {
            chemistry: Chemistry::for_id(id).unwrap(),
            model: BatteryModel::new(series, parallel).unwrap(),
            capacity_c: capacity_ah * f64::from(parallel) * COULOMBS_PER_AMP_HOUR,
            soc,
            rng: TestRng::new(42),
            voltage_noise: 0.0,
            current_noise: 0.0,
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.rng = TestRng::new(seed);
        self
    }

    pub fn with_noise(mut self, voltage: f64, current: f64) -> Self {
        self.voltage_noise = voltage;
        self.current_noise = current;
        self
    }

    /// True SOC
    pub fn soc(&self) -> f64 {
        self.soc
    }

    /// Advance one step and return the measured input
    pub fn sample(&mut self, dt: f64, current: f64, temperature: f64) -> MonitorInput {
        self.soc = (self.soc + current * dt / self.capacity_c).clamp(0.0, 1.0);
        let vb = self
            .model
            .terminal_voltage_at(&self.chemistry, self.soc, temperature, current, 0.0)
            + self.rng.noise(self.voltage_noise);
        let measured_current = current + self.rng.noise(self.current_noise);
        MonitorInput::new(dt, temperature, measured_current, vb).with_chemistry(self.chemistry.id)
    }
}

/// Builds a sampled profile from phases
pub struct ProfileBuilder {
    dt: f64,
    phases: Vec<Phase>,
}

impl ProfileBuilder {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            phases: Vec::new(),
        }
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    /// Sample every phase through `bank`
    pub fn build(&self, bank: &mut BankSimulator) -> Vec<MonitorInput> {
        let mut inputs = Vec::new();
        for phase in &self.phases {
            let steps = (phase.duration_s / self.dt).round() as usize;
            for _ in 0..steps {
                inputs.push(bank.sample(self.dt, phase.current, phase.temperature));
            }
        }
        inputs
    }
}
