//! Estimator Orchestration
//!
//! ## Overview
//!
//! [`Monitor`] owns one of every component and runs them in a fixed order
//! once per control cycle:
//!
//! ```text
//!  MonitorInput ──► validate ──► CoulombCounter ──► EKF predict/update
//!                                     │                     │
//!                                     ▼                     │
//!                     saturation / low-anchor detection     │
//!                          │ init_high   │ init_low         │
//!                          ▼             ▼                  │
//!                        Hysteresis ◄── (apply floor SOC)   │
//!                          │                                │
//!                          ▼                                ▼
//!                     BatteryModel ──────────────► blend ──► MonitorOutput
//! ```
//!
//! ## Events
//!
//! A *reset event* is any of: the first cycle, an external reset, a rising
//! saturation edge, a rising low-anchor edge, or an explicit state assignment
//! ([`Monitor::init_soc_from_voltage`], [`Monitor::load`]). Reset events
//! re-initialise the EKF (where configured) and restart the blend schedule.
//!
//! Saturation detected in cycle `k` tops off the Coulomb counter in cycle
//! `k + 1`; the counter always sees the previous cycle's debounced flag.
//!
//! ## Determinism
//!
//! No clock reads, no randomness, no allocation. Two monitors fed the same
//! inputs from the same state produce bit-identical outputs.
//!
//! ```rust
//! use socguard_core::chemistry::ChemistryId;
//! use socguard_core::monitor::{EstimatorConfig, Monitor, MonitorInput};
//!
//! let mut monitor = Monitor::for_chemistry(ChemistryId::Battleborn, EstimatorConfig::default()).unwrap();
//! let out = monitor.step(&MonitorInput::new(1.0, 25.0, -10.0, 13.3)).unwrap();
//! assert!(out.soc >= 0.0 && out.soc <= 1.0);
//! ```

mod config;
mod io;
mod retained;

pub use config::{BankConfig, BlendConfig, EkfConfig, EstimatorConfig, LowAnchorConfig, SaturationConfig};
pub use io::{MonitorInput, MonitorOutput};
pub use retained::RetainedState;

use crate::chemistry::{Chemistry, ChemistryId};
use crate::coulomb::CoulombCounter;
use crate::ekf::Ekf1x1;
use crate::errors::{ConfigResult, InputResult};
use crate::filters::{EdgeDetector, LagFilter, TfDelay, Transition};
use crate::hysteresis::Hysteresis;
use crate::voltage::{BatteryModel, BatteryObservation};

/// Battery state estimator for one bank
#[derive(Debug, Clone)]
pub struct Monitor {
    config: EstimatorConfig,
    chemistry: Chemistry,
    /// Parameter set given at construction, restored when its id is selected again
    configured: Chemistry,
    counter: CoulombCounter,
    hysteresis: Hysteresis,
    model: BatteryModel,
    ekf: Ekf1x1,
    sat_delay: TfDelay,
    sat_edge: EdgeDetector,
    low_delay: TfDelay,
    low_edge: EdgeDetector,
    blend: LagFilter,
    saturated: bool,
    first_cycle: bool,
    pending_event: bool,
    output: MonitorOutput,
}

impl Monitor {
    /// Build a monitor; both arguments are validated here and never again
    pub fn new(config: EstimatorConfig, chemistry: Chemistry) -> ConfigResult<Self> {
        config.validate()?;
        chemistry.validate()?;

        let counter = CoulombCounter::new(config.bank.bank_capacity_ah(), config.temp_rate_limit)?
            .with_capacity_scalar(config.bank.capacity_scalar)?
            .with_tweak_test(config.tweak_test);
        let model = BatteryModel::new(config.bank.series_count, config.bank.parallel_count)?;
        let ekf = Ekf1x1::new(config.ekf.q, config.ekf.r)?;

        log_info!(
            "Monitor: {} bank {}S{}P, {} Ah per battery",
            chemistry.id,
            config.bank.series_count,
            config.bank.parallel_count,
            config.bank.rated_capacity_ah
        );

        Ok(Self {
            blend: LagFilter::new(config.blend.recovery_tau_s),
            config,
            configured: chemistry.clone(),
            chemistry,
            counter,
            hysteresis: Hysteresis::new(),
            model,
            ekf,
            sat_delay: TfDelay::new(),
            sat_edge: EdgeDetector::new(),
            low_delay: TfDelay::new(),
            low_edge: EdgeDetector::new(),
            saturated: false,
            first_cycle: true,
            pending_event: false,
            output: MonitorOutput::default(),
        })
    }

    /// Monitor with a built-in chemistry
    pub fn for_chemistry(id: ChemistryId, config: EstimatorConfig) -> ConfigResult<Self> {
        Self::new(config, Chemistry::for_id(id)?)
    }

    /// Run one control cycle.
    ///
    /// Invalid input is rejected before any state changes. A chemistry
    /// request in the input switches parameter sets before counting; without
    /// one the current set stays active.
    pub fn step(&mut self, input: &MonitorInput) -> InputResult<MonitorOutput> {
        input.validate()?;
        self.select_chemistry(input.chemistry);

        let dt = input.dt;
        let current = input.current;
        let vb = input.voltage;
        let reset = input.external_reset || self.first_cycle;

        // Coulomb counting against last cycle's saturation
        let soc_cc = self.counter.count_coulombs(
            &self.chemistry,
            dt,
            reset,
            input.temperature,
            current,
            self.saturated,
        );
        let temp = self.counter.temperature_limited();

        // EKF
        if reset || !self.ekf.is_tracking() {
            log_debug!("EKF initialised at {}", soc_cc);
            self.ekf.init(soc_cc, self.config.ekf.p0);
        } else {
            let efficiency = if self.config.tweak_test {
                1.0
            } else {
                self.chemistry.capacity.coulombic_efficiency
            };
            let mut observation = BatteryObservation {
                model: &self.model,
                chem: &self.chemistry,
                dt,
                q_capacity: self.counter.q_capacity(),
                coulombic_efficiency: efficiency,
                temp_c: temp,
                current,
                dv_hys: self.hysteresis.output(),
            };
            self.ekf.predict(&mut observation, current);
            self.ekf
                .update(&mut observation, vb, self.config.soc_min, self.config.soc_max);
        }

        // Static OCV estimate and endpoint detection
        let dynamic_drop = self.model.dynamic_drop(&self.chemistry, current);
        let voc_stat = vb - dynamic_drop - self.model.hysteresis_voltage(self.hysteresis.output());

        let sat_raw = voc_stat >= self.model.saturation_voltage(&self.chemistry, temp);
        let sat = self.sat_delay.calculate(
            sat_raw,
            self.config.saturation.t_true_s,
            self.config.saturation.t_false_s,
            dt,
            false,
        );
        let init_high = self.sat_edge.update(sat) == Transition::Rising;
        if init_high {
            log_info!("Saturation detected, voc_stat {}", voc_stat);
            if self.config.ekf.reinit_on_saturation {
                self.ekf.init(self.config.soc_max, self.config.ekf.p0);
            }
        }

        let mut init_low = false;
        if self.config.low_anchor.enabled {
            let low_raw = voc_stat <= self.chemistry.voltage.low_voc * self.model.series_count();
            let low = self.low_delay.calculate(
                low_raw,
                self.config.low_anchor.t_true_s,
                self.config.low_anchor.t_false_s,
                dt,
                false,
            );
            init_low = self.low_edge.update(low) == Transition::Rising;
            if init_low {
                let floor = self.counter.soc_floor();
                log_info!("Low anchor detected, voc_stat {}, SOC set to {}", voc_stat, floor);
                self.counter.apply_soc(&self.chemistry, floor, temp);
                if self.config.ekf.reinit_on_low_anchor {
                    self.ekf.init(self.counter.soc(), self.config.ekf.p0);
                }
            }
        }
        let soc_cc = self.counter.soc();

        // Hysteresis
        self.hysteresis.calculate_hys(&self.chemistry, current, soc_cc);
        let e_wrap = if self.config.hysteresis_e_wrap {
            let voc_model = self.model.voc(&self.chemistry, soc_cc, temp);
            Some((voc_model - (vb - dynamic_drop)) / self.model.series_count())
        } else {
            None
        };
        let dv_hys = self.hysteresis.update(dt, init_high, init_low, e_wrap);

        // Voltage model at the Coulomb SOC
        let vt = self
            .model
            .calculate(&self.chemistry, soc_cc, temp, current, dv_hys);

        // Blend
        let event = reset || self.pending_event || init_high || init_low;
        let blend = &self.config.blend;
        let w = if event {
            self.blend.calculate(blend.weight_after_reset, true, dt)
        } else {
            self.blend.calculate(blend.weight_tracking, false, dt)
        };
        let soc_ekf = self.ekf.x();
        let soc = (w * soc_cc + (1.0 - w) * soc_ekf)
            .max(self.config.soc_min)
            .min(self.config.soc_max);

        self.saturated = sat;
        self.first_cycle = false;
        self.pending_event = false;

        self.output = MonitorOutput {
            soc,
            soc_coulomb: soc_cc,
            soc_ekf,
            terminal_voltage_predicted: vt,
            open_circuit_voltage: self.model.open_circuit_voltage(),
            dynamic_drop: self.model.last_dynamic_drop(),
            hysteresis_voltage: self.model.last_hysteresis_voltage(),
            is_saturated: sat,
            ekf_covariance: self.ekf.p(),
            temperature_limited: temp,
            soc_floor: self.counter.soc_floor(),
            voc_stat,
            ekf_residual: self.ekf.residual(),
            blend_weight: w,
            q_capacity: self.counter.q_capacity(),
        };
        Ok(self.output)
    }

    /// Estimate SOC from a rested terminal voltage and apply it.
    ///
    /// The dynamic drop for `current` and the present hysteresis are removed
    /// before the OCV curve is inverted. Returns the SOC found; `NaN` (state
    /// untouched) if the curve cannot be inverted.
    pub fn init_soc_from_voltage(&mut self, voltage: f64, temperature: f64, current: f64) -> InputResult<f64> {
        io::validate_measurements(temperature, current, voltage)?;

        let voc = voltage
            - self.model.dynamic_drop(&self.chemistry, current)
            - self.model.hysteresis_voltage(self.hysteresis.output());
        let soc = self.model.soc_from_voc(&self.chemistry, voc, temperature);
        if soc.is_nan() {
            log_warn!("No SOC found for voc {} at {} C, state kept", voc, temperature);
            return Ok(soc);
        }

        self.counter.apply_soc(&self.chemistry, soc, temperature);
        self.ekf.init(self.counter.soc(), self.config.ekf.p0);
        self.pending_event = true;
        log_info!("SOC initialised from voltage {}: {}", voltage, self.counter.soc());
        Ok(self.counter.soc())
    }

    /// Restore retained state after power-up
    pub fn load(&mut self, state: &RetainedState) -> InputResult<()> {
        state.validate()?;
        self.counter.load(state.delta_q, state.t_last);
        self.hysteresis.load(state.dv_hys);
        if state.has_ekf() {
            self.ekf.init(state.soc_ekf, state.ekf_covariance);
        }
        self.first_cycle = false;
        self.pending_event = true;
        Ok(())
    }

    /// State to persist across power cycles
    pub fn retained(&self) -> RetainedState {
        let (delta_q, t_last) = self.counter.update();
        RetainedState {
            delta_q,
            t_last,
            dv_hys: self.hysteresis.dv_hys(),
            soc_ekf: if self.ekf.is_tracking() { self.ekf.x() } else { f64::NAN },
            ekf_covariance: self.ekf.p(),
        }
    }

    fn select_chemistry(&mut self, requested: Option<ChemistryId>) {
        let id = match requested {
            Some(id) if id != self.chemistry.id => id,
            _ => return,
        };
        if id == self.configured.id {
            log_info!("Chemistry changed {} -> {} (configured)", self.chemistry.id, id);
            self.chemistry = self.configured.clone();
            return;
        }
        match Chemistry::for_id(id) {
            Ok(chemistry) => {
                log_info!("Chemistry changed {} -> {}", self.chemistry.id, id);
                self.chemistry = chemistry;
            }
            Err(_e) => {
                log_warn!("Chemistry {} unavailable ({}), keeping {}", id, _e, self.chemistry.id);
            }
        }
    }

    /// Output of the last successful step
    pub fn last_output(&self) -> &MonitorOutput {
        &self.output
    }

    /// Active configuration
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Active chemistry
    pub fn chemistry(&self) -> &Chemistry {
        &self.chemistry
    }

    /// Coulomb counter
    pub fn counter(&self) -> &CoulombCounter {
        &self.counter
    }

    /// Hysteresis model
    pub fn hysteresis(&self) -> &Hysteresis {
        &self.hysteresis
    }

    /// Voltage model
    pub fn model(&self) -> &BatteryModel {
        &self.model
    }

    /// EKF
    pub fn ekf(&self) -> &Ekf1x1 {
        &self.ekf
    }

    /// Debounced saturation from the last step
    pub fn is_saturated(&self) -> bool {
        self.saturated
    }
}
