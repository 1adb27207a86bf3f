//! Monitor Replay Example
//!
//! Runs the full estimator over a synthetic day: an evening discharge, a
//! night rest and a morning charge to saturation. Prints the blended SOC
//! next to its Coulomb and EKF components, then shows the retained state an
//! embedded host would write to flash.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 03_monitor_replay
//! ```

use socguard_core::{
    chemistry::{Chemistry, ChemistryId},
    monitor::{EstimatorConfig, Monitor, MonitorInput},
    voltage::BatteryModel,
};

const DT: f64 = 10.0;

fn main() {
    println!("SocGuard Monitor Replay Example");
    println!("===============================\n");

    let config = EstimatorConfig::default()
        .with_bank(100.0, 4, 1)
        .with_saturation_delay(30.0, 60.0);
    let mut monitor = Monitor::for_chemistry(ChemistryId::Battleborn, config).unwrap();

    // Plant: the same model, with a true SOC the estimator does not see
    let chem = Chemistry::battleborn().unwrap();
    let plant = BatteryModel::new(4, 1).unwrap();
    let mut true_soc: f64 = 0.9;
    let capacity_c = 100.0 * 3600.0;

    let soc0 = monitor
        .init_soc_from_voltage(plant.voc(&chem, true_soc, 20.0), 20.0, 0.0)
        .unwrap();
    println!("Initialised from rested voltage: SOC {soc0:.3} (true {true_soc:.3})\n");

    let phases = [("discharge", -25.0, 4.0), ("rest", 0.0, 8.0), ("charge", 30.0, 4.0)];
    println!(" phase       t[h]   true    soc    cc     ekf    Vmeas   sat");
    let mut t = 0.0;
    for (name, current, hours) in phases {
        let steps = (hours * 3600.0 / DT) as usize;
        for k in 0..steps {
            true_soc = (true_soc + current * DT / capacity_c).clamp(0.0, 1.0);
            let mut vb = plant.terminal_voltage_at(&chem, true_soc, 20.0, current, 0.0);
            if true_soc >= 1.0 {
                // absorption: charger holds the bank above saturation
                vb = vb.max(plant.saturation_voltage(&chem, 20.0) + 0.4);
            }
            let out = monitor
                .step(&MonitorInput::new(DT, 20.0, current, vb))
                .unwrap();
            t += DT;
            if k % 180 == 0 || k + 1 == steps {
                println!(
                    " {name:<10} {:5.2}  {true_soc:.3}  {:.3}  {:.3}  {:.3}  {vb:6.2}  {}",
                    t / 3600.0,
                    out.soc,
                    out.soc_coulomb,
                    out.soc_ekf,
                    out.is_saturated
                );
            }
        }
    }

    let retained = monitor.retained();
    println!("\nRetained state: {retained:?}");
}
