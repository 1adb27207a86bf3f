//! Hysteresis Step Response Example
//!
//! Drives the hysteresis RC model with a charge/discharge square wave and
//! prints the resulting voltage, which is the difference between where an
//! LFP cell rests after charging and after discharging.
//!
//! ## What You'll Learn
//!
//! - RC charging toward the current-driven equilibrium
//! - Clamping at the SOC-dependent bounds
//! - Endpoint resets on saturation
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_hysteresis_response
//! ```

use socguard_core::{
    chemistry::{Chemistry, ChemistryId},
    hysteresis::Hysteresis,
};

fn run(id: ChemistryId) {
    let chem = Chemistry::for_id(id).unwrap();
    let mut hys = Hysteresis::new();
    let soc = 0.6;

    println!("{id}: dv bounds at SOC {soc}");
    for (label, current) in [("charge 20 A", 20.0), ("discharge 20 A", -20.0)] {
        for s in 0..=600 {
            hys.calculate_hys(&chem, current, soc);
            let dv = hys.update(1.0, false, false, None);
            if s % 150 == 0 {
                println!(
                    "   {label:<15} t = {s:3} s  dv_hys = {dv:+.4} V  R = {:.4} Ω  [{:+.3}, {:+.3}]",
                    hys.resistance(),
                    hys.dv_min(),
                    hys.dv_max()
                );
            }
        }
    }

    // Saturation tells the model exactly where it sits
    hys.calculate_hys(&chem, 5.0, 0.99);
    let dv = hys.update(1.0, true, false, Some(-0.08));
    println!("   saturation reset, measured offset 80 mV -> dv_hys = {dv:+.4} V\n");
}

fn main() {
    println!("SocGuard Hysteresis Example");
    println!("===========================\n");
    run(ChemistryId::Battleborn);
    run(ChemistryId::Chins);
}
