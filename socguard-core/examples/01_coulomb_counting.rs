//! Coulomb Counting Example
//!
//! Shows how the counter integrates current, compensates for temperature
//! and recalibrates itself whenever the bank reaches saturation.
//!
//! ## What You'll Learn
//!
//! - Charge deficit `delta_q` vs SOC
//! - Coulombic efficiency on charge
//! - Capacity change with temperature
//! - Saturation top-off
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_coulomb_counting
//! ```

use socguard_core::{chemistry::Chemistry, coulomb::CoulombCounter};

fn main() {
    println!("SocGuard Coulomb Counting Example");
    println!("=================================\n");

    let chem = Chemistry::battleborn().unwrap();
    let mut cc = CoulombCounter::new(100.0, 0.017).unwrap();
    cc.count_coulombs(&chem, 1.0, true, 25.0, 0.0, false);

    // Discharge 10 A for an hour
    println!("1. Discharge 10 A for 1 h at 25°C");
    for _ in 0..3600 {
        cc.count_coulombs(&chem, 1.0, false, 25.0, -10.0, false);
    }
    println!("   delta_q = {:.0} C, SOC = {:.4}\n", cc.delta_q(), cc.soc());

    // Charge it back, efficiency loses a little
    println!("2. Charge 10 A for 1 h (efficiency {})", chem.capacity.coulombic_efficiency);
    for _ in 0..3600 {
        cc.count_coulombs(&chem, 1.0, false, 25.0, 10.0, false);
    }
    println!("   delta_q = {:.1} C, SOC = {:.5}\n", cc.delta_q(), cc.soc());

    // Cool the bank; the limiter slews at 0.017 °C/s
    println!("3. Rest while the bank cools to 5°C");
    for minute in 0..=30 {
        for _ in 0..60 {
            cc.count_coulombs(&chem, 1.0, false, 5.0, 0.0, false);
        }
        if minute % 10 == 0 {
            println!(
                "   t = {:2} min  T_lim = {:5.2}°C  capacity = {:6.2} Ah  SOC = {:.4}",
                minute + 1,
                cc.temperature_limited(),
                cc.q_capacity() / 3600.0,
                cc.soc()
            );
        }
    }
    println!();

    // Saturation while charging snaps the counter to full
    println!("4. Saturation detected while charging");
    let soc = cc.count_coulombs(&chem, 1.0, false, 5.0, 20.0, true);
    println!("   SOC = {soc:.4}, delta_q = {:.1} C", cc.delta_q());

    let (delta_q, t_last) = cc.update();
    println!("\nRetained for NVM: delta_q = {delta_q:.1} C, t_last = {t_last:.2}°C");
}
