//! Property tests for the estimator building blocks
//!
//! - Table lookups are exact at breakpoints and clip outside them
//! - Reverse lookup inverts forward lookup on monotonic tables
//! - Hysteresis never leaves its SOC-dependent band
//! - EKF covariance stays finite, non-negative and bounded

use proptest::prelude::*;

use socguard_core::{
    chemistry::{Chemistry, ChemistryId},
    ekf::Ekf1x1,
    hysteresis::Hysteresis,
    lookup::{Table1D, Table2D},
    voltage::{BatteryModel, BatteryObservation},
};

/// Strictly increasing axis of `n` points starting at `start`
fn axis(n: usize) -> impl Strategy<Value = Vec<f64>> {
    (
        -100.0f64..100.0,
        prop::collection::vec(0.01f64..10.0, n - 1),
    )
        .prop_map(|(start, steps)| {
            let mut x = Vec::with_capacity(steps.len() + 1);
            x.push(start);
            for s in steps {
                let last = *x.last().unwrap_or(&start);
                x.push(last + s);
            }
            x
        })
}

fn table1d() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (2usize..16).prop_flat_map(|n| (axis(n), prop::collection::vec(-50.0f64..50.0, n)))
}

proptest! {
    #[test]
    fn table1d_exact_at_nodes((x, v) in table1d()) {
        let table = Table1D::new(&x, &v).unwrap();
        for (xi, vi) in x.iter().zip(&v) {
            prop_assert_eq!(table.interp(*xi), *vi);
        }
    }

    #[test]
    fn table1d_clips_outside((x, v) in table1d(), overshoot in 0.0f64..1e6) {
        let table = Table1D::new(&x, &v).unwrap();
        let n = x.len();
        prop_assert_eq!(table.interp(x[0] - overshoot), v[0]);
        prop_assert_eq!(table.interp(x[n - 1] + overshoot), v[n - 1]);
    }

    #[test]
    fn table1d_stays_within_neighbours((x, v) in table1d(), t in 0.0f64..1.0) {
        let table = Table1D::new(&x, &v).unwrap();
        let n = x.len();
        let q = x[0] + t * (x[n - 1] - x[0]);
        let y = table.interp(q);
        let lo = v.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(y >= lo - 1e-9 && y <= hi + 1e-9);
    }

    #[test]
    fn table2d_exact_at_nodes(
        nx in 2usize..8,
        ny in 2usize..6,
        seed in prop::collection::vec(-20.0f64..20.0, 48),
    ) {
        let x: Vec<f64> = (0..nx).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = (0..ny).map(|j| -10.0 + j as f64 * 7.5).collect();
        let v: Vec<f64> = seed.iter().take(nx * ny).cloned().collect();
        let table = Table2D::new(&x, &y, &v).unwrap();
        for j in 0..ny {
            for i in 0..nx {
                prop_assert_eq!(table.interp(x[i], y[j]), v[j * nx + i]);
            }
        }
        prop_assert_eq!(table.interp(-5.0, y[0]), v[0]);
        prop_assert_eq!(table.interp(x[nx - 1] + 5.0, y[ny - 1] + 100.0), v[nx * ny - 1]);
    }

    #[test]
    fn reverse_lookup_inverts_ocv(soc in 0.0f64..1.0, temp in 0.0f64..45.0) {
        for id in [ChemistryId::Battleborn, ChemistryId::Chins] {
            let chem = Chemistry::for_id(id).unwrap();
            let voc = chem.voltage.ocv.voc(soc, temp);
            let back = chem.voltage.ocv.soc_from_voc(voc, temp);
            prop_assert!((chem.voltage.ocv.voc(back, temp) - voc).abs() < 1e-8);
        }
    }

    #[test]
    fn hysteresis_stays_in_band(
        currents in prop::collection::vec(-300.0f64..300.0, 1..400),
        soc in 0.0f64..1.0,
        dt in 0.1f64..30.0,
    ) {
        for id in [ChemistryId::Battleborn, ChemistryId::Chins] {
            let chem = Chemistry::for_id(id).unwrap();
            let mut hys = Hysteresis::new();
            for &current in &currents {
                hys.calculate_hys(&chem, current, soc);
                hys.update(dt, false, false, None);
                prop_assert!(hys.dv_hys() <= hys.dv_max() + 1e-12);
                prop_assert!(hys.dv_hys() >= hys.dv_min() - 1e-12);
            }
        }
    }

    #[test]
    fn ekf_covariance_bounded(
        currents in prop::collection::vec(-100.0f64..100.0, 10..300),
        noise in prop::collection::vec(-0.05f64..0.05, 300),
        soc0 in 0.05f64..0.95,
    ) {
        let chem = Chemistry::battleborn().unwrap();
        let model = BatteryModel::new(1, 1).unwrap();
        let mut ekf = Ekf1x1::new(1e-6, 1e-2).unwrap();
        let p0 = 0.01;
        ekf.init(soc0, p0);
        let mut true_soc = soc0;
        for (k, &current) in currents.iter().enumerate() {
            true_soc = (true_soc + current / 360_000.0).clamp(0.0, 1.0);
            let z = model.terminal_voltage_at(&chem, true_soc, 25.0, current, 0.0) + noise[k];
            let mut obs = BatteryObservation {
                model: &model,
                chem: &chem,
                dt: 1.0,
                q_capacity: 360_000.0,
                coulombic_efficiency: 1.0,
                temp_c: 25.0,
                current,
                dv_hys: 0.0,
            };
            ekf.predict(&mut obs, current);
            ekf.update(&mut obs, z, 0.0, 1.0);
            prop_assert!(ekf.p().is_finite());
            prop_assert!(ekf.p() >= 0.0);
            prop_assert!(ekf.p() <= p0 + (k as f64 + 1.0) * 1e-6 + 1e-12);
            prop_assert!(ekf.x() >= 0.0 && ekf.x() <= 1.0);
        }
    }
}
