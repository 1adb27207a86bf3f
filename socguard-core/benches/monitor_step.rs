//! Per-cycle cost of the estimator and its hot components

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use socguard_core::{
    chemistry::{Chemistry, ChemistryId},
    monitor::{EstimatorConfig, Monitor, MonitorInput},
    voltage::BatteryModel,
};

fn monitor_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("monitor");
    for id in [ChemistryId::Battleborn, ChemistryId::Chins] {
        let config = EstimatorConfig::default().with_bank(100.0, 4, 2);
        let mut monitor = Monitor::for_chemistry(id, config).unwrap();
        let input = MonitorInput::new(1.0, 22.0, -35.0, 52.6).with_chemistry(id);
        monitor.step(&input).unwrap();
        group.bench_function(id.name(), |b| {
            b.iter(|| monitor.step(black_box(&input)).unwrap())
        });
    }
    group.finish();
}

fn ocv_lookup(c: &mut Criterion) {
    let chem = Chemistry::battleborn().unwrap();
    let model = BatteryModel::new(4, 2).unwrap();
    c.bench_function("ocv_forward", |b| {
        b.iter(|| model.voc(&chem, black_box(0.63), black_box(17.5)))
    });
    c.bench_function("ocv_reverse", |b| {
        b.iter(|| model.soc_from_voc(&chem, black_box(52.7), black_box(17.5)))
    });
}

criterion_group!(benches, monitor_step, ocv_lookup);
criterion_main!(benches);
