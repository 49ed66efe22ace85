//! Benchmarks for device evaluation.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ferrocap_core::ParameterSet;
use ferrocap_devices::{FerroCapacitor, Waveform};

fn moderate() -> ParameterSet {
    ParameterSet {
        slope_factor: 4.0,
        thickness: 1e-8,
        saturation_charge: 0.2,
        relative_permittivity: 30.0,
        ..ParameterSet::default()
    }
}

fn bench_voltage_sweep(c: &mut Criterion) {
    let drive = Waveform::triangle(3.0, 4);
    let times: Vec<f64> = (0..=1700).map(|i| i as f64 / 100.0).collect();

    c.bench_function("evaluate_1701_samples", |b| {
        let mut cap = FerroCapacitor::new("CFE1", moderate()).unwrap();
        b.iter(|| {
            cap.reset();
            for &t in &times {
                black_box(cap.evaluate_at_voltage(drive.value_at(t)).unwrap());
            }
        });
    });
}

fn bench_charge_sweep(c: &mut Criterion) {
    let params = moderate();
    let peak = params.saturation_charge + params.linear_capacitance() * 3.0;
    let drive = Waveform::triangle(peak, 1);
    let times: Vec<f64> = (0..=500).map(|i| i as f64 / 100.0).collect();

    c.bench_function("solve_501_charges", |b| {
        let mut cap = FerroCapacitor::new("CFE1", params).unwrap();
        b.iter(|| {
            cap.reset();
            for &t in &times {
                black_box(cap.solve_for_charge(drive.value_at(t)).unwrap());
            }
        });
    });
}

fn bench_nested_minor_loops(c: &mut Criterion) {
    let extrema = [0.0, 3.0, -3.0, 2.0, -1.5, 1.2, -0.6, 0.8, 0.0, 2.5];
    c.bench_function("evaluate_nested_minor_loops", |b| {
        let mut cap = FerroCapacitor::new("CFE1", moderate()).unwrap();
        b.iter(|| {
            cap.reset();
            for &v in &extrema {
                black_box(cap.evaluate_at_voltage(v).unwrap());
            }
        });
    });
}

criterion_group!(
    benches,
    bench_voltage_sweep,
    bench_charge_sweep,
    bench_nested_minor_loops
);
criterion_main!(benches);
