//! Device-level hysteresis scenarios.

use ferrocap_core::{Direction, ParameterSet, TurningPoint};
use ferrocap_devices::{Error, FerroCapacitor, HistoryCheckpoint, Waveform};

fn moderate() -> ParameterSet {
    ParameterSet {
        slope_factor: 4.0,
        thickness: 1e-8,
        saturation_charge: 0.2,
        relative_permittivity: 30.0,
        ..ParameterSet::default()
    }
}

/// Voltages from `from` towards each extremum in turn, `step` apart, always
/// landing exactly on the extrema.
fn path(extrema: &[f64], step: f64) -> Vec<f64> {
    let mut out = vec![extrema[0]];
    for w in extrema.windows(2) {
        let n = ((w[1] - w[0]).abs() / step).round().max(1.0) as usize;
        for i in 1..n {
            out.push(w[0] + (w[1] - w[0]) * i as f64 / n as f64);
        }
        out.push(w[1]);
    }
    out
}

#[test]
fn test_full_swing_scenario() {
    let params = ParameterSet::new(5e-9, 1e8, 300.0, 5e-6, 1e6).unwrap();
    let mut cap = FerroCapacitor::new("CFE1", params).unwrap();
    let drive = Waveform::triangle(3.0, 1);
    let steps_per_unit = 50;

    let mut depth_at = Vec::new();
    for i in 0..=5 * steps_per_unit {
        let t = i as f64 / steps_per_unit as f64;
        let r = cap.evaluate_at_voltage(drive.value_at(t)).unwrap();
        assert!(r.converged);
        assert!(r.capacitance > 0.0);
        if i % steps_per_unit == 0 {
            depth_at.push((t, cap.history().stack().len()));
        }
    }

    // t = 1: +3 V, t = 3: -3 V, t = 5: +3 V again.
    assert_eq!(depth_at[1], (1.0, 1));
    assert_eq!(depth_at[3], (3.0, 2), "one reversal stored at +3 V");
    assert_eq!(depth_at[5], (5.0, 1), "+3 V extremum wiped on return");
    assert_eq!(cap.history().reversals(), 2);

    let end = cap.evaluate_at_voltage(3.0).unwrap();
    let q_sat = params.saturation_charge + params.linear_capacitance() * 3.0;
    assert!((end.charge - q_sat).abs() < 1e-12, "Q(3 V) = {:e}", end.charge);
}

#[test]
fn test_round_trip_across_nested_minor_loops() {
    // Major loop, then a minor loop 2.0 / -0.8 with a nested 1.4 / 0.2 loop.
    let voltages = path(&[0.0, 3.0, -3.0, 2.0, -0.8, 1.4, 0.2, 2.6, -3.0], 0.05);

    let mut driven = FerroCapacitor::new("CFE1", moderate()).unwrap();
    let mut solved = FerroCapacitor::new("CFE2", moderate()).unwrap();
    let mut max_depth = 0;
    for &v in &voltages {
        let forward = driven.evaluate_at_voltage(v).unwrap();
        let inverse = solved.solve_for_charge(forward.charge).unwrap();
        assert!(inverse.converged, "no convergence at {} V", v);
        assert!(
            (inverse.voltage - v).abs() < 1e-6,
            "{} V recovered as {} V",
            v,
            inverse.voltage
        );
        assert!(
            (inverse.charge - forward.charge).abs() < 1e-9,
            "Q drifted at {} V",
            v
        );
        max_depth = max_depth.max(driven.history().stack().len());
    }
    assert!(max_depth >= 5, "nested loops reached depth {}", max_depth);
    assert!(driven.history().stack().len() <= 2);
}

#[test]
fn test_stack_stays_bounded_by_reversals() {
    let voltages = path(&[0.0, 2.0, -2.0, 1.5, -1.5, 1.0, -1.0, 0.5, -0.5], 0.1);
    let mut cap = FerroCapacitor::new("CFE1", moderate()).unwrap();
    for &v in &voltages {
        cap.evaluate_at_voltage(v).unwrap();
        let h = cap.history();
        assert!(h.stack().len() <= h.reversals() + 1);
        h.stack().validate().unwrap();
    }
    assert_eq!(cap.history().reversals(), 7);
    assert_eq!(cap.history().stack().len(), 8);
}

#[test]
fn test_non_convergent_solve_terminates() {
    let params = ParameterSet {
        slope_factor: 1e12,
        relative_permittivity: 1e-20,
        ..ParameterSet::default()
    };
    let mut cap = FerroCapacitor::new("CFE1", params).unwrap();
    let cap_iterations = cap.criteria().max_iterations;

    let r = cap.solve_for_charge(10.0 * params.saturation_charge).unwrap();
    assert!(!r.converged);
    assert!(r.iterations <= cap_iterations, "took {}", r.iterations);
    assert!(r.voltage.is_finite());
    // The failed solve is not accepted into the history.
    assert_eq!(cap.history().stack().len(), 1);
    assert_eq!(cap.history().last_voltage(), Some(0.0));
}

#[test]
fn test_checkpoint_resumes_identically() {
    let mut original = FerroCapacitor::new("CFE1", moderate()).unwrap();
    for &v in &path(&[0.0, 2.5, -1.0, 1.2, 0.1], 0.1) {
        original.evaluate_at_voltage(v).unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("cfe1.json");
    original.checkpoint().save(&file).unwrap();

    let mut resumed = FerroCapacitor::new("CFE1", moderate()).unwrap();
    resumed.restore(HistoryCheckpoint::load(&file).unwrap()).unwrap();
    assert_eq!(
        resumed.history().stack().points(),
        original.history().stack().points()
    );
    assert_eq!(resumed.history().reversals(), original.history().reversals());

    for &v in &path(&[0.1, 1.8, -2.0, 0.7], 0.1) {
        let a = original.evaluate_at_voltage(v).unwrap();
        let b = resumed.evaluate_at_voltage(v).unwrap();
        assert_eq!(a, b, "diverged at {} V", v);
    }
    assert_eq!(resumed.history().reversals(), original.history().reversals());
}

#[test]
fn test_rejected_checkpoint_keeps_history() {
    let mut cap = FerroCapacitor::new("CFE1", moderate()).unwrap();
    for v in [0.0, 1.0, -1.0] {
        cap.evaluate_at_voltage(v).unwrap();
    }
    let before = cap.checkpoint();

    let mut broken = before.clone();
    broken.points[1].direction = broken.points[0].direction;
    assert!(cap.restore(broken).is_err());
    assert_eq!(cap.checkpoint(), before);
}

#[test]
fn test_checkpoint_must_leave_last_sample_on_active_leg() {
    let params = moderate();
    let point = |voltage: f64, direction: Direction, polarization: f64| TurningPoint {
        voltage,
        direction,
        polarization,
    };
    let falling_from_two = HistoryCheckpoint {
        polarity: Direction::Up,
        points: vec![
            point(0.0, Direction::Up, -0.15),
            point(2.0, Direction::Down, 0.19),
        ],
        last_voltage: Some(2.0),
        reversals: None,
    };

    let mut cap = FerroCapacitor::new("CFE1", params).unwrap();
    for v in [0.0, 1.0] {
        cap.evaluate_at_voltage(v).unwrap();
    }
    let before = cap.checkpoint();

    // Sitting on the turning point itself: no falling sample was ever seen.
    let err = cap.restore(falling_from_two.clone()).unwrap_err();
    assert!(matches!(err, Error::Checkpoint(_)), "{}", err);

    // Behind the turning point on the falling leg.
    let mut above = falling_from_two.clone();
    above.last_voltage = Some(2.5);
    assert!(matches!(cap.restore(above), Err(Error::Checkpoint(_))));

    // Origin leaving against the declared polarity.
    let mut flipped = falling_from_two.clone();
    flipped.polarity = Direction::Down;
    flipped.last_voltage = Some(1.0);
    assert!(matches!(cap.restore(flipped), Err(Error::Checkpoint(_))));

    assert_eq!(cap.checkpoint(), before);

    // A consistent payload resumes on the falling leg and counts real
    // reversals only.
    let mut valid = falling_from_two;
    valid.last_voltage = Some(1.0);
    cap.restore(valid).unwrap();
    assert_eq!(cap.history().reversals(), 1);

    cap.evaluate_at_voltage(0.5).unwrap();
    assert_eq!(cap.history().reversals(), 1);
    assert_eq!(cap.history().direction(), Direction::Down);

    cap.evaluate_at_voltage(2.5).unwrap();
    assert_eq!(cap.history().reversals(), 2);
    assert_eq!(cap.history().stack().len(), 1, "2.0 V maximum wiped at 2.5 V");
    for p in cap.history().stack().points() {
        assert!(p.voltage <= 2.0);
    }
}

#[test]
fn test_response_depends_on_extrema_not_drive_shape() {
    let triangle = Waveform::triangle(2.5, 2);
    let sine = Waveform::sine_sweep(2.5);
    let mut a = FerroCapacitor::new("CFE1", moderate()).unwrap();
    let mut b = FerroCapacitor::new("CFE2", moderate()).unwrap();

    let steps_per_unit = 40;
    for i in 0..=9 * steps_per_unit {
        let t = i as f64 / steps_per_unit as f64;
        let qa = a.evaluate_at_voltage(triangle.value_at(t)).unwrap();
        let qb = b.evaluate_at_voltage(sine.value_at(t)).unwrap();
        if i % (2 * steps_per_unit) == steps_per_unit {
            // t = 1, 3, 5, 7, 9: both drives sit on the same extremum.
            assert!(
                (qa.charge - qb.charge).abs() < 1e-9,
                "t = {}: {:e} vs {:e}",
                t,
                qa.charge,
                qb.charge
            );
        }
    }
    assert_eq!(a.history().reversals(), b.history().reversals());
}
