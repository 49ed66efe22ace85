//! Drive waveforms for voltage or charge sweeps.

use std::f64::consts::PI;

/// A time-varying drive specification.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Waveform {
    /// Sinusoid: `offset + amplitude * sin(2π * freq * (t - delay) + phase)`.
    ///
    /// - `phase` is in degrees
    /// - the waveform holds `offset` before `delay`
    Sin {
        offset: f64,
        amplitude: f64,
        freq: f64,
        delay: f64,
        phase: f64,
    },

    /// Piecewise linear through `(time, value)` points sorted by time.
    Pwl { points: Vec<(f64, f64)> },
}

impl Waveform {
    /// Undelayed sinusoid with zero phase.
    pub fn sin(offset: f64, amplitude: f64, freq: f64) -> Self {
        Waveform::Sin {
            offset,
            amplitude,
            freq,
            delay: 0.0,
            phase: 0.0,
        }
    }

    pub fn pwl(points: Vec<(f64, f64)>) -> Self {
        Waveform::Pwl { points }
    }

    /// Sinusoid with the timing of [`triangle`](Self::triangle): 0 at
    /// t = 0, `+amplitude` at t = 1, `-amplitude` at t = 3, and a period of
    /// four time units.
    pub fn sine_sweep(amplitude: f64) -> Self {
        Waveform::Sin {
            offset: 0.0,
            amplitude,
            freq: 0.25,
            delay: 0.0,
            phase: 0.0,
        }
    }

    /// Triangle sweep starting at 0 and ending at `+amplitude`.
    ///
    /// The first leg rises to `+amplitude` in one time unit; every later leg
    /// swings between `±amplitude` in two, so each cycle takes four units:
    ///
    /// ```text
    /// cycles = 1:  0 → +A → -A → +A   over t ∈ [0, 5]
    /// ```
    pub fn triangle(amplitude: f64, cycles: usize) -> Self {
        let mut points = Vec::with_capacity(2 + 2 * cycles);
        points.push((0.0, 0.0));
        points.push((1.0, amplitude));
        let mut t = 1.0;
        for _ in 0..cycles {
            t += 2.0;
            points.push((t, -amplitude));
            t += 2.0;
            points.push((t, amplitude));
        }
        Waveform::Pwl { points }
    }

    /// Value at time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        match self {
            Waveform::Sin {
                offset,
                amplitude,
                freq,
                delay,
                phase,
            } => {
                if t < *delay {
                    return *offset;
                }
                let arg = 2.0 * PI * freq * (t - delay) + phase * PI / 180.0;
                offset + amplitude * arg.sin()
            }
            Waveform::Pwl { points } => eval_pwl(points, t),
        }
    }

    /// Time of the last PWL point, or `None` for periodic drives.
    pub fn duration(&self) -> Option<f64> {
        match self {
            Waveform::Pwl { points } => points.last().map(|(t, _)| *t),
            _ => None,
        }
    }

    /// Breakpoint times of a PWL drive. Samples placed on them hit every
    /// extremum exactly.
    pub fn breakpoints(&self) -> Vec<f64> {
        match self {
            Waveform::Pwl { points } => points.iter().map(|(t, _)| *t).collect(),
            _ => Vec::new(),
        }
    }
}

fn eval_pwl(points: &[(f64, f64)], t: f64) -> f64 {
    let (Some(&(t_first, v_first)), Some(&(t_last, v_last))) = (points.first(), points.last())
    else {
        return 0.0;
    };
    if t <= t_first {
        return v_first;
    }
    if t >= t_last {
        return v_last;
    }

    for w in points.windows(2) {
        let (t0, v0) = w[0];
        let (t1, v1) = w[1];
        if t >= t0 && t <= t1 {
            if t == t1 {
                return v1;
            }
            let frac = (t - t0) / (t1 - t0);
            return v0 + frac * (v1 - v0);
        }
    }
    v_last
}
