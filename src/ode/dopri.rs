//! Adaptive Dormand-Prince 5(4) integrator.
//!
//! - explicit embedded pair with FSAL (the last stage of an accepted step is the
//!   first stage of the next one)
//! - mixed absolute/relative RMS error norm
//! - every accepted step is stored with its derivative so the solution can be
//!   sampled anywhere with cubic Hermite interpolation

use log::debug;
use nalgebra::DVector;

use crate::error::AppError;

// Butcher tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// Fifth-order weights (also the seventh stage row).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between the fifth- and fourth-order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct IntegratorSettings {
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
    /// Initial step; estimated from the problem when `None`.
    pub first_step: Option<f64>,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-6,
            max_steps: 100_000,
            first_step: None,
        }
    }
}

/// Accepted steps of an integration.
#[derive(Debug, Clone)]
pub struct OdeSolution {
    pub times: Vec<f64>,
    pub states: Vec<DVector<f64>>,
    pub derivatives: Vec<DVector<f64>>,
    pub rejected_steps: usize,
    pub evaluations: usize,
}

impl OdeSolution {
    pub fn accepted_steps(&self) -> usize {
        self.times.len().saturating_sub(1)
    }

    pub fn final_state(&self) -> Option<&DVector<f64>> {
        self.states.last()
    }

    /// State at `t` by cubic Hermite interpolation, `None` outside the span.
    pub fn sample(&self, t: f64) -> Option<DVector<f64>> {
        let first = *self.times.first()?;
        let last = *self.times.last()?;
        if t < first || t > last {
            return None;
        }
        if t == last {
            return self.states.last().cloned();
        }

        // First index with time > t; t lies in [times[i], times[i+1]).
        let i = self.times.partition_point(|&ti| ti <= t).saturating_sub(1);
        let h = self.times[i + 1] - self.times[i];
        let s = (t - self.times[i]) / h;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        Some(
            &self.states[i] * h00
                + &self.derivatives[i] * (h10 * h)
                + &self.states[i + 1] * h01
                + &self.derivatives[i + 1] * (h11 * h),
        )
    }
}

/// Integrate `y' = rhs(t, y)` from `t0` to `t1` (`t1 > t0`).
pub fn integrate<F>(
    mut rhs: F,
    t0: f64,
    t1: f64,
    y0: DVector<f64>,
    settings: &IntegratorSettings,
) -> Result<OdeSolution, AppError>
where
    F: FnMut(f64, &DVector<f64>) -> DVector<f64>,
{
    if !(t0.is_finite() && t1.is_finite()) || t1 <= t0 {
        return Err(AppError::input(format!("Invalid integration span [{t0}, {t1}].")));
    }
    if !(settings.rtol > 0.0 && settings.atol >= 0.0) {
        return Err(AppError::input(format!(
            "Tolerances must satisfy rtol > 0 and atol >= 0 (got rtol={}, atol={}).",
            settings.rtol, settings.atol
        )));
    }
    if y0.iter().any(|v| !v.is_finite()) {
        return Err(AppError::input("Initial state is not finite."));
    }

    let mut evaluations = 0;
    let mut eval = |t: f64, y: &DVector<f64>| {
        evaluations += 1;
        rhs(t, y)
    };

    let f0 = eval(t0, &y0);
    let mut h = match settings.first_step {
        Some(h) if h > 0.0 => h,
        _ => initial_step(&mut eval, t0, &y0, &f0, settings),
    }
    .min(t1 - t0);

    let mut sol = OdeSolution {
        times: vec![t0],
        states: vec![y0.clone()],
        derivatives: vec![f0.clone()],
        rejected_steps: 0,
        evaluations: 0,
    };

    let mut t = t0;
    let mut y = y0;
    let mut k1 = f0;
    let mut last_rejected = false;

    while t < t1 {
        if sol.accepted_steps() + sol.rejected_steps >= settings.max_steps {
            return Err(AppError::numeric(format!(
                "Integration stopped at t={t:.6e} after {} steps (max_steps reached).",
                settings.max_steps
            )));
        }
        if h <= 16.0 * f64::EPSILON * t.abs().max(1e-300) {
            return Err(AppError::numeric(format!("Step size underflow at t={t:.6e}.")));
        }

        let last_step = t + h >= t1;
        if last_step {
            h = t1 - t;
        }

        let k2 = eval(t + C2 * h, &(&y + &k1 * (A21 * h)));
        let k3 = eval(t + C3 * h, &(&y + (&k1 * A31 + &k2 * A32) * h));
        let k4 = eval(t + C4 * h, &(&y + (&k1 * A41 + &k2 * A42 + &k3 * A43) * h));
        let k5 = eval(
            t + C5 * h,
            &(&y + (&k1 * A51 + &k2 * A52 + &k3 * A53 + &k4 * A54) * h),
        );
        let k6 = eval(
            t + h,
            &(&y + (&k1 * A61 + &k2 * A62 + &k3 * A63 + &k4 * A64 + &k5 * A65) * h),
        );
        let y_new = &y + (&k1 * B1 + &k3 * B3 + &k4 * B4 + &k5 * B5 + &k6 * B6) * h;
        let k7 = eval(t + h, &y_new);

        let err = (&k1 * E1 + &k3 * E3 + &k4 * E4 + &k5 * E5 + &k6 * E6 + &k7 * E7) * h;
        let err_norm = error_norm(&err, &y, &y_new, settings);

        if err_norm.is_finite() && err_norm <= 1.0 && y_new.iter().all(|v| v.is_finite()) {
            t = if last_step { t1 } else { t + h };
            y = y_new;
            k1 = k7;
            sol.times.push(t);
            sol.states.push(y.clone());
            sol.derivatives.push(k1.clone());

            let mut factor = if err_norm == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * err_norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
            };
            if last_rejected {
                factor = factor.min(1.0);
            }
            h *= factor;
            last_rejected = false;
        } else {
            sol.rejected_steps += 1;
            let factor = if err_norm.is_finite() {
                (SAFETY * err_norm.powf(-0.2)).clamp(MIN_FACTOR, 1.0)
            } else {
                MIN_FACTOR
            };
            h *= factor;
            last_rejected = true;
        }
    }

    sol.evaluations = evaluations;
    debug!(
        "dopri: {} accepted, {} rejected, {} rhs evaluations",
        sol.accepted_steps(),
        sol.rejected_steps,
        sol.evaluations
    );
    Ok(sol)
}

fn error_norm(err: &DVector<f64>, y: &DVector<f64>, y_new: &DVector<f64>, s: &IntegratorSettings) -> f64 {
    if err.is_empty() {
        return 0.0;
    }
    let sum: f64 = err
        .iter()
        .zip(y.iter().zip(y_new.iter()))
        .map(|(e, (a, b))| {
            let scale = s.atol + s.rtol * a.abs().max(b.abs());
            (e / scale).powi(2)
        })
        .sum();
    (sum / err.len() as f64).sqrt()
}

/// Starting step from the size of the state, its derivative, and a trial Euler step.
fn initial_step<F>(eval: &mut F, t0: f64, y0: &DVector<f64>, f0: &DVector<f64>, s: &IntegratorSettings) -> f64
where
    F: FnMut(f64, &DVector<f64>) -> DVector<f64>,
{
    let rms_scaled = |v: &DVector<f64>| {
        if v.is_empty() {
            return 0.0;
        }
        let sum: f64 = v
            .iter()
            .zip(y0.iter())
            .map(|(x, y)| (x / (s.atol + s.rtol * y.abs())).powi(2))
            .sum();
        (sum / v.len() as f64).sqrt()
    };

    let d0 = rms_scaled(y0);
    let d1 = rms_scaled(f0);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };

    let y1 = y0 + f0 * h0;
    let f1 = eval(t0 + h0, &y1);
    let d2 = rms_scaled(&(f1 - f0)) / h0;

    let h1 = if d1.max(d2) <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(0.2)
    };

    (100.0 * h0).min(h1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_decay_reaches_inverse_e() {
        let settings = IntegratorSettings {
            rtol: 1e-8,
            atol: 1e-10,
            ..IntegratorSettings::default()
        };
        let sol = integrate(|_, y| -y, 0.0, 1.0, DVector::from_element(1, 1.0), &settings).unwrap();

        assert_eq!(*sol.times.last().unwrap(), 1.0);
        let y1 = sol.final_state().unwrap()[0];
        assert!((y1 - (-1.0f64).exp()).abs() < 1e-7);
        assert_eq!(sol.states[0][0], 1.0);
    }

    #[test]
    fn dense_output_matches_between_steps() {
        let settings = IntegratorSettings {
            rtol: 1e-9,
            atol: 1e-12,
            ..IntegratorSettings::default()
        };
        let sol = integrate(|_, y| -y, 0.0, 2.0, DVector::from_element(1, 1.0), &settings).unwrap();

        for &t in &[0.0, 0.123, 0.77, 1.5, 2.0] {
            let y = sol.sample(t).unwrap()[0];
            assert!((y - (-t).exp()).abs() < 1e-6, "t={t}: {y}");
        }
        assert!(sol.sample(-0.1).is_none());
        assert!(sol.sample(2.1).is_none());
    }

    #[test]
    fn harmonic_oscillator_system() {
        let settings = IntegratorSettings {
            rtol: 1e-9,
            atol: 1e-12,
            ..IntegratorSettings::default()
        };
        let y0 = DVector::from_column_slice(&[1.0, 0.0]);
        let sol = integrate(
            |_, y| DVector::from_column_slice(&[y[1], -y[0]]),
            0.0,
            std::f64::consts::PI,
            y0,
            &settings,
        )
        .unwrap();

        let y = sol.final_state().unwrap();
        assert!((y[0] + 1.0).abs() < 1e-6);
        assert!(y[1].abs() < 1e-6);
    }

    #[test]
    fn max_steps_guard_is_a_numeric_error() {
        let settings = IntegratorSettings {
            rtol: 1e-12,
            atol: 1e-14,
            max_steps: 3,
            first_step: None,
        };
        let err = integrate(|_, y| -y, 0.0, 10.0, DVector::from_element(1, 1.0), &settings).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn rejects_reversed_span() {
        let err = integrate(|_, y| -y, 1.0, 0.0, DVector::from_element(1, 1.0), &IntegratorSettings::default())
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
