//! Core concentration-curve computation library implemented in Rust.

use std::collections::HashMap;

use ndarray::Array1;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod expr;
pub mod fit;
pub mod query;
pub mod request;
pub mod schedule;

pub use expr::parse_expr;
pub use fit::fit_to_width;
pub use query::{chart_query, encode_fields, CHART_ENDPOINT, CSV_ENDPOINT, RENDER_ENDPOINT};
pub use request::{CurveRequest, DoseEntry, SampledCurve, MAX_DURATION_HOURS, STEPS_PER_HOUR};
pub use schedule::build_dose_schedule;

const LN_2: f64 = std::f64::consts::LN_2;

#[derive(Error, Debug)]
pub enum PkError {
    #[error("invalid expression: {0}")]
    InvalidExpression(String),
    #[error("invalid dose quantity: {0}")]
    InvalidDose(String),
    #[error("{0} must be positive")]
    NonPositive(&'static str),
    #[error("duration of {0} h exceeds the maximum of 720 h")]
    DurationTooLong(f64),
    #[error("no absorption half-life reaches a peak at {0} h")]
    PeakSolveFailed(f64),
}

/// A drug's pharmacokinetic parameters.
///
/// `hl_e` (elimination half-life) and `t_max` (time of peak concentration)
/// are user inputs, both in hours. The absorption half-life `hl_a` is solved
/// from them, and `c_0` scales a unit dose so its peak concentration is 1.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Drug {
    pub c_0: f64,
    pub hl_a: f64,
    pub hl_e: f64,
    pub t_max: f64,
}

impl Drug {
    pub fn new(hl_e: f64, t_max: f64) -> Result<Self, PkError> {
        if !(hl_e > 0.0) {
            return Err(PkError::NonPositive("hl"));
        }
        if !(t_max > 0.0) {
            return Err(PkError::NonPositive("t_max"));
        }
        let hl_a = solve_absorption_half_life(hl_e, t_max)?;
        let peak = bateman(t_max, rate_constant(hl_a), rate_constant(hl_e));
        if !(peak > 0.0) {
            return Err(PkError::PeakSolveFailed(t_max));
        }
        Ok(Self {
            c_0: 1.0 / peak,
            hl_a,
            hl_e,
            t_max,
        })
    }

    /// Samples the concentration at `num` times spaced `step` hours apart.
    ///
    /// Each dose contributes a two-compartment response starting at its
    /// offset, snapped to the nearest sample index. A non-positive `step`
    /// collapses all doses onto the first sample.
    pub fn concentration(
        &self,
        num: usize,
        step: f64,
        doses: &HashMap<OrderedFloat<f64>, f64>,
    ) -> Array1<f64> {
        let k_a = rate_constant(self.hl_a);
        let k_e = rate_constant(self.hl_e);
        let mut y = Array1::zeros(num);

        let mut indexed: HashMap<usize, f64> = HashMap::new();
        if step > 0.0 {
            let mut entries: Vec<(f64, f64)> = doses.iter().map(|(o, d)| (o.0, *d)).collect();
            entries.sort_by(|a, b| a.0.total_cmp(&b.0));
            for (offset, dose) in entries {
                let idx = (offset / step).round();
                if idx >= 0.0 && (idx as usize) < num {
                    indexed.insert(idx as usize, dose);
                }
            }
        } else if !doses.is_empty() {
            indexed.insert(0, doses.values().sum());
        }

        for (idx, dose) in indexed {
            let amount = dose * self.c_0;
            for i in idx..num {
                y[i] += amount * bateman((i - idx) as f64 * step, k_a, k_e);
            }
        }
        y
    }

    /// Concentration of a single unit dose at time zero.
    pub fn unit_concentration(&self, num: usize, step: f64) -> Array1<f64> {
        let mut doses = HashMap::new();
        doses.insert(OrderedFloat(0.0), 1.0);
        self.concentration(num, step, &doses)
    }
}

fn rate_constant(half_life: f64) -> f64 {
    LN_2 / half_life
}

/// Central-compartment response to a unit dose absorbed at t = 0.
fn bateman(t: f64, k_a: f64, k_e: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if (k_a - k_e).abs() <= 1e-9 * k_a.max(k_e) {
        let k = 0.5 * (k_a + k_e);
        return k * t * (-k * t).exp();
    }
    k_a / (k_a - k_e) * ((-k_e * t).exp() - (-k_a * t).exp())
}

/// Time of peak concentration for the given half-lives, in hours.
pub fn time_to_peak(hl_a: f64, hl_e: f64) -> f64 {
    let k_a = rate_constant(hl_a);
    let k_e = rate_constant(hl_e);
    if (k_a - k_e).abs() <= 1e-9 * k_a.max(k_e) {
        let k = 0.5 * (k_a + k_e);
        return 1.0 / k;
    }
    (k_a / k_e).ln() / (k_a - k_e)
}

// time_to_peak is strictly increasing in hl_a for a fixed hl_e, so the
// inverse is a bracketed bisection.
fn solve_absorption_half_life(hl_e: f64, t_max: f64) -> Result<f64, PkError> {
    let mut lo = 1e-9;
    let mut hi = 1.0;
    let mut grow = 0;
    while time_to_peak(hi, hl_e) < t_max {
        hi *= 2.0;
        grow += 1;
        if grow > 80 {
            return Err(PkError::PeakSolveFailed(t_max));
        }
    }
    let mut shrink = 0;
    while time_to_peak(lo, hl_e) > t_max {
        lo /= 2.0;
        shrink += 1;
        if shrink > 80 {
            return Err(PkError::PeakSolveFailed(t_max));
        }
    }
    for _ in 0..200 {
        if hi - lo <= 1e-13 * hi.max(1.0) {
            break;
        }
        let mid = 0.5 * (lo + hi);
        if time_to_peak(mid, hl_e) < t_max {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(0.5 * (lo + hi))
}
