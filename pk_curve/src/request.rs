//! Curve requests: the raw form/CLI parameters and their evaluation.

use serde::{Deserialize, Serialize};

use crate::expr::parse_expr;
use crate::schedule::build_dose_schedule;
use crate::{Drug, PkError};

/// The longest simulation the evaluator accepts, in hours.
pub const MAX_DURATION_HOURS: f64 = 720.0;
/// Samples per simulated hour.
pub const STEPS_PER_HOUR: u32 = 60;

/// The five regimen parameters, kept as the raw strings the form or CLI
/// supplied. Time-valued parameters accept the expression grammar of
/// [`parse_expr`]; `doses` is a whitespace-separated list of plain numbers
/// and `offsets` a whitespace-separated list of time expressions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurveRequest {
    pub hl: String,
    pub t_max: String,
    pub duration: String,
    pub doses: String,
    pub offsets: String,
}

/// One dose of the evaluated schedule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoseEntry {
    pub offset_h: f64,
    pub dose: f64,
}

/// A concentration curve sampled on a uniform grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampledCurve {
    pub hours: Vec<f64>,
    pub concentration: Vec<f64>,
    pub drug: Drug,
    pub doses: Vec<DoseEntry>,
    pub steps: u32,
}

impl CurveRequest {
    pub fn evaluate(&self) -> Result<SampledCurve, PkError> {
        let hl = parse_expr(&self.hl)?;
        if !(hl > 0.0) {
            return Err(PkError::NonPositive("hl"));
        }
        let t_max = parse_expr(&self.t_max)?;
        if !(t_max > 0.0) {
            return Err(PkError::NonPositive("t_max"));
        }
        let duration = parse_expr(&self.duration)?;
        if !(duration > 0.0) {
            return Err(PkError::NonPositive("duration"));
        }
        if duration > MAX_DURATION_HOURS {
            return Err(PkError::DurationTooLong(duration));
        }

        let doses = self
            .doses
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| PkError::InvalidDose(token.to_string()))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        let offsets = self
            .offsets
            .split_whitespace()
            .map(parse_expr)
            .collect::<Result<Vec<f64>, _>>()?;
        let schedule = build_dose_schedule(&offsets, &doses);

        let drug = Drug::new(hl, t_max)?;
        let steps = f64::from(STEPS_PER_HOUR);
        let num = (duration * steps).round() as usize + 1;
        let step = 1.0 / steps;
        let concentration = drug.concentration(num, step, &schedule);

        let mut entries: Vec<DoseEntry> = schedule
            .into_iter()
            .map(|(offset, dose)| DoseEntry {
                offset_h: offset.0,
                dose,
            })
            .collect();
        entries.sort_by(|a, b| a.offset_h.total_cmp(&b.offset_h));

        Ok(SampledCurve {
            hours: (0..num).map(|i| i as f64 * step).collect(),
            concentration: concentration.to_vec(),
            drug,
            doses: entries,
            steps: STEPS_PER_HOUR,
        })
    }
}

impl SampledCurve {
    /// The curve as CSV with a `hours,concentration` header.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("hours,concentration\n");
        for (hour, value) in self.hours.iter().zip(self.concentration.iter()) {
            out.push_str(&format!("{:.6},{:.6}\n", hour, value));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CurveRequest {
        CurveRequest {
            hl: "6".to_string(),
            t_max: "2".to_string(),
            duration: "24".to_string(),
            doses: "10".to_string(),
            offsets: "0".to_string(),
        }
    }

    #[test]
    fn evaluates_a_daylong_regimen() {
        let curve = request().evaluate().unwrap();
        assert_eq!(curve.hours.len(), 24 * 60 + 1);
        assert_eq!(curve.concentration.len(), curve.hours.len());
        assert_eq!(curve.hours[0], 0.0);
        assert!((curve.hours[curve.hours.len() - 1] - 24.0).abs() < 1e-9);
        assert_eq!(curve.steps, STEPS_PER_HOUR);
        assert_eq!(
            curve.doses,
            vec![DoseEntry {
                offset_h: 0.0,
                dose: 10.0
            }]
        );
    }

    #[test]
    fn time_expressions_are_accepted() {
        let mut req = request();
        req.hl = "90m * 4".to_string();
        req.duration = "1d".to_string();
        req.offsets = "0 12h".to_string();
        req.doses = "10 20".to_string();
        let curve = req.evaluate().unwrap();
        assert!((curve.drug.hl_e - 6.0).abs() < 1e-12);
        assert_eq!(curve.doses.len(), 2);
        assert_eq!(curve.doses[1].offset_h, 12.0);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let mut req = request();
        req.duration = "800".to_string();
        assert!(matches!(req.evaluate(), Err(PkError::DurationTooLong(_))));

        let mut req = request();
        req.duration = "0".to_string();
        assert!(matches!(req.evaluate(), Err(PkError::NonPositive("duration"))));

        let mut req = request();
        req.hl = "0".to_string();
        assert!(matches!(req.evaluate(), Err(PkError::NonPositive("hl"))));

        let mut req = request();
        req.doses = "ten".to_string();
        assert!(matches!(req.evaluate(), Err(PkError::InvalidDose(_))));
    }

    #[test]
    fn csv_has_header_and_one_row_per_sample() {
        let mut req = request();
        req.duration = "1".to_string();
        let curve = req.evaluate().unwrap();
        let csv = curve.to_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("hours,concentration"));
        assert_eq!(lines.clone().count(), 61);
        let first = lines.next().unwrap();
        assert!(first.starts_with("0.000000,"));
    }

    #[test]
    fn summary_serializes_with_the_expected_layout() {
        let curve = request().evaluate().unwrap();
        let json = serde_json::to_value(&curve).unwrap();
        assert!(json.get("concentration").is_some());
        assert!(json["drug"].get("c_0").is_some());
        assert!(json["drug"].get("hl_a").is_some());
        assert_eq!(json["steps"], 60);
        assert_eq!(json["doses"][0]["dose"], 10.0);
    }
}
