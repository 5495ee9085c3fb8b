//! Subcontractor evaluation scoring.
//!
//! Each evaluation (one per trip) carries two entered components, driver cooperation and
//! vehicle condition, and a damage component derived from the damage reported across the
//! vehicle's whole month:
//!
//! - more than one incident in the month, or total damage above the threshold: every trip
//!   of that vehicle scores zero for damage
//! - exactly one incident under the threshold: that trip gets the reduced score, the rest
//!   score full marks
//! - no incidents: full marks on every trip
//!
//! Monthly summaries average the per-trip totals and grade the result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::types::{EvaluationId, SubcontractorId, VehicleId};

/// Score maxima, damage rules and grade boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringRules {
    pub max_cooperation_score: i64,
    pub max_vehicle_condition_score: i64,
    pub max_damage_score: i64,
    /// Damage score for the single trip with damage when the month has one small incident
    pub reduced_damage_score: i64,
    /// Monthly damage value above which every trip loses its damage score
    pub damage_value_threshold: f64,
    pub pass_threshold: f64,
    pub improve_threshold: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            max_cooperation_score: 35,
            max_vehicle_condition_score: 35,
            max_damage_score: 30,
            reduced_damage_score: 15,
            damage_value_threshold: 10_000.0,
            pass_threshold: 80.0,
            improve_threshold: 60.0,
        }
    }
}

impl ScoringRules {
    /// Highest achievable per-trip total
    pub fn max_total(&self) -> i64 {
        self.max_cooperation_score + self.max_vehicle_condition_score + self.max_damage_score
    }

    pub fn grade(&self, average: f64) -> Grade {
        if average >= self.pass_threshold {
            Grade::Pass
        } else if average >= self.improve_threshold {
            Grade::Improve
        } else {
            Grade::Fail
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Pass,
    Improve,
    Fail,
}

/// The fields of an evaluation that scoring needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringInput {
    pub evaluation_id: EvaluationId,
    pub subcontractor_id: SubcontractorId,
    pub vehicle_id: VehicleId,
    /// Calendar month, `YYYY-MM`
    pub month: String,
    pub driver_cooperation: i64,
    pub vehicle_condition: i64,
    pub damage_found: bool,
    pub damage_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TripScore {
    pub evaluation_id: EvaluationId,
    pub subcontractor_id: SubcontractorId,
    pub vehicle_id: VehicleId,
    pub month: String,
    pub driver_cooperation: i64,
    pub vehicle_condition: i64,
    pub damage_score: i64,
    pub total_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlySummary {
    pub subcontractor_id: SubcontractorId,
    pub vehicle_id: VehicleId,
    pub month: String,
    pub trip_count: usize,
    pub total_score: i64,
    pub average_score: f64,
    pub incidents: usize,
    pub total_damage: f64,
    pub grade: Grade,
}

/// Damage facts for one vehicle-month
#[derive(Debug, Default)]
struct DamageTally {
    incidents: usize,
    total_damage: f64,
}

fn tally_damage(inputs: &[ScoringInput]) -> BTreeMap<(VehicleId, &str), DamageTally> {
    let mut tallies: BTreeMap<(VehicleId, &str), DamageTally> = BTreeMap::new();
    for input in inputs {
        let tally = tallies.entry((input.vehicle_id, input.month.as_str())).or_default();
        if input.damage_found {
            tally.incidents += 1;
            tally.total_damage += input.damage_value.max(0.0);
        }
    }
    tallies
}

/// Score every evaluation, preserving input order.
///
/// Entered components are clamped to their configured maxima.
pub fn score_trips(inputs: &[ScoringInput], rules: &ScoringRules) -> Vec<TripScore> {
    let tallies = tally_damage(inputs);

    inputs
        .iter()
        .map(|input| {
            let tally = &tallies[&(input.vehicle_id, input.month.as_str())];
            let damage_score = if tally.incidents > 1 || tally.total_damage > rules.damage_value_threshold {
                0
            } else if input.damage_found {
                rules.reduced_damage_score
            } else {
                rules.max_damage_score
            };

            let driver_cooperation = input.driver_cooperation.clamp(0, rules.max_cooperation_score);
            let vehicle_condition = input.vehicle_condition.clamp(0, rules.max_vehicle_condition_score);

            TripScore {
                evaluation_id: input.evaluation_id,
                subcontractor_id: input.subcontractor_id,
                vehicle_id: input.vehicle_id,
                month: input.month.clone(),
                driver_cooperation,
                vehicle_condition,
                damage_score,
                total_score: driver_cooperation + vehicle_condition + damage_score,
            }
        })
        .collect()
}

/// Aggregate evaluations per (subcontractor, vehicle, month), ordered by those keys.
pub fn monthly_summaries(inputs: &[ScoringInput], rules: &ScoringRules) -> Vec<MonthlySummary> {
    let scores = score_trips(inputs, rules);

    let mut groups: BTreeMap<(SubcontractorId, VehicleId, String), MonthlySummary> = BTreeMap::new();
    for (input, score) in inputs.iter().zip(&scores) {
        let summary = groups
            .entry((input.subcontractor_id, input.vehicle_id, input.month.clone()))
            .or_insert_with(|| MonthlySummary {
                subcontractor_id: input.subcontractor_id,
                vehicle_id: input.vehicle_id,
                month: input.month.clone(),
                trip_count: 0,
                total_score: 0,
                average_score: 0.0,
                incidents: 0,
                total_damage: 0.0,
                grade: Grade::Fail,
            });
        summary.trip_count += 1;
        summary.total_score += score.total_score;
        if input.damage_found {
            summary.incidents += 1;
            summary.total_damage += input.damage_value.max(0.0);
        }
    }

    groups
        .into_values()
        .map(|mut summary| {
            summary.average_score = summary.total_score as f64 / summary.trip_count as f64;
            summary.grade = rules.grade(summary.average_score);
            summary
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(id: i64, vehicle_id: i64, damage_value: Option<f64>) -> ScoringInput {
        ScoringInput {
            evaluation_id: id,
            subcontractor_id: 1,
            vehicle_id,
            month: "2026-03".to_string(),
            driver_cooperation: 30,
            vehicle_condition: 30,
            damage_found: damage_value.is_some(),
            damage_value: damage_value.unwrap_or(0.0),
        }
    }

    fn damage_scores(inputs: &[ScoringInput]) -> Vec<i64> {
        score_trips(inputs, &ScoringRules::default())
            .iter()
            .map(|s| s.damage_score)
            .collect()
    }

    #[test]
    fn test_no_incidents_scores_full() {
        let inputs = vec![eval(1, 10, None), eval(2, 10, None)];
        assert_eq!(damage_scores(&inputs), vec![30, 30]);
        assert_eq!(score_trips(&inputs, &ScoringRules::default())[0].total_score, 90);
    }

    #[test]
    fn test_single_small_incident_reduces_only_that_trip() {
        let inputs = vec![eval(1, 10, None), eval(2, 10, Some(2_500.0)), eval(3, 10, None)];
        assert_eq!(damage_scores(&inputs), vec![30, 15, 30]);
    }

    #[test]
    fn test_two_incidents_zero_every_trip() {
        let inputs = vec![eval(1, 10, Some(100.0)), eval(2, 10, None), eval(3, 10, Some(200.0))];
        assert_eq!(damage_scores(&inputs), vec![0, 0, 0]);
    }

    #[test]
    fn test_single_incident_above_threshold_zeroes_month() {
        let inputs = vec![eval(1, 10, Some(10_000.01)), eval(2, 10, None)];
        assert_eq!(damage_scores(&inputs), vec![0, 0]);

        // Exactly at the threshold is still the reduced case
        let inputs = vec![eval(1, 10, Some(10_000.0)), eval(2, 10, None)];
        assert_eq!(damage_scores(&inputs), vec![15, 30]);
    }

    #[test]
    fn test_groups_are_per_vehicle_and_month() {
        let mut april = eval(3, 10, Some(50.0));
        april.month = "2026-04".to_string();
        let inputs = vec![eval(1, 10, Some(50.0)), eval(2, 11, Some(50.0)), april];
        // One incident in each (vehicle, month) group
        assert_eq!(damage_scores(&inputs), vec![15, 15, 15]);
    }

    #[test]
    fn test_entered_components_are_clamped() {
        let mut input = eval(1, 10, None);
        input.driver_cooperation = 50;
        input.vehicle_condition = -3;
        let score = &score_trips(&[input], &ScoringRules::default())[0];
        assert_eq!(score.driver_cooperation, 35);
        assert_eq!(score.vehicle_condition, 0);
        assert_eq!(score.total_score, 65);
    }

    #[test]
    fn test_grade_boundaries() {
        let rules = ScoringRules::default();
        assert_eq!(rules.grade(100.0), Grade::Pass);
        assert_eq!(rules.grade(80.0), Grade::Pass);
        assert_eq!(rules.grade(79.99), Grade::Improve);
        assert_eq!(rules.grade(60.0), Grade::Improve);
        assert_eq!(rules.grade(59.9), Grade::Fail);
        assert_eq!(rules.max_total(), 100);
    }

    #[test]
    fn test_monthly_summary_averages_and_grades() {
        // 90 + 75 (30+30+15) = 165 over 2 trips
        let inputs = vec![eval(1, 10, None), eval(2, 10, Some(800.0)), eval(3, 11, Some(1.0)), eval(4, 11, Some(1.0))];
        let summaries = monthly_summaries(&inputs, &ScoringRules::default());
        assert_eq!(summaries.len(), 2);

        let first = &summaries[0];
        assert_eq!(first.vehicle_id, 10);
        assert_eq!(first.trip_count, 2);
        assert_eq!(first.total_score, 165);
        assert_eq!(first.average_score, 82.5);
        assert_eq!(first.incidents, 1);
        assert_eq!(first.total_damage, 800.0);
        assert_eq!(first.grade, Grade::Pass);

        // Two incidents: both trips score 60
        let second = &summaries[1];
        assert_eq!(second.average_score, 60.0);
        assert_eq!(second.grade, Grade::Improve);
    }

    #[test]
    fn test_custom_rules() {
        let rules = ScoringRules {
            reduced_damage_score: 0,
            damage_value_threshold: 100.0,
            pass_threshold: 95.0,
            ..Default::default()
        };
        let inputs = vec![eval(1, 10, Some(50.0)), eval(2, 10, None)];
        let scores: Vec<i64> = score_trips(&inputs, &rules).iter().map(|s| s.damage_score).collect();
        assert_eq!(scores, vec![0, 30]);
        assert_eq!(monthly_summaries(&inputs, &rules)[0].grade, Grade::Improve);
    }
}
