//! Summary statistics over the workout log.
//!
//! Everything here is recomputed from the full record set on each request.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Workout;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_duration: i64,
    pub total_calories: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct WorkoutStatistics {
    pub total_workouts: usize,
    pub total_duration: i64,
    pub total_calories: i64,
    /// Per-day sums, ascending by date
    pub daily: Vec<DailySummary>,
}

impl WorkoutStatistics {
    pub fn from_workouts(workouts: &[Workout]) -> Self {
        let mut by_date: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();

        for workout in workouts {
            let entry = by_date.entry(workout.date).or_default();
            entry.0 = entry.0.saturating_add(workout.duration);
            entry.1 = entry.1.saturating_add(workout.calories);
        }

        let daily: Vec<DailySummary> = by_date
            .into_iter()
            .map(|(date, (total_duration, total_calories))| DailySummary {
                date,
                total_duration,
                total_calories,
            })
            .collect();

        Self {
            total_workouts: workouts.len(),
            total_duration: daily
                .iter()
                .fold(0, |sum, d| sum.saturating_add(d.total_duration)),
            total_calories: daily
                .iter()
                .fold(0, |sum, d| sum.saturating_add(d.total_calories)),
            daily,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_workouts == 0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChartSeries {
    pub name: String,
    pub unit: String,
    pub points: Vec<ChartPoint>,
}

/// Duration and calories over time, one point per logged day.
pub fn chart_series(daily: &[DailySummary]) -> Vec<ChartSeries> {
    vec![
        series("duration", "minutes", daily, |day| day.total_duration),
        series("calories", "kcal", daily, |day| day.total_calories),
    ]
}

fn series(
    name: &str,
    unit: &str,
    daily: &[DailySummary],
    value: impl Fn(&DailySummary) -> i64,
) -> ChartSeries {
    ChartSeries {
        name: name.to_string(),
        unit: unit.to_string(),
        points: daily
            .iter()
            .map(|day| ChartPoint {
                date: day.date,
                value: value(day),
            })
            .collect(),
    }
}
