use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Longest accepted single workout, one full day.
pub const MAX_DURATION_MINUTES: i64 = 1_440;
pub const MAX_CALORIES: i64 = 100_000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Workout {
    pub id: i64,
    pub date: NaiveDate,
    pub exercise: String,
    pub duration: i64, // minutes
    pub calories: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbWorkout {
    pub id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub exercise: Option<String>,
    pub duration: Option<i64>,
    pub calories: Option<i64>,
}

impl From<DbWorkout> for Workout {
    fn from(workout: DbWorkout) -> Self {
        Self {
            id: workout.id.unwrap_or_default(),
            date: workout.date.unwrap_or_default(),
            exercise: workout.exercise.unwrap_or_default(),
            duration: workout.duration.unwrap_or_default(),
            calories: workout.calories.unwrap_or_default(),
        }
    }
}

/// A workout that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkout {
    pub date: NaiveDate,
    pub exercise: String,
    pub duration: i64,
    pub calories: i64,
}

impl From<&Workout> for NewWorkout {
    fn from(workout: &Workout) -> Self {
        Self {
            date: workout.date,
            exercise: workout.exercise.clone(),
            duration: workout.duration,
            calories: workout.calories,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: i64,
    pub reminder: String,
    pub time: NaiveDateTime,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbReminder {
    pub id: Option<i64>,
    pub reminder: Option<String>,
    pub time: Option<NaiveDateTime>,
}

impl From<DbReminder> for Reminder {
    fn from(reminder: DbReminder) -> Self {
        Self {
            id: reminder.id.unwrap_or_default(),
            reminder: reminder.reminder.unwrap_or_default(),
            time: reminder.time.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
    pub reminder: String,
    pub time: NaiveDateTime,
}
