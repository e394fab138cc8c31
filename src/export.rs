use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{MAX_CALORIES, MAX_DURATION_MINUTES, NewWorkout, Workout};

pub const CSV_COLUMNS: [&str; 4] = ["date", "exercise", "duration", "calories"];

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn workouts_to_csv(workouts: &[Workout]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(workouts.len() + 1);
    lines.push(CSV_COLUMNS.join(","));

    for workout in workouts {
        let line = [
            workout.date.format("%Y-%m-%d").to_string(),
            csv_escape(&workout.exercise),
            workout.duration.to_string(),
            workout.calories.to_string(),
        ]
        .join(",");
        lines.push(line);
    }

    lines.join("\n")
}

/// Parses an exported workout log back into unsaved records.
///
/// Errors name the line the offending record starts on.
pub fn workouts_from_csv(input: &str) -> Result<Vec<NewWorkout>, AppError> {
    let mut records = parse_records(input)?.into_iter();

    let Some((_, header)) = records.next() else {
        return Err(AppError::Validation("CSV file is empty".to_string()));
    };

    let header_matches = header.len() == CSV_COLUMNS.len()
        && header
            .iter()
            .zip(CSV_COLUMNS)
            .all(|(found, expected)| found.trim().eq_ignore_ascii_case(expected));

    if !header_matches {
        return Err(AppError::Validation(format!(
            "line 1: expected header '{}'",
            CSV_COLUMNS.join(",")
        )));
    }

    records
        .map(|(line, fields)| parse_workout(line, fields))
        .collect()
}

fn parse_workout(line: usize, fields: Vec<String>) -> Result<NewWorkout, AppError> {
    let invalid = |message: String| AppError::Validation(format!("line {}: {}", line, message));

    let [date, exercise, duration, calories]: [String; 4] = fields
        .try_into()
        .map_err(|fields: Vec<String>| {
            invalid(format!("expected 4 fields, found {}", fields.len()))
        })?;

    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(format!("invalid date '{}'", date)))?;

    if exercise.trim().is_empty() {
        return Err(invalid("exercise must not be empty".to_string()));
    }

    let duration = parse_bounded(&duration, MAX_DURATION_MINUTES).ok_or_else(|| {
        invalid(format!(
            "duration must be an integer from 1 to {}, got '{}'",
            MAX_DURATION_MINUTES, duration
        ))
    })?;
    let calories = parse_bounded(&calories, MAX_CALORIES).ok_or_else(|| {
        invalid(format!(
            "calories must be an integer from 1 to {}, got '{}'",
            MAX_CALORIES, calories
        ))
    })?;

    Ok(NewWorkout {
        date,
        exercise,
        duration,
        calories,
    })
}

fn parse_bounded(value: &str, max: i64) -> Option<i64> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|n| (1..=max).contains(n))
}

/// Splits CSV text into records, each tagged with the line it starts on.
/// Blank lines are skipped.
fn parse_records(input: &str) -> Result<Vec<(usize, Vec<String>)>, AppError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut field_quoted = false;
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !field_quoted => {
                in_quotes = true;
                field_quoted = true;
            }
            '"' => {
                return Err(AppError::Validation(format!(
                    "line {}: unexpected quote in unquoted field",
                    line
                )));
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                field_quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                let blank = fields.is_empty() && field.is_empty() && !field_quoted;
                if !blank {
                    fields.push(std::mem::take(&mut field));
                    records.push((record_line, std::mem::take(&mut fields)));
                }
                field_quoted = false;
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(AppError::Validation(format!(
            "line {}: unterminated quoted field",
            record_line
        )));
    }

    if !fields.is_empty() || !field.is_empty() || field_quoted {
        fields.push(field);
        records.push((record_line, fields));
    }

    Ok(records)
}
