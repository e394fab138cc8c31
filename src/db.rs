use crate::{
    auth::{DbUser, DbUserSession, User, UserSession},
    error::AppError,
};
use chrono::{NaiveDateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::models::{DbReminder, DbWorkout, NewReminder, NewWorkout, Reminder, Workout};

#[instrument(skip(pool))]
pub async fn insert_workout(pool: &Pool<Sqlite>, workout: &NewWorkout) -> Result<Workout, AppError> {
    info!("Logging workout");
    let res = sqlx::query(
        "INSERT INTO workouts (date, exercise, duration, calories)
         VALUES (?, ?, ?, ?)",
    )
    .bind(workout.date)
    .bind(&workout.exercise)
    .bind(workout.duration)
    .bind(workout.calories)
    .execute(pool)
    .await?;

    Ok(Workout {
        id: res.last_insert_rowid(),
        date: workout.date,
        exercise: workout.exercise.clone(),
        duration: workout.duration,
        calories: workout.calories,
    })
}

#[instrument(skip_all, fields(count = workouts.len()))]
pub async fn insert_workouts(pool: &Pool<Sqlite>, workouts: &[NewWorkout]) -> Result<u64, AppError> {
    info!("Logging workouts in bulk");
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for workout in workouts {
        let res = sqlx::query(
            "INSERT INTO workouts (date, exercise, duration, calories)
             VALUES (?, ?, ?, ?)",
        )
        .bind(workout.date)
        .bind(&workout.exercise)
        .bind(workout.duration)
        .bind(workout.calories)
        .execute(&mut *tx)
        .await?;
        inserted += res.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

#[instrument(skip(pool))]
pub async fn get_all_workouts(pool: &Pool<Sqlite>) -> Result<Vec<Workout>, AppError> {
    info!("Getting all workouts");
    let rows = sqlx::query_as::<_, DbWorkout>(
        "SELECT id, date, exercise, duration, calories
         FROM workouts
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    // No error thrown if there are no workouts logged
    Ok(rows.into_iter().map(Workout::from).collect())
}

#[instrument(skip(pool))]
pub async fn delete_all_workouts(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Deleting all workouts");
    let res = sqlx::query("DELETE FROM workouts").execute(pool).await?;

    Ok(res.rows_affected())
}

#[instrument(skip(pool))]
pub async fn insert_reminder(
    pool: &Pool<Sqlite>,
    reminder: &NewReminder,
) -> Result<Reminder, AppError> {
    info!("Adding reminder");
    let res = sqlx::query("INSERT INTO reminders (reminder, time) VALUES (?, ?)")
        .bind(&reminder.reminder)
        .bind(reminder.time)
        .execute(pool)
        .await?;

    Ok(Reminder {
        id: res.last_insert_rowid(),
        reminder: reminder.reminder.clone(),
        time: reminder.time,
    })
}

#[instrument(skip(pool))]
pub async fn get_all_reminders(pool: &Pool<Sqlite>) -> Result<Vec<Reminder>, AppError> {
    info!("Getting all reminders");
    let rows = sqlx::query_as::<_, DbReminder>("SELECT id, reminder, time FROM reminders ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Reminder::from).collect())
}

#[instrument(skip(pool))]
pub async fn delete_all_reminders(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Deleting all reminders");
    let res = sqlx::query("DELETE FROM reminders").execute(pool).await?;

    Ok(res.rows_affected())
}

#[instrument(skip(pool))]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>("SELECT id, username FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn find_user_by_username(
    pool: &Pool<Sqlite>,
    username: &str,
) -> Result<Option<User>, AppError> {
    info!("Finding user by username");
    let row = sqlx::query_as::<_, DbUser>("SELECT id, username FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(User::from))
}

/// Stores a new account. The insert is skipped atomically when the username
/// is already taken, so an existing password hash is never overwritten.
#[instrument(skip(pool, password))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
    cost: u32,
) -> Result<i64, AppError> {
    info!("Creating new user");

    let password_hash = bcrypt::hash(password, cost)?;

    let res = sqlx::query(
        "INSERT INTO users (username, password_hash) VALUES (?, ?)
         ON CONFLICT(username) DO NOTHING",
    )
    .bind(username)
    .bind(&password_hash)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::Conflict(format!(
            "Username '{}' already exists",
            username
        )));
    }

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, password))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");

    #[derive(sqlx::FromRow)]
    struct Credentials {
        id: i64,
        username: String,
        password_hash: String,
    }

    let row = sqlx::query_as::<_, Credentials>(
        "SELECT id, username, password_hash FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    let Some(credentials) = row else {
        return Ok(None);
    };

    match bcrypt::verify(password, &credentials.password_hash) {
        Ok(true) => Ok(Some(User {
            id: credentials.id,
            username: credentials.username,
        })),
        Ok(false) => Ok(None),
        Err(err) => {
            warn!(user_id = credentials.id, error = %err, "Stored password hash is unreadable");
            Err(AppError::from(err))
        }
    }
}

#[instrument(skip(pool, token))]
pub async fn create_user_session(
    pool: &Pool<Sqlite>,
    user_id: i64,
    token: &str,
    expires_at: NaiveDateTime,
) -> Result<i64, AppError> {
    info!("Creating user session");

    let res = sqlx::query(
        "INSERT INTO user_sessions (user_id, token, expires_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, token))]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<UserSession, AppError> {
    info!("Getting session by token");

    let session = sqlx::query_as::<_, DbUserSession>(
        "SELECT id, user_id, token, created_at, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match session {
        Some(session) => Ok(UserSession::from(session)),
        _ => Err(AppError::Authentication(
            "Invalid session token".to_string(),
        )),
    }
}

#[instrument(skip(pool, token))]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Invalidating session");

    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired sessions");

    let now = Utc::now().naive_utc();

    let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
