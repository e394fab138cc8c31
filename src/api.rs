use chrono::{NaiveDate, NaiveTime, Utc};
use rocket::State;
use rocket::data::{Data, ToByteUnit};
use rocket::http::{CookieJar, Header, Status};
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{User, UserSession, clear_session_cookie, session_token, set_session_cookie};
use crate::db::{
    authenticate_user, create_user, create_user_session, delete_all_reminders,
    delete_all_workouts, get_all_reminders, get_all_workouts, insert_reminder, insert_workout,
    insert_workouts, invalidate_session,
};
use crate::env::Settings;
use crate::error::AppError;
use crate::export::{workouts_from_csv, workouts_to_csv};
use crate::models::{
    MAX_CALORIES, MAX_DURATION_MINUTES, NewReminder, NewWorkout, Reminder, Workout,
};
use crate::stats::{ChartSeries, WorkoutStatistics, chart_series};
use crate::validation::{
    AppErrorExt, JsonValidateExt, ToValidationResponse, USERNAME_PATTERN, ValidationResponse,
    validate_not_blank,
};

#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(regex(
        path = *USERNAME_PATTERN,
        message = "Username must be 3-32 letters, digits, '.', '_' or '-'"
    ))]
    username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: Option<UserData>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct UserData {
    pub id: i64,
    pub username: String,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[post("/signup", data = "<signup>")]
pub async fn api_signup(
    signup: Json<SignupRequest>,
    db: &State<Pool<Sqlite>>,
    settings: &State<Settings>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    let validated = signup.validate_custom()?;

    // Signing up does not log the new account in
    match create_user(
        db,
        &validated.username,
        &validated.password,
        settings.bcrypt_cost,
    )
    .await
    {
        Ok(_) => Ok(Status::Created),
        Err(AppError::Conflict(_)) => Err(Custom(
            Status::Conflict,
            Json(ValidationResponse::with_error(
                "username",
                "Username already exists",
            )),
        )),
        Err(err) => Err(err.to_validation_response()),
    }
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    settings: &State<Settings>,
) -> Result<Json<LoginResponse>, Custom<Json<ValidationResponse>>> {
    let validated = login.validate_custom()?;

    match authenticate_user(db, &validated.username, &validated.password)
        .await
        .validate_custom()?
    {
        Some(user) => {
            let token = UserSession::generate_token();
            let expires_at = Utc::now() + chrono::Duration::hours(settings.session_ttl_hours);

            create_user_session(db, user.id, &token, expires_at.naive_utc())
                .await
                .validate_custom()?;

            set_session_cookie(cookies, token, settings.session_ttl_hours);

            Ok(Json(LoginResponse {
                success: true,
                user: Some(UserData::from(user)),
                error: None,
            }))
        }
        None => Ok(Json(LoginResponse {
            success: false,
            user: None,
            error: Some("Invalid username or password".to_string()),
        })),
    }
}

#[post("/logout")]
pub async fn api_logout(cookies: &CookieJar<'_>, db: &State<Pool<Sqlite>>) -> Status {
    if let Some(token) = session_token(cookies) {
        if let Err(err) = invalidate_session(db, &token).await {
            err.log_and_record("Logout");
        }
    }

    clear_session_cookie(cookies);

    Status::NoContent
}

#[get("/me")]
pub async fn api_me(user: User) -> Json<UserData> {
    Json(UserData::from(user))
}

#[derive(Deserialize, Validate)]
pub struct WorkoutRequest {
    date: NaiveDate,
    #[validate(custom(function = "validate_not_blank"))]
    exercise: String,
    #[validate(range(
        min = 1,
        max = MAX_DURATION_MINUTES,
        message = "Duration must be between 1 and 1440 minutes"
    ))]
    duration: i64,
    #[validate(range(
        min = 1,
        max = MAX_CALORIES,
        message = "Calories must be between 1 and 100000"
    ))]
    calories: i64,
}

impl From<WorkoutRequest> for NewWorkout {
    fn from(request: WorkoutRequest) -> Self {
        Self {
            date: request.date,
            exercise: request.exercise,
            duration: request.duration,
            calories: request.calories,
        }
    }
}

#[get("/workouts")]
pub async fn api_get_workouts(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Workout>>, Status> {
    let workouts = get_all_workouts(db).await?;
    Ok(Json(workouts))
}

#[post("/workouts", data = "<workout>")]
pub async fn api_log_workout(
    workout: Json<WorkoutRequest>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Workout>>, Custom<Json<ValidationResponse>>> {
    let validated = workout.validate_custom()?;

    let stored = insert_workout(db, &NewWorkout::from(validated))
        .await
        .validate_custom()?;

    Ok(Custom(Status::Created, Json(stored)))
}

#[derive(Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

#[delete("/workouts")]
pub async fn api_delete_workouts(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<DeletedResponse>, Status> {
    let deleted = delete_all_workouts(db).await?;
    tracing::warn!(username = %user.username, deleted, "All workout records deleted");
    Ok(Json(DeletedResponse { deleted }))
}

#[derive(Responder)]
#[response(content_type = "text/csv; charset=utf-8")]
pub struct CsvDownload {
    body: String,
    disposition: Header<'static>,
}

#[get("/workouts/export")]
pub async fn api_export_workouts(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<CsvDownload, Status> {
    let workouts = get_all_workouts(db).await?;

    Ok(CsvDownload {
        body: workouts_to_csv(&workouts),
        disposition: Header::new(
            "Content-Disposition",
            "attachment; filename=\"workouts.csv\"",
        ),
    })
}

#[derive(Serialize, Deserialize)]
pub struct ImportResponse {
    pub imported: u64,
}

#[post("/workouts/import", data = "<body>")]
pub async fn api_import_workouts(
    body: Data<'_>,
    _user: User,
    db: &State<Pool<Sqlite>>,
    settings: &State<Settings>,
) -> Result<Json<ImportResponse>, Custom<Json<ValidationResponse>>> {
    let csv = body
        .open(settings.csv_import_limit_kib.kibibytes())
        .into_string()
        .await
        .map_err(|err| {
            AppError::Validation(format!("Could not read CSV upload: {}", err))
                .to_validation_response()
        })?;

    if !csv.is_complete() {
        tracing::warn!(
            limit_kib = settings.csv_import_limit_kib,
            "CSV upload exceeds size limit"
        );
        return Err(Custom(
            Status::PayloadTooLarge,
            Json(ValidationResponse::with_error(
                "request",
                &format!(
                    "CSV upload is larger than {} KiB",
                    settings.csv_import_limit_kib
                ),
            )),
        ));
    }

    let workouts = workouts_from_csv(&csv.into_inner()).validate_custom()?;

    let imported = insert_workouts(db, &workouts).await.validate_custom()?;

    Ok(Json(ImportResponse { imported }))
}

#[get("/statistics")]
pub async fn api_get_statistics(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<WorkoutStatistics>, AppError> {
    let workouts = get_all_workouts(db).await?;
    Ok(Json(WorkoutStatistics::from_workouts(&workouts)))
}

#[get("/charts")]
pub async fn api_get_charts(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<ChartSeries>>, AppError> {
    let workouts = get_all_workouts(db).await?;
    let statistics = WorkoutStatistics::from_workouts(&workouts);
    Ok(Json(chart_series(&statistics.daily)))
}

#[derive(Deserialize, Validate)]
pub struct ReminderRequest {
    #[validate(custom(function = "validate_not_blank"))]
    reminder: String,
    date: NaiveDate,
    time: NaiveTime,
}

impl From<ReminderRequest> for NewReminder {
    fn from(request: ReminderRequest) -> Self {
        Self {
            reminder: request.reminder,
            time: request.date.and_time(request.time),
        }
    }
}

#[get("/reminders")]
pub async fn api_get_reminders(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Reminder>>, Status> {
    let reminders = get_all_reminders(db).await?;
    Ok(Json(reminders))
}

#[post("/reminders", data = "<reminder>")]
pub async fn api_add_reminder(
    reminder: Json<ReminderRequest>,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Reminder>>, Custom<Json<ValidationResponse>>> {
    let validated = reminder.validate_custom()?;

    let stored = insert_reminder(db, &NewReminder::from(validated))
        .await
        .validate_custom()?;

    Ok(Custom(Status::Created, Json(stored)))
}

#[delete("/reminders")]
pub async fn api_delete_reminders(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<DeletedResponse>, Status> {
    let deleted = delete_all_reminders(db).await?;
    tracing::warn!(username = %user.username, deleted, "All reminders deleted");
    Ok(Json(DeletedResponse { deleted }))
}

/// The whole page in render order. Statistics and charts are absent while
/// the log is empty.
#[derive(Serialize, Deserialize)]
pub struct DashboardResponse {
    pub user: UserData,
    pub workouts: Vec<Workout>,
    pub statistics: Option<WorkoutStatistics>,
    pub charts: Option<Vec<ChartSeries>>,
    pub reminders: Vec<Reminder>,
}

#[get("/dashboard")]
pub async fn api_dashboard(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<DashboardResponse>, Status> {
    let workouts = get_all_workouts(db).await?;
    let reminders = get_all_reminders(db).await?;

    let statistics = WorkoutStatistics::from_workouts(&workouts);
    let (statistics, charts) = if statistics.is_empty() {
        (None, None)
    } else {
        let charts = chart_series(&statistics.daily);
        (Some(statistics), Some(charts))
    };

    Ok(Json(DashboardResponse {
        user: UserData::from(user),
        workouts,
        statistics,
        charts,
        reminders,
    }))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
