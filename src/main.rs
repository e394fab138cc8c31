#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod db;
mod env;
mod error;
mod export;
mod models;
mod stats;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use std::str::FromStr;
use std::time::Duration;

use api::{
    api_add_reminder, api_dashboard, api_delete_reminders, api_delete_workouts,
    api_export_workouts, api_get_charts, api_get_reminders, api_get_statistics, api_get_workouts,
    api_import_workouts, api_log_workout, api_login, api_logout, api_me, api_signup, health,
};
use auth::unauthorized_api;
use db::clean_expired_sessions;
use env::{ConfigError, EnvFileLoad, Settings, load_environment};
use error::AppError;
use rocket::{Build, Rocket};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use telemetry::{TelemetryFairing, init_tracing};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
    #[error("Launch error: {0}")]
    Rocket(#[from] Box<rocket::Error>),
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    let env_files = load_environment()?;
    let settings = Settings::from_env()?;

    init_tracing(&settings)?;
    env_files.iter().for_each(EnvFileLoad::log);

    let options = SqliteConnectOptions::from_str(&settings.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(AppError::from)?;
    info!("Migrations completed successfully");

    spawn_session_cleanup(
        pool.clone(),
        Duration::from_secs(settings.session_cleanup_interval_secs),
    );

    init_rocket(pool, settings)
        .await
        .launch()
        .await
        .map_err(Box::new)?;

    Ok(())
}

fn spawn_session_cleanup(pool: SqlitePool, interval: Duration) {
    rocket::tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(interval).await;
        }
    });
}

pub async fn init_rocket(pool: SqlitePool, settings: Settings) -> Rocket<Build> {
    info!("Starting fitness tracker");

    rocket::build()
        .manage(pool)
        .manage(settings)
        .mount(
            "/api",
            routes![
                api_signup,
                api_login,
                api_logout,
                api_me,
                api_get_workouts,
                api_log_workout,
                api_delete_workouts,
                api_export_workouts,
                api_import_workouts,
                api_get_statistics,
                api_get_charts,
                api_get_reminders,
                api_add_reminder,
                api_delete_reminders,
                api_dashboard,
                health,
            ],
        )
        .register("/api", catchers![unauthorized_api])
        .attach(TelemetryFairing)
}
