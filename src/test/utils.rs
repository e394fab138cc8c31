#[cfg(test)]
pub mod test_utils {
    use crate::db::{create_user, insert_reminder, insert_workout};
    use crate::env::Settings;
    use crate::error::AppError;
    use crate::init_rocket;
    use crate::models::{NewReminder, NewWorkout};
    use chrono::{NaiveDate, NaiveDateTime};
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::Once;
    use tracing::log::LevelFilter;

    use crate::api::LoginResponse;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";
    /// bcrypt's minimum cost (`bcrypt::MIN_COST` is private in the bcrypt crate).
    pub const BCRYPT_MIN_COST: u32 = 4;

    pub fn test_settings() -> Settings {
        Settings {
            bcrypt_cost: BCRYPT_MIN_COST,
            ..Settings::default()
        }
    }

    pub fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("test date should parse")
    }

    pub fn date_time(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").expect("test timestamp should parse")
    }

    pub fn new_workout(day: &str, exercise: &str, duration: i64, calories: i64) -> NewWorkout {
        NewWorkout {
            date: date(day),
            exercise: exercise.to_string(),
            duration,
            calories,
        }
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<(String, String)>,
        workouts: Vec<NewWorkout>,
        reminders: Vec<NewReminder>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn user(self, username: &str) -> Self {
            self.user_with_password(username, STANDARD_PASSWORD)
        }

        pub fn user_with_password(mut self, username: &str, password: &str) -> Self {
            self.users.push((username.to_string(), password.to_string()));
            self
        }

        pub fn workout(mut self, day: &str, exercise: &str, duration: i64, calories: i64) -> Self {
            self.workouts.push(new_workout(day, exercise, duration, calories));
            self
        }

        pub fn reminder(mut self, reminder: &str, time: &str) -> Self {
            self.reminders.push(NewReminder {
                reminder: reminder.to_string(),
                time: date_time(time),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .filter_level(LevelFilter::Debug)
                    .is_test(true)
                    .try_init();
            });

            // A single connection keeps every query on the same in-memory database
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            let mut user_id_map: HashMap<String, i64> = HashMap::new();

            for (username, password) in &self.users {
                let user_id = create_user(&pool, username, password, BCRYPT_MIN_COST).await?;
                user_id_map.insert(username.clone(), user_id);
            }

            for workout in &self.workouts {
                insert_workout(&pool, workout).await?;
            }

            for reminder in &self.reminders {
                insert_reminder(&pool, reminder).await?;
            }

            Ok(TestDb { pool, user_id_map })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn user_id(&self, username: &str) -> Option<i64> {
            self.user_id_map.get(username).copied()
        }

        pub async fn password_hash(&self, username: &str) -> Result<String, sqlx::Error> {
            sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE username = ?")
                .bind(username)
                .fetch_one(&self.pool)
                .await
        }
    }

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .user("athlete")
            .user("coach")
            .build()
            .await
            .expect("Failed to build standard test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        setup_test_client_with_settings(test_db, test_settings()).await
    }

    pub async fn setup_test_client_with_settings(
        test_db: TestDb,
        settings: Settings,
    ) -> (Client, TestDb) {
        let rocket = init_rocket(test_db.pool.clone(), settings).await;
        let client = Client::tracked(rocket)
            .await
            .expect("valid rocket instance");

        (client, test_db)
    }

    pub async fn login_test_user(client: &Client, username: &str, password: &str) -> LoginResponse {
        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": username,
                    "password": password
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        response
            .into_json::<LoginResponse>()
            .await
            .expect("login response should be JSON")
    }
}
