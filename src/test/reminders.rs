#[cfg(test)]
mod tests {
    use crate::db::{delete_all_reminders, get_all_reminders, insert_reminder};
    use crate::models::NewReminder;
    use crate::test::test_utils::{TestDbBuilder, date_time};
    use rocket::tokio;

    #[tokio::test]
    async fn test_insert_then_get_all_contains_reminder() {
        let test_db = TestDbBuilder::new()
            .reminder("Stretch", "2024-03-01 07:30")
            .build()
            .await
            .expect("Failed to build test database");

        let reminder = NewReminder {
            reminder: "Leg day".to_string(),
            time: date_time("2024-03-02 18:00"),
        };

        let stored = insert_reminder(&test_db.pool, &reminder)
            .await
            .expect("Failed to insert reminder");

        let all = get_all_reminders(&test_db.pool)
            .await
            .expect("Failed to get reminders");

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].reminder, "Stretch");
        assert_eq!(all[0].time, date_time("2024-03-01 07:30"));
        assert_eq!(all[1], stored);
    }

    #[tokio::test]
    async fn test_delete_all_reminders() {
        let test_db = TestDbBuilder::new()
            .reminder("Stretch", "2024-03-01 07:30")
            .reminder("Hydrate", "2024-03-01 12:00")
            .workout("2024-03-01", "Running", 30, 200)
            .build()
            .await
            .expect("Failed to build test database");

        let deleted = delete_all_reminders(&test_db.pool)
            .await
            .expect("Failed to delete reminders");

        assert_eq!(deleted, 2);
        assert!(
            get_all_reminders(&test_db.pool)
                .await
                .expect("Failed to get reminders")
                .is_empty()
        );

        let workouts = crate::db::get_all_workouts(&test_db.pool)
            .await
            .expect("Failed to get workouts");
        assert_eq!(workouts.len(), 1, "Workouts are not touched by reminder deletion");
    }
}
