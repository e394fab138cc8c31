#[cfg(test)]
mod tests {
    use crate::db::{authenticate_user, create_user, find_user_by_username, get_user};
    use crate::error::AppError;
    use crate::test::test_utils::{BCRYPT_MIN_COST, STANDARD_PASSWORD, TestDbBuilder};
    use rocket::tokio;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let user_id = create_user(&test_db.pool, "runner", "password123", BCRYPT_MIN_COST)
            .await
            .expect("Failed to create user");

        let user = find_user_by_username(&test_db.pool, "runner")
            .await
            .expect("Failed to find user")
            .expect("User should exist");

        assert_eq!(user.id, user_id);
        assert_eq!(user.username, "runner");

        let by_id = get_user(&test_db.pool, user_id)
            .await
            .expect("Failed to get user");
        assert_eq!(by_id, user);
    }

    #[tokio::test]
    async fn test_password_is_stored_as_salted_hash() {
        let test_db = TestDbBuilder::new()
            .user("alice")
            .user("bob")
            .build()
            .await
            .expect("Failed to build test database");

        let alice_hash = test_db.password_hash("alice").await.expect("hash");
        let bob_hash = test_db.password_hash("bob").await.expect("hash");

        assert_ne!(alice_hash, STANDARD_PASSWORD);
        assert_ne!(
            alice_hash, bob_hash,
            "Same password should hash differently per account"
        );
        assert!(bcrypt::verify(STANDARD_PASSWORD, &alice_hash).expect("verify"));
    }

    #[tokio::test]
    async fn test_duplicate_signup_reports_conflict_and_keeps_hash() {
        let test_db = TestDbBuilder::new()
            .user("alice")
            .build()
            .await
            .expect("Failed to build test database");

        let original_hash = test_db.password_hash("alice").await.expect("hash");

        let result = create_user(&test_db.pool, "alice", "another-password", BCRYPT_MIN_COST).await;

        match result {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("alice")),
            other => panic!("Expected Conflict error, got {:?}", other),
        }

        let hash_after = test_db.password_hash("alice").await.expect("hash");
        assert_eq!(original_hash, hash_after);

        let still_valid = authenticate_user(&test_db.pool, "alice", STANDARD_PASSWORD)
            .await
            .expect("Failed to authenticate");
        assert!(still_valid.is_some());
    }

    #[tokio::test]
    async fn test_authenticate_user() {
        let test_db = TestDbBuilder::new()
            .user("alice")
            .build()
            .await
            .expect("Failed to build test database");

        let ok = authenticate_user(&test_db.pool, "alice", STANDARD_PASSWORD)
            .await
            .expect("Failed to authenticate");
        assert_eq!(ok.map(|u| u.id), test_db.user_id("alice"));

        let wrong_password = authenticate_user(&test_db.pool, "alice", "wrong-password")
            .await
            .expect("Failed to authenticate");
        assert!(wrong_password.is_none());

        let unknown_user = authenticate_user(&test_db.pool, "nobody", STANDARD_PASSWORD)
            .await
            .expect("Failed to authenticate");
        assert!(unknown_user.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_password_hash_is_an_error() {
        let test_db = TestDbBuilder::new()
            .user("alice")
            .build()
            .await
            .expect("Failed to build test database");

        sqlx::query("UPDATE users SET password_hash = 'not-a-bcrypt-hash' WHERE username = ?")
            .bind("alice")
            .execute(&test_db.pool)
            .await
            .expect("Failed to corrupt hash");

        let result = authenticate_user(&test_db.pool, "alice", STANDARD_PASSWORD).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let result = get_user(&test_db.pool, 42).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
