//! Integration tests per autenticazione e utenti

mod common;

#[cfg(test)]
mod auth_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    fn registration(email: &str) -> Value {
        json!({
            "firstName": "Erika",
            "lastName": "Galli",
            "email": email,
            "password": "password123",
        })
    }

    #[sqlx::test]
    async fn test_register_then_login(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let registered = server
            .post("/auth/register")
            .json(&registration("erika@x.com"))
            .await;
        registered.assert_status(StatusCode::CREATED);
        let user: Value = registered.json();
        assert_eq!(user["email"], "erika@x.com");
        assert!(user["groupId"].is_null());
        assert!(user.get("password").is_none());

        let login = server
            .post("/auth/login")
            .json(&json!({"email": "erika@x.com", "password": "password123"}))
            .await;
        login.assert_status_ok();

        let header = login.header("authorization");
        let header = header.to_str().unwrap();
        assert!(header.starts_with("Bearer "));

        let body: Value = login.json();
        assert_eq!(body["user"]["id"], user["id"]);
        assert_eq!(&header["Bearer ".len()..], body["token"].as_str().unwrap());

        // il token ottenuto permette di accedere alle route protette
        let me = server
            .get("/users/me")
            .add_header(
                axum_test::http::HeaderName::from_static("authorization"),
                header.to_string(),
            )
            .await;
        me.assert_status_ok();
        assert_eq!(me.json::<Value>()["email"], "erika@x.com");
        Ok(())
    }

    #[sqlx::test]
    async fn test_register_duplicate_email(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/auth/register")
            .json(&registration("erika@x.com"))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post("/auth/register")
            .json(&registration("Erika@X.com"))
            .await
            .assert_status(StatusCode::CONFLICT);
        Ok(())
    }

    #[sqlx::test]
    async fn test_register_invalid_body(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/auth/register")
            .json(&registration("not-an-email"))
            .await
            .assert_status_bad_request();

        let mut short_password = registration("erika@x.com");
        short_password["password"] = json!("short");
        server
            .post("/auth/register")
            .json(&short_password)
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test]
    async fn test_login_wrong_credentials(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/auth/register")
            .json(&registration("erika@x.com"))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post("/auth/login")
            .json(&json!({"email": "erika@x.com", "password": "wrong-password"}))
            .await
            .assert_status_unauthorized();

        server
            .post("/auth/login")
            .json(&json!({"email": "ghost@x.com", "password": "password123"}))
            .await
            .assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_token_for_deleted_user(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let (name, value) = auth_header(99, "ghost@x.com");

        server
            .get("/users/me")
            .add_header(name, value)
            .await
            .assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_token_signed_with_other_secret(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let token = create_test_jwt(ALICE.0, ALICE.1, "another-secret");

        server
            .get("/users/me")
            .add_header(
                axum_test::http::HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await
            .assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_missing_bearer_scheme(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let token = create_test_jwt(ALICE.0, ALICE.1, JWT_SECRET);

        server
            .get("/users/me")
            .add_header(axum_test::http::HeaderName::from_static("authorization"), token)
            .await
            .assert_status_unauthorized();

        server.get("/users/me").await.assert_status_forbidden();
        Ok(())
    }

    // ============================================================
    // GET /users/{id}, GET /users?email=
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_user_lookup(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let (name, value) = auth_header(BOB.0, BOB.1);

        let alice = server
            .get("/users/1")
            .add_header(name.clone(), value.clone())
            .await;
        alice.assert_status_ok();
        let alice: Value = alice.json();
        assert_eq!(alice["email"], ALICE.1);
        assert_eq!(alice["groupId"], 1);

        server
            .get("/users/999")
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_not_found();

        let found = server
            .get("/users")
            .add_query_param("email", "CHARLIE@x.com")
            .add_header(name.clone(), value.clone())
            .await;
        found.assert_status_ok();
        assert_eq!(found.json::<Value>()["id"], CHARLIE.0);

        server
            .get("/users")
            .add_query_param("email", "nobody@x.com")
            .add_header(name, value)
            .await
            .assert_status_not_found();
        Ok(())
    }

    // ============================================================
    // PUT /users/me
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_update_profile(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let (name, value) = auth_header(ALICE.0, ALICE.1);

        let updated = server
            .put("/users/me")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "firstName": "Alicia",
                "phone": "+39 333 1234567",
                "location": "Torino",
                "avatar": "https://cdn.example.com/alice.png",
                "wallpaper": "https://cdn.example.com/alps.jpg",
            }))
            .await;
        updated.assert_status_ok();
        let updated: Value = updated.json();
        assert_eq!(updated["firstName"], "Alicia");
        assert_eq!(updated["lastName"], "Rossi");
        assert_eq!(updated["location"], "Torino");
        assert_eq!(updated["avatar"], "https://cdn.example.com/alice.png");
        assert_eq!(updated["wallpaper"], "https://cdn.example.com/alps.jpg");
        assert_eq!(updated["email"], ALICE.1);

        let me: Value = server
            .get("/users/me")
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(me["firstName"], "Alicia");
        assert_eq!(me["phone"], "+39 333 1234567");

        // body vuoto: nessuna modifica
        let unchanged = server
            .put("/users/me")
            .add_header(name.clone(), value.clone())
            .json(&json!({}))
            .await;
        unchanged.assert_status_ok();
        assert_eq!(unchanged.json::<Value>()["firstName"], "Alicia");

        server
            .put("/users/me")
            .add_header(name.clone(), value.clone())
            .json(&json!({"avatar": "not a url"}))
            .await
            .assert_status_bad_request();

        server
            .put("/users/me")
            .add_header(name, value)
            .json(&json!({"lastName": ""}))
            .await
            .assert_status_bad_request();

        server
            .put("/users/me")
            .json(&json!({"firstName": "Nobody"}))
            .await
            .assert_status_forbidden();
        Ok(())
    }
}
