//! Integration tests per i messaggi diretti

mod common;

#[cfg(test)]
mod message_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_send_and_read_messages(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let (alice_name, alice_value) = auth_header(ALICE.0, ALICE.1);
        let (bob_name, bob_value) = auth_header(BOB.0, BOB.1);

        for content in ["first", "second"] {
            server
                .post("/messages")
                .add_header(alice_name.clone(), alice_value.clone())
                .json(&json!({"receiverId": BOB.0, "content": content}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let inbox: Value = server
            .get("/messages/inbox")
            .add_header(bob_name.clone(), bob_value.clone())
            .await
            .json();
        let inbox = inbox.as_array().unwrap();
        assert_eq!(inbox.len(), 2);
        // più recenti prima
        assert_eq!(inbox[0]["content"], "second");
        assert_eq!(inbox[0]["senderId"], ALICE.0);

        let sent: Value = server
            .get("/messages/sent")
            .add_header(alice_name, alice_value)
            .await
            .json();
        assert_eq!(sent.as_array().unwrap().len(), 2);

        let bob_sent: Value = server
            .get("/messages/sent")
            .add_header(bob_name, bob_value)
            .await
            .json();
        assert!(bob_sent.as_array().unwrap().is_empty());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_send_message_rules(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let (name, value) = auth_header(ALICE.0, ALICE.1);

        server
            .post("/messages")
            .add_header(name.clone(), value.clone())
            .json(&json!({"receiverId": ALICE.0, "content": "note to self"}))
            .await
            .assert_status_bad_request();

        server
            .post("/messages")
            .add_header(name.clone(), value.clone())
            .json(&json!({"receiverId": BOB.0, "content": ""}))
            .await
            .assert_status_bad_request();

        server
            .post("/messages")
            .add_header(name.clone(), value.clone())
            .json(&json!({"receiverId": 999, "content": "hello?"}))
            .await
            .assert_status_not_found();

        // alice non fa parte di Climbers
        server
            .post("/messages")
            .add_header(name.clone(), value.clone())
            .json(&json!({"receiverId": CHARLIE.0, "content": "hi", "groupId": 2}))
            .await
            .assert_status_forbidden();

        let scoped = server
            .post("/messages")
            .add_header(name, value)
            .json(&json!({"receiverId": BOB.0, "content": "join us", "groupId": 1}))
            .await;
        scoped.assert_status(StatusCode::CREATED);
        assert_eq!(scoped.json::<Value>()["groupId"], 1);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_decisions_leave_a_note_in_the_inbox(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let (alice_name, alice_value) = auth_header(ALICE.0, ALICE.1);
        let (dave_name, dave_value) = auth_header(DAVE.0, DAVE.1);

        let request: Value = server
            .post("/groups/1/requests")
            .add_header(dave_name.clone(), dave_value.clone())
            .json(&json!({"userId": DAVE.0}))
            .await
            .json();

        server
            .put(&format!("/groups/requests/{}/handle", request["id"]))
            .add_header(alice_name, alice_value)
            .json(&json!({"status": "REJECTED"}))
            .await
            .assert_status_ok();

        let inbox: Value = server
            .get("/messages/inbox")
            .add_header(dave_name, dave_value)
            .await
            .json();
        assert_eq!(inbox.as_array().unwrap().len(), 1);
        assert_eq!(inbox[0]["senderId"], ALICE.0);
        assert_eq!(inbox[0]["content"], "Your request to join \"Hikers\" was rejected");
        Ok(())
    }
}
