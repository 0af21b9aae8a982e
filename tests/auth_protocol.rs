mod common;

use common::local_auth;
use dungeon_fighter::auth::wire::ActionReply;
use tokio::runtime::Runtime;

#[test]
fn json_actions_end_to_end() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let tmp = tempfile::tempdir().unwrap();
        let auth = local_auth(&tmp).await;

        let reply = auth
            .handle_json(r#"{"action":"register","username":" bob_1 ","password":"pw"}"#)
            .await;
        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.to_json(),
            r#"{"ok":true,"message":"Registration successful.","user":{"username":"bob_1","level":1}}"#
        );

        let reply = auth
            .handle_json(r#"{"action":"Update_Level","username":"bob_1","level":"3"}"#)
            .await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body.message, "Progress updated.");
        assert_eq!(reply.body.user.as_ref().map(|u| u.level), Some(3));

        let reply = auth
            .handle_json(r#"{"action":"LOGIN","username":"bob_1","password":"pw"}"#)
            .await;
        let parsed: ActionReply = serde_json::from_str(&reply.to_json()).unwrap();
        assert_eq!(parsed.into_result(reply.status).unwrap().level, 3);
    });
}

#[test]
fn json_failures_carry_status_codes() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let tmp = tempfile::tempdir().unwrap();
        let auth = local_auth(&tmp).await;
        auth.store().create_account("carol", "pw").await.unwrap();

        let cases = [
            ("not json", 400, "Invalid JSON payload."),
            ("[1,2]", 400, "Invalid JSON payload."),
            (r#"{"action":"dance"}"#, 400, "Unknown action."),
            (
                r#"{"action":"register","username":"carol"}"#,
                400,
                "Username and password are required.",
            ),
            (
                r#"{"action":"register","username":"x","password":"pw"}"#,
                400,
                "Username must be 3-24 chars: letters, numbers, underscore.",
            ),
            (
                r#"{"action":"register","username":"carol","password":"pw"}"#,
                409,
                "Username already exists.",
            ),
            (
                r#"{"action":"login","username":"carol","password":"nope"}"#,
                401,
                "Invalid credentials.",
            ),
            (
                r#"{"action":"update_level","username":"","level":2}"#,
                400,
                "Username is required.",
            ),
            (
                r#"{"action":"update_level","username":"carol","level":0}"#,
                400,
                "Level must be at least 1.",
            ),
            (
                r#"{"action":"update_level","username":"dave","level":2}"#,
                404,
                "User not found.",
            ),
        ];
        for (payload, status, message) in cases {
            let reply = auth.handle_json(payload).await;
            assert_eq!(reply.status, status, "payload {}", payload);
            assert!(!reply.body.ok);
            assert_eq!(reply.body.message, message, "payload {}", payload);
            assert!(reply.body.user.is_none());
        }
    });
}
