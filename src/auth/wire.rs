//! JSON action protocol spoken by account endpoints.
//!
//! Request: `{"action": "register" | "login" | "update_level", "username": .., "password": .., "level": ..}`
//! Reply:   `{"ok": bool, "message": "..", "user": {"username": .., "level": ..}}` (`user` only on success)
//!
//! Field decoding is forgiving the way a loosely typed endpoint is: numbers are accepted for
//! strings, numeric strings for levels, and null or missing values take defaults.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{AccountView, AuthError, Credentials, FailureKind, LevelUpdate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: String,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub username: String,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub password: String,
    #[serde(
        default,
        deserialize_with = "lenient_request_level",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<i64>,
}

impl ActionRequest {
    pub fn register(credentials: &Credentials) -> Self {
        Self::with_credentials("register", credentials)
    }

    pub fn login(credentials: &Credentials) -> Self {
        Self::with_credentials("login", credentials)
    }

    pub fn update_level(update: &LevelUpdate) -> Self {
        Self {
            action: "update_level".to_string(),
            username: update.username.clone(),
            password: String::new(),
            level: Some(i64::from(update.level)),
        }
    }

    fn with_credentials(action: &str, credentials: &Credentials) -> Self {
        Self {
            action: action.to_string(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            level: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReply {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AccountView>,
}

impl ActionReply {
    pub fn success(message: &str, user: AccountView) -> Self {
        Self {
            ok: true,
            message: message.to_string(),
            user: Some(user),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            ok: false,
            message: message.to_string(),
            user: None,
        }
    }

    /// Convert an endpoint answer into the capability result.
    ///
    /// `status` classifies rejections; a successful reply without a user is a protocol fault.
    pub fn into_result(self, status: u16) -> Result<AccountView, AuthError> {
        if !self.ok || !(200..300).contains(&status) {
            let message = if self.message.is_empty() {
                "Backend request failed.".to_string()
            } else {
                self.message
            };
            let kind = if (200..300).contains(&status) {
                FailureKind::BadRequest
            } else {
                FailureKind::from_status(status)
            };
            return Err(AuthError::rejected(kind, message));
        }
        self.user
            .ok_or_else(|| AuthError::Transport("reply is missing the user record".to_string()))
    }
}

/// Status code plus reply body, ready to be written by whatever transport hosts the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireReply {
    pub status: u16,
    pub body: ActionReply,
}

impl WireReply {
    pub fn ok(message: &str, user: AccountView) -> Self {
        Self {
            status: 200,
            body: ActionReply::success(message, user),
        }
    }

    pub fn error(kind: FailureKind, message: &str) -> Self {
        Self {
            status: kind.status_code(),
            body: ActionReply::failure(message),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.body)
            .unwrap_or_else(|_| r#"{"ok":false,"message":"Internal server error."}"#.to_string())
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        _ => String::new(),
    }
}

fn value_to_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let t = s.trim();
            let end = t
                .char_indices()
                .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
                .map(|(i, _)| i)
                .unwrap_or(t.len());
            t[..end].parse().unwrap_or(0)
        }
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

/// Request levels: null counts as 1, anything else is converted to an integer (0 when unparseable)
/// so that range checks can reject it.
fn lenient_request_level<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(Some(1));
    }
    Ok(Some(value_to_int(&value)))
}

/// Account levels in replies: anything below 1 or unparseable counts as 1.
pub(crate) fn lenient_level<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let level = value_to_int(&value);
    Ok(u32::try_from(level).ok().filter(|l| *l >= 1).unwrap_or(1))
}
