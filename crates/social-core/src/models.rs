//! Wire types exchanged with the REST API.
//!
//! The server sends numeric ids; the client keeps them as strings so that
//! views never care which form arrived.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Accepts RFC 3339 as well as the zone-less timestamps the server emits.
/// Anything unparseable becomes `None` rather than failing the whole payload.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    Ok(NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Single uppercase letter for avatar-style display
    pub fn initial(&self) -> char {
        self.username
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub content: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub author_id: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: u32,
    pub author: User,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewPost<'a> {
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileUpdate<'a> {
    pub bio: &'a str,
}

/// FastAPI-style error body: `{"detail": "..."}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_numeric_id() {
        let user: User = serde_json::from_str(
            r#"{"id": 1, "username": "alice", "email": "a@b.com", "bio": null,
                "created_at": "2024-01-02T03:04:05Z"}"#,
        )
        .unwrap();
        assert_eq!(user.id, "1");
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_user_string_id_and_minimal_fields() {
        let user: User = serde_json::from_str(r#"{"id": "1", "username": "a"}"#).unwrap();
        assert_eq!(user.id, "1");
        assert_eq!(user.email, "");
        assert_eq!(user.bio, None);
    }

    #[test]
    fn test_naive_timestamp_is_read_as_utc() {
        let user: User = serde_json::from_str(
            r#"{"id": 2, "username": "b", "created_at": "2024-01-02T03:04:05.123456"}"#,
        )
        .unwrap();
        assert_eq!(user.created_at.unwrap().to_rfc3339(), "2024-01-02T03:04:05.123456+00:00");
    }

    #[test]
    fn test_unparseable_timestamp_is_dropped() {
        let user: User =
            serde_json::from_str(r#"{"id": 2, "username": "b", "created_at": "soon"}"#).unwrap();
        assert_eq!(user.created_at, None);
    }

    #[test]
    fn test_user_initial() {
        let user: User = serde_json::from_str(r#"{"id": "1", "username": "bob"}"#).unwrap();
        assert_eq!(user.initial(), 'B');
    }

    #[test]
    fn test_post_with_author() {
        let post: Post = serde_json::from_str(
            r#"{"id": 7, "content": "hi", "created_at": "2024-01-02T03:04:05Z",
                "author_id": 1, "likes": 2, "comments": 0,
                "author": {"id": 1, "username": "alice", "email": "a@b.com"}}"#,
        )
        .unwrap();
        assert_eq!(post.id, "7");
        assert_eq!(post.author_id, "1");
        assert_eq!(post.likes, 2);
        assert_eq!(post.author.username, "alice");
    }

    #[test]
    fn test_post_without_author_id() {
        let post: Post = serde_json::from_str(
            r#"{"id": 8, "content": "hi", "author": {"id": 3, "username": "c"}}"#,
        )
        .unwrap();
        assert_eq!(post.author_id, "");
        assert_eq!(post.author.id, "3");
    }
}
