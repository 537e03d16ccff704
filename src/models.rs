use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::store::Record;

/// A user as persisted in `users.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub password_hash: String,
}

impl UserRecord {
    pub fn new(register: UserRegister, password_hash: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email: register.email,
            first_name: register.first_name,
            last_name: register.last_name,
            birth_date: register.birth_date,
            password_hash,
        }
    }

    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(birth_date) = update.birth_date {
            self.birth_date = birth_date;
        }
    }
}

impl Record for UserRecord {
    fn id(&self) -> Uuid {
        self.user_id
    }
}

/// Public shape of a user. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            user_id: record.user_id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            birth_date: record.birth_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserRegister {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserLogin {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    /// Absent keeps the stored date, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub birth_date: Option<Option<NaiveDate>>,
}

/// Marks a field that was present in the body, even when it was `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A tweet as persisted in `tweets.json`; the author is kept by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetRecord {
    pub tweet_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub by: Uuid,
}

impl TweetRecord {
    pub fn new(draft: TweetCreate, now: DateTime<Utc>) -> Self {
        Self {
            tweet_id: Uuid::new_v4(),
            content: draft.content,
            created_at: now,
            updated_at: None,
            by: draft.by.user_id,
        }
    }

    pub fn edit(&mut self, update: TweetUpdate, now: DateTime<Utc>) {
        self.content = update.content;
        self.updated_at = Some(now);
    }
}

impl Record for TweetRecord {
    fn id(&self) -> Uuid {
        self.tweet_id
    }
}

/// Author reference inside a tweet body. Clients may send the whole user
/// object; everything except `user_id` is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorRef {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TweetCreate {
    #[validate(length(min = 1, max = 240))]
    pub content: String,
    pub by: AuthorRef,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TweetUpdate {
    #[validate(length(min = 1, max = 240))]
    pub content: String,
}

/// Tweet with its author resolved at read time. `by` is `None` when the
/// referenced user does not exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub tweet_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub by: Option<User>,
}

impl Tweet {
    pub fn from_record(record: TweetRecord, author: Option<User>) -> Self {
        Self {
            tweet_id: record.tweet_id,
            content: record.content,
            created_at: record.created_at,
            updated_at: record.updated_at,
            by: author,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn register() -> UserRegister {
        UserRegister {
            email: "a@b.com".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            birth_date: None,
            password: "password1".to_string(),
        }
    }

    fn tweet(content: &str) -> TweetCreate {
        TweetCreate {
            content: content.to_string(),
            by: AuthorRef {
                user_id: Uuid::new_v4(),
            },
        }
    }

    #[test]
    fn register_accepts_valid_body() {
        assert!(register().validate().is_ok());
    }

    #[test]
    fn register_rejects_email_without_at() {
        let mut req = register();
        req.email = "ab.com".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn register_name_bounds() {
        let mut req = register();
        req.first_name = String::new();
        assert!(req.validate().is_err());
        req.first_name = "x".repeat(51);
        assert!(req.validate().is_err());
        req.first_name = "x".repeat(50);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn password_bounds() {
        let mut req = UserLogin {
            email: "a@b.com".to_string(),
            password: "short".to_string(),
        };
        assert!(req.validate().is_err());
        req.password = "p".repeat(65);
        assert!(req.validate().is_err());
        req.password = "p".repeat(64);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn tweet_content_bounds() {
        assert!(tweet("").validate().is_err());
        assert!(tweet(&"a".repeat(241)).validate().is_err());
        assert!(tweet(&"a".repeat(240)).validate().is_ok());
        assert!(tweet("hello").validate().is_ok());
    }

    #[test]
    fn tweet_content_is_counted_in_chars() {
        assert!(tweet(&"é".repeat(240)).validate().is_ok());
    }

    #[test]
    fn update_only_validates_present_fields() {
        assert!(UserUpdate::default().validate().is_ok());
        let update = UserUpdate {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn birth_date_absent_keeps_and_null_clears() {
        let mut req = register();
        req.birth_date = NaiveDate::from_ymd_opt(1990, 4, 1);
        let mut record = UserRecord::new(req, "hash".to_string());

        let keep: UserUpdate = serde_json::from_value(serde_json::json!({
            "first_name": "Alice"
        }))
        .unwrap();
        record.apply(keep);
        assert_eq!(record.first_name, "Alice");
        assert_eq!(record.birth_date, NaiveDate::from_ymd_opt(1990, 4, 1));

        let clear: UserUpdate = serde_json::from_value(serde_json::json!({
            "birth_date": null
        }))
        .unwrap();
        assert_eq!(clear.birth_date, Some(None));
        record.apply(clear);
        assert_eq!(record.birth_date, None);

        let set: UserUpdate = serde_json::from_value(serde_json::json!({
            "birth_date": "2001-02-03"
        }))
        .unwrap();
        record.apply(set);
        assert_eq!(record.birth_date, NaiveDate::from_ymd_opt(2001, 2, 3));
    }

    #[test]
    fn user_view_has_no_password() {
        let record = UserRecord::new(register(), "hash".to_string());
        let json = serde_json::to_value(User::from(record.clone())).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["user_id"], record.user_id.to_string());
    }

    #[test]
    fn tweet_record_uses_supplied_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let mut record = TweetRecord::new(tweet("first"), now);
        assert_eq!(record.created_at, now);
        assert_eq!(record.updated_at, None);

        let later = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        record.edit(
            TweetUpdate {
                content: "second".to_string(),
            },
            later,
        );
        assert_eq!(record.content, "second");
        assert_eq!(record.created_at, now);
        assert_eq!(record.updated_at, Some(later));
    }

    #[test]
    fn tweet_body_accepts_embedded_user_snapshot() {
        let user_id = Uuid::new_v4();
        let body = serde_json::json!({
            "content": "hi",
            "by": {
                "user_id": user_id,
                "email": "a@b.com",
                "first_name": "A",
                "last_name": "B"
            }
        });
        let draft: TweetCreate = serde_json::from_value(body).unwrap();
        assert_eq!(draft.by.user_id, user_id);
    }

    #[test]
    fn record_fields_serialize_as_strings() {
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let record = TweetRecord::new(tweet("x"), now);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["created_at"], "2024-05-06T07:08:09Z");
        assert_eq!(json["tweet_id"], record.tweet_id.to_string());
        assert_eq!(json["by"], record.by.to_string());
    }
}
