use super::ids::{ClassId, UserId, WordId};
use crate::credential::Credential;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "MANAGER")]
    Manager,
    #[serde(rename = "USER")]
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Student => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "MANAGER" => Ok(Role::Manager),
            "USER" => Ok(Role::Student),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    #[serde(alias = "password")]
    pub password_hash: Credential,
}

impl User {
    pub fn verify_password(&self, password: &str) -> bool {
        self.password_hash.verify(password)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAssignment {
    pub teacher_id: UserId,
    pub class_id: ClassId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssignment {
    pub student_id: UserId,
    pub class_id: ClassId,
    pub teacher_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: WordId,
    pub word: String,
    pub class_id: ClassId,
    pub mentor_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 1 (easiest) to 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The caller on whose behalf a read or write happens. Supplied by the UI, never verified here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: UserId,
    pub role: Role,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<Credential>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Optional word metadata given at creation.
#[derive(Debug, Clone, Default)]
pub struct WordDetails {
    pub category: Option<String>,
    pub difficulty: Option<u8>,
}

/// `category: Some("")` clears the category.
#[derive(Debug, Clone, Default)]
pub struct WordPatch {
    pub word: Option<String>,
    pub class_id: Option<ClassId>,
    pub mentor_id: Option<UserId>,
    pub category: Option<String>,
    pub difficulty: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_uses_panel_spelling_on_the_wire() {
        assert_eq!(serde_json::to_string(&Role::Student).expect("ser"), "\"USER\"");
        let r: Role = serde_json::from_str("\"MANAGER\"").expect("de");
        assert_eq!(r, Role::Manager);
        assert!("TEACHER".parse::<Role>().is_err());
    }

    #[test]
    fn word_without_timestamps_keeps_panel_shape() {
        let raw = serde_json::json!({ "id": 1, "word": "ADVENTURE", "classId": 1, "mentorId": 1 });
        let w: Word = serde_json::from_value(raw.clone()).expect("de");
        assert_eq!(serde_json::to_value(&w).expect("ser"), raw);
        assert_eq!((w.category, w.difficulty), (None, None));
    }

    #[test]
    fn word_metadata_round_trips_when_present() {
        let raw = serde_json::json!({
            "id": 2, "word": "LION", "classId": 1, "mentorId": 1,
            "category": "Animals", "difficulty": 2
        });
        let w: Word = serde_json::from_value(raw.clone()).expect("de");
        assert_eq!(w.category.as_deref(), Some("Animals"));
        assert_eq!(w.difficulty, Some(2));
        assert_eq!(serde_json::to_value(&w).expect("ser"), raw);
    }
}
