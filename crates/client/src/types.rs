//! Wire types for the task API

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Login request body for `POST token/`
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Registration request body for `POST register/`
pub type RegisterRequest<'a> = LoginRequest<'a>;

/// Credential pair issued by a successful login
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Renewal request body for `POST token/refresh/`
#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Renewal response body
#[derive(Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
}

/// The authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: u64,
    pub username: String,
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Task category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Work,
    Study,
    #[default]
    Personal,
    Urgent,
}

/// A task as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tag: Tag,
}

/// Body for `POST tasks/`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTask {
    pub title: String,
    pub deadline: Option<NaiveDate>,
    pub priority: Priority,
    pub tag: Tag,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Body for `PUT tasks/{id}/`
#[derive(Debug, Clone, Serialize)]
pub struct TaskUpdate {
    pub title: String,
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
}

/// Body for `PATCH tasks/{id}/`
#[derive(Debug, Clone, Serialize)]
pub struct CompletionPatch {
    pub completed: bool,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Work => "work",
            Self::Study => "study",
            Self::Personal => "personal",
            Self::Urgent => "urgent",
        })
    }
}

impl FromStr for Tag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "work" => Ok(Self::Work),
            "study" => Ok(Self::Study),
            "personal" => Ok(Self::Personal),
            "urgent" => Ok(Self::Urgent),
            other => Err(format!("unknown tag: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_defaults_missing_fields() {
        let task: Task = serde_json::from_value(json!({"id": 1, "title": "x"})).unwrap();
        assert!(!task.completed);
        assert_eq!(task.deadline, None);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.tag, Tag::Personal);
    }

    #[test]
    fn task_parses_backend_shape() {
        let task: Task = serde_json::from_value(json!({
            "id": 4,
            "title": "ship it",
            "completed": true,
            "deadline": "2025-03-01",
            "priority": "high",
            "tag": "work",
            "owner": 2
        }))
        .unwrap();
        assert_eq!(task.deadline, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.tag, Tag::Work);
    }

    #[test]
    fn update_omits_unset_fields() {
        let body = serde_json::to_value(TaskUpdate {
            title: "t".into(),
            deadline: None,
            priority: None,
            tag: Some(Tag::Urgent),
        })
        .unwrap();
        assert_eq!(body, json!({"title": "t", "deadline": null, "tag": "urgent"}));
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("Study".parse::<Tag>(), Ok(Tag::Study));
        assert!("later".parse::<Priority>().is_err());
    }
}
