use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority (the default for new tasks).
    #[default]
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is yet to be started (the default for new tasks).
    #[default]
    Pending,
    /// Task is currently being worked on.
    Ongoing,
    /// Task is finished.
    Completed,
}

/// Closed category set a task can be filed under.
/// Corresponds to the `task_tag` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_tag", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskTag {
    /// Uncategorized (the default for new tasks).
    #[default]
    None,
    Me,
    Work,
    Home,
    Projects,
    Relative,
    Education,
    Health,
    Money,
    Creative,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// The task name, unique per owning user.
    pub name: String,
    /// An optional description for the task.
    pub description: Option<String>,
    /// Due date for the task.
    pub end_date: DateTime<Utc>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub tag: TaskTag,
    /// Identifier of the user who owns the task.
    pub user_id: Uuid,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the task.
    pub updated_at: DateTime<Utc>,
}

/// Input structure for creating a task.
///
/// Priority, status and tag fall back to their defaults (low, pending, none)
/// when omitted from the payload.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// The task name. Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    /// An optional description. Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Due date for the task; must be strictly in the future at creation time.
    pub end_date: DateTime<Utc>,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub tag: TaskTag,
}

/// Allow-listed mutable fields for `PUT /tasks/{id}`.
///
/// Id, owner and timestamps are never caller-writable; omitted fields keep
/// their stored values.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub end_date: Option<DateTime<Utc>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub tag: Option<TaskTag>,
}

/// Query parameters for `GET /tasks/tags`.
#[derive(Debug, Deserialize)]
pub struct TagQuery {
    /// Case-insensitive substring to match against the tag.
    pub value: Option<String>,
    /// Optional `column-direction` sort, e.g. `name-desc` or `endDate-asc`.
    pub status: Option<String>,
}

/// A validated ORDER BY clause derived from the `status` query parameter.
///
/// Only whitelisted columns and directions are accepted; the resulting
/// fragment is safe to interpolate into SQL.
#[derive(Debug, PartialEq, Eq)]
pub struct TaskOrder {
    pub column: &'static str,
    pub descending: bool,
}

impl TaskOrder {
    /// Parses a `column-direction` pair against the sortable-column whitelist.
    /// Wire names are the camelCase JSON field names.
    pub fn parse(raw: &str) -> Option<TaskOrder> {
        let mut fragments = raw.splitn(2, '-');
        let column = match fragments.next()? {
            "name" => "name",
            "endDate" => "end_date",
            "priority" => "priority",
            "status" => "status",
            "createdAt" => "created_at",
            _ => return None,
        };
        let descending = match fragments.next().unwrap_or("asc") {
            "asc" => false,
            "desc" => true,
            _ => return None,
        };
        Some(TaskOrder { column, descending })
    }

    pub fn to_sql(&self) -> String {
        format!(
            " ORDER BY {} {}",
            self.column,
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_task_input_defaults() {
        let json = r#"{"name": "Pay rent", "endDate": "2099-01-01T00:00:00Z"}"#;
        let input: TaskInput = serde_json::from_str(json).unwrap();

        assert_eq!(input.priority, TaskPriority::Low);
        assert_eq!(input.status, TaskStatus::Pending);
        assert_eq!(input.tag, TaskTag::None);
        assert!(input.description.is_none());
    }

    #[test]
    fn test_task_input_validation() {
        let valid = TaskInput {
            name: "Valid Task".to_string(),
            description: Some("Valid Description".to_string()),
            end_date: Utc::now(),
            priority: TaskPriority::High,
            status: TaskStatus::Pending,
            tag: TaskTag::Money,
        };
        assert!(valid.validate().is_ok());

        let empty_name = TaskInput {
            name: "".to_string(),
            ..valid_input()
        };
        assert!(empty_name.validate().is_err(), "empty name should fail");

        let long_name = TaskInput {
            name: "a".repeat(201),
            ..valid_input()
        };
        assert!(long_name.validate().is_err(), "201-char name should fail");

        let long_description = TaskInput {
            description: Some("b".repeat(1001)),
            ..valid_input()
        };
        assert!(
            long_description.validate().is_err(),
            "1001-char description should fail"
        );
    }

    fn valid_input() -> TaskInput {
        TaskInput {
            name: "Valid Task".to_string(),
            description: None,
            end_date: Utc::now(),
            priority: TaskPriority::Low,
            status: TaskStatus::Pending,
            tag: TaskTag::None,
        }
    }

    #[test]
    fn test_tag_wire_names_are_lowercase() {
        assert_eq!(serde_json::to_value(TaskTag::None).unwrap(), "none");
        assert_eq!(serde_json::to_value(TaskTag::Money).unwrap(), "money");
        assert_eq!(serde_json::to_value(TaskPriority::High).unwrap(), "high");
        assert_eq!(serde_json::to_value(TaskStatus::Ongoing).unwrap(), "ongoing");
    }

    #[test]
    fn test_task_order_parsing() {
        assert_eq!(
            TaskOrder::parse("name-desc"),
            Some(TaskOrder {
                column: "name",
                descending: true
            })
        );
        assert_eq!(
            TaskOrder::parse("endDate-asc"),
            Some(TaskOrder {
                column: "end_date",
                descending: false
            })
        );
        // Direction defaults to ascending.
        assert_eq!(
            TaskOrder::parse("priority"),
            Some(TaskOrder {
                column: "priority",
                descending: false
            })
        );

        // Outside the whitelist.
        assert_eq!(TaskOrder::parse("user_id-asc"), None);
        assert_eq!(TaskOrder::parse("name; DROP TABLE tasks"), None);
        assert_eq!(TaskOrder::parse("name-sideways"), None);
        assert_eq!(TaskOrder::parse(""), None);
    }

    #[test]
    fn test_task_order_sql() {
        let order = TaskOrder::parse("createdAt-desc").unwrap();
        assert_eq!(order.to_sql(), " ORDER BY created_at DESC");
    }
}
