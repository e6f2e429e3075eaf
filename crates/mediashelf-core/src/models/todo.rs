use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::validation::{rule, validate_not_blank};

/// A to-do item, optionally scheduled by a period, a due date, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[validate(schema(function = "validate_todo_period"))]
pub struct Todo {
    pub id: Uuid,
    #[validate(
        length(max = 255, message = "Title must be at most 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Both ends of the period are set.
    pub fn has_period(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }

    pub fn has_due_date(&self) -> bool {
        self.due_date.is_some()
    }

    /// Pending and past its deadline at `now`.
    ///
    /// The due date wins over the end of the period when both are set.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        match self.due_date.or(self.end_date) {
            Some(deadline) => now > deadline,
            None => false,
        }
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Utc::now())
    }
}

fn validate_todo_period(todo: &Todo) -> Result<(), ValidationError> {
    check_period(todo.start_date, todo.end_date)
}

fn check_period(
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match (start_date, end_date) {
        (Some(start), Some(end)) if start > end => Err(rule(
            "inverted_period",
            "start_date must not be after end_date",
        )),
        (Some(_), None) | (None, Some(_)) => Err(rule(
            "half_period",
            "start_date and end_date must be set together",
        )),
        _ => Ok(()),
    }
}

/// Request DTO for creating a todo
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_new_todo_period"))]
pub struct NewTodo {
    #[validate(
        length(max = 255, message = "Title must be at most 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_period(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }
}

fn validate_new_todo_period(todo: &NewTodo) -> Result<(), ValidationError> {
    check_period(todo.start_date, todo.end_date)
}
