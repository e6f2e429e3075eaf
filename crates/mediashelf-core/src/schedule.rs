//! Date windows and the overlap rules used to schedule todos.
//!
//! The SQL in `mediashelf-db` mirrors these predicates; keep them in step.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::error::AppError;
use crate::models::Todo;

/// A closed interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidInput(format!(
                "window start {} is after window end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The whole UTC day: midnight through 23:59:59.
    pub fn day(date: NaiveDate) -> Self {
        let start = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
        Self {
            start,
            end: start + Duration::days(1) - Duration::seconds(1),
        }
    }

    /// The UTC day containing `instant`.
    pub fn day_of(instant: DateTime<Utc>) -> Self {
        Self::day(instant.date_naive())
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// True if the todo's period or due date touches the window, bounds inclusive.
pub fn overlaps(todo: &Todo, window: &Window) -> bool {
    let period_hit = match (todo.start_date, todo.end_date) {
        (Some(start), Some(end)) => start <= window.end && end >= window.start,
        _ => false,
    };
    let due_hit = todo.due_date.map(|d| window.contains(d)).unwrap_or(false);
    period_hit || due_hit
}

/// Pending todos that overlap the window.
pub fn is_upcoming(todo: &Todo, window: &Window) -> bool {
    !todo.completed && overlaps(todo, window)
}

/// Sort key for window listings: the earlier of `start_date` and `due_date`.
pub fn schedule_anchor(todo: &Todo) -> Option<DateTime<Utc>> {
    match (todo.start_date, todo.due_date) {
        (Some(s), Some(d)) => Some(s.min(d)),
        (s, d) => s.or(d),
    }
}

/// Neither a period nor a due date is set.
pub fn is_unscheduled(todo: &Todo) -> bool {
    todo.start_date.is_none() && todo.end_date.is_none() && todo.due_date.is_none()
}
