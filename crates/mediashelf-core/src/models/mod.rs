//! Data models for the catalog
//!
//! Each sub-module holds one entity together with its insert DTO and the
//! classification helpers derived from its fields.

mod media;
mod tag;
mod todo;
mod validation;

pub use media::{Media, MediaKind, MediaRow, MediaSource, NewMedia};
pub use tag::{NewTag, Tag, TagScope};
pub use todo::{NewTodo, Todo};
pub use validation::validate_not_blank;
