//! Database repositories for the catalog
//!
//! One repository per entity, plus the pieces they share: the association
//! manager for media/tag links, the listing query builder, the todo window
//! queries and the transaction helpers.

pub mod association;
pub mod interval;
pub mod media;
pub mod query;
pub mod seed;
pub mod tag;
pub mod todo;
pub mod transaction;

pub use media::{MediaRepository, MediaUpload};
pub use query::MediaFilter;
pub use seed::seed_initial_tags;
pub use tag::TagRepository;
pub use todo::TodoRepository;
