//! Listing queries for media
//!
//! A [`MediaFilter`] is turned into a [`Predicate`] once, and that single
//! predicate is written into both the row query and the count query. The
//! count therefore always describes exactly the set the pages are cut from.

use mediashelf_core::PageRequest;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

const MEDIA_COLUMNS: &str = "m.id, m.kind, m.storage_key, m.external_url, m.title, m.description, m.created_at, m.updated_at";

/// Newest first; the id breaks ties so pages stay stable between calls.
const MEDIA_ORDER: &str = " ORDER BY m.created_at DESC, m.id DESC";

/// Filters for media listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaFilter {
    /// Case-insensitive substring of the title. Blank means no title filter.
    pub title_contains: Option<String>,
    /// Media carrying ANY of these tags. Empty means no tag filter.
    pub tag_ids: Vec<Uuid>,
}

impl MediaFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title_contains = Some(title.into());
        self
    }

    pub fn tags(mut self, tag_ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.tag_ids = tag_ids.into_iter().collect();
        self
    }

    pub fn tag(self, tag_id: Uuid) -> Self {
        self.tags([tag_id])
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    Text(String),
    UuidList(Vec<Uuid>),
}

/// One `prefix <bind> suffix` fragment of a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
struct Clause {
    prefix: &'static str,
    value: BindValue,
    suffix: &'static str,
}

/// Clauses joined with a fixed join word.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
    join: &'static str,
}

impl Predicate {
    fn all() -> Self {
        Self {
            clauses: Vec::new(),
            join: " AND ",
        }
    }

    fn push(&mut self, prefix: &'static str, value: BindValue, suffix: &'static str) {
        self.clauses.push(Clause {
            prefix,
            value,
            suffix,
        });
    }

    pub fn from_filter(filter: &MediaFilter) -> Self {
        let mut predicate = Self::all();

        if let Some(title) = filter.title_contains.as_deref() {
            let title = title.trim();
            if !title.is_empty() {
                predicate.push(
                    "m.title ILIKE ",
                    BindValue::Text(format!("%{}%", escape_like(title))),
                    "",
                );
            }
        }

        let tag_ids = dedup(&filter.tag_ids);
        if !tag_ids.is_empty() {
            // Membership against distinct ids, so a medium matching two tags
            // still yields one row.
            predicate.push(
                "m.id IN (SELECT DISTINCT mt.media_id FROM media_tag mt WHERE mt.tag_id = ANY(",
                BindValue::UuidList(tag_ids),
                "))",
            );
        }

        predicate
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Append ` WHERE ...` (or nothing) to `qb`.
    fn write_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        if self.clauses.is_empty() {
            return;
        }

        qb.push(" WHERE ");
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                qb.push(self.join);
            }
            qb.push(clause.prefix);
            match &clause.value {
                BindValue::Text(s) => qb.push_bind(s.clone()),
                BindValue::UuidList(ids) => qb.push_bind(ids.clone()),
            };
            qb.push(clause.suffix);
        }
    }
}

/// Row and count queries sharing one predicate.
pub struct MediaQueries {
    pub rows: QueryBuilder<'static, Postgres>,
    pub count: QueryBuilder<'static, Postgres>,
}

/// Build the listing queries for `filter`.
///
/// With `page = None` the row query returns the whole filtered set.
pub fn media_queries(filter: &MediaFilter, page: Option<PageRequest>) -> MediaQueries {
    let predicate = Predicate::from_filter(filter);

    let mut rows = QueryBuilder::new(format!("SELECT {} FROM media m", MEDIA_COLUMNS));
    predicate.write_where(&mut rows);
    rows.push(MEDIA_ORDER);
    if let Some(page) = page {
        rows.push(" LIMIT ");
        rows.push_bind(page.limit());
        rows.push(" OFFSET ");
        rows.push_bind(page.offset());
    }

    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM media m");
    predicate.write_where(&mut count);

    MediaQueries { rows, count }
}

/// Escape LIKE wildcards so user text matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub(crate) fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}
