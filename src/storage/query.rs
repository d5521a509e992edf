use crate::core::CatalogItem;
use std::cmp::Ordering;

/// Column a query result is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Title,
    Id,
    ReleaseDate,
    Genre,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Result ordering. Defaults to `title` ascending.
///
/// String columns compare byte-wise (case-sensitive collation: "Zelda"
/// sorts before "apex"). Ties are always broken by ascending `id` so the
/// order is total and reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn compare(&self, a: &CatalogItem, b: &CatalogItem) -> Ordering {
        let primary = match self.field {
            SortField::Title => a.title.cmp(&b.title),
            SortField::Id => a.id.cmp(&b.id),
            SortField::ReleaseDate => a.release_date.cmp(&b.release_date),
            SortField::Genre => a.genre.cmp(&b.genre),
        };
        let primary = match self.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Row predicate for store queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Case-insensitive substring, matched against `title` or `genre`.
    pub search: Option<String>,
    /// Exact genre, compared case-insensitively.
    pub genre: Option<String>,
    /// Exact platform, compared case-insensitively.
    pub platform: Option<String>,
}

impl ItemFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().is_none_or(str::is_empty)
            && self.genre.is_none()
            && self.platform.is_none()
    }

    fn compile(&self) -> CompiledFilter {
        CompiledFilter {
            search: self.search.as_deref().map(str::to_lowercase).unwrap_or_default(),
            genre: self.genre.as_deref().map(str::to_lowercase),
            platform: self.platform.as_deref().map(str::to_lowercase),
        }
    }
}

struct CompiledFilter {
    search: String,
    genre: Option<String>,
    platform: Option<String>,
}

impl CompiledFilter {
    fn matches(&self, item: &CatalogItem) -> bool {
        if !item.matches_search(&self.search) {
            return false;
        }
        if let Some(genre) = &self.genre {
            if &item.genre.to_lowercase() != genre {
                return false;
            }
        }
        if let Some(platform) = &self.platform {
            if &item.platform.to_lowercase() != platform {
                return false;
            }
        }
        true
    }
}

/// A filtered, sorted read against a catalog store.
///
/// ```
/// use game_catalog::storage::{ItemQuery, SortDirection, SortField};
///
/// let query = ItemQuery::new()
///     .search("shoot")
///     .platform("PC (Windows)")
///     .sort_by(SortField::ReleaseDate, SortDirection::Descending)
///     .limit(20);
/// assert_eq!(query.limit, Some(20));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub filter: ItemFilter,
    pub sort: SortOrder,
    pub limit: Option<usize>,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.filter.search = Some(text.into());
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.filter.genre = Some(genre.into());
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.filter.platform = Some(platform.into());
        self
    }

    pub fn sort_by(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort = SortOrder::new(field, direction);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluate this query over a set of rows.
    pub fn execute<'a, I>(&self, rows: I) -> Vec<CatalogItem>
    where
        I: IntoIterator<Item = &'a CatalogItem>,
    {
        let filter = self.filter.compile();
        let mut matched: Vec<CatalogItem> = rows
            .into_iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();

        matched.sort_by(|a, b| self.sort.compare(a, b));

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}
