// ============================================================================
// Catalog Record Model
// ============================================================================
//
// Two shapes of the same record:
// - RemoteCatalogItem: the wire DTO in the remote API's snake_case naming
// - CatalogItem: the canonical in-process / stored record
//
// All defaulting and normalization happens when converting between them, so
// nothing downstream ever has to guess what an absent field means.
//
// ============================================================================

use super::error::{NetworkError, NetworkResult};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Identifier assigned by the remote source. Immutable once stored.
pub type ItemId = i64;

/// A single catalog entry as stored locally.
///
/// Every string field may be empty after a local round-trip; an empty string
/// is the one and only representation of "unset".
///
/// Identity is the `id` alone: two items with the same `id` compare equal
/// and hash identically regardless of their other fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub detail_url: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub profile_url: String,
}

macro_rules! with_field {
    ($($method:ident => $field:ident),* $(,)?) => {
        $(
            pub fn $method(mut self, value: impl Into<String>) -> Self {
                self.$field = value.into();
                self
            }
        )*
    };
}

impl CatalogItem {
    /// Create an item with only an id and title; every other field is unset.
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            thumbnail_url: String::new(),
            short_description: String::new(),
            detail_url: String::new(),
            genre: String::new(),
            platform: String::new(),
            publisher: String::new(),
            developer: String::new(),
            release_date: String::new(),
            profile_url: String::new(),
        }
    }

    with_field! {
        with_title => title,
        with_thumbnail_url => thumbnail_url,
        with_short_description => short_description,
        with_detail_url => detail_url,
        with_genre => genre,
        with_platform => platform,
        with_publisher => publisher,
        with_developer => developer,
        with_release_date => release_date,
        with_profile_url => profile_url,
    }

    /// Deterministic fixture used to seed preview and demo stores.
    pub fn preview_set(count: usize) -> Vec<CatalogItem> {
        (0..count)
            .map(|i| {
                CatalogItem::new(i as ItemId, format!("Game {i}"))
                    .with_genre(format!("Genre {i}"))
                    .with_thumbnail_url("https://via.placeholder.com/150")
                    .with_short_description(format!("Description for game {i}"))
                    .with_detail_url(format!("https://example.com/game{i}"))
            })
            .collect()
    }

    /// Case-insensitive substring match against `title` or `genre`.
    ///
    /// `needle_lower` must already be lowercased; an empty needle matches
    /// every item.
    pub fn matches_search(&self, needle_lower: &str) -> bool {
        if needle_lower.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(needle_lower)
            || self.genre.to_lowercase().contains(needle_lower)
    }

    /// Compare every field. `==` only looks at `id`.
    pub fn same_record(&self, other: &CatalogItem) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.thumbnail_url == other.thumbnail_url
            && self.short_description == other.short_description
            && self.detail_url == other.detail_url
            && self.genre == other.genre
            && self.platform == other.platform
            && self.publisher == other.publisher
            && self.developer == other.developer
            && self.release_date == other.release_date
            && self.profile_url == other.profile_url
    }
}

/// Field-wise equality of two item lists, order included.
pub fn same_records(a: &[CatalogItem], b: &[CatalogItem]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_record(y))
}

impl PartialEq for CatalogItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CatalogItem {}

impl Hash for CatalogItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Wire representation of one entry in the remote catalog feed.
///
/// Every key is required; a payload missing any of them is a schema
/// mismatch and fails to decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCatalogItem {
    pub id: ItemId,
    pub title: String,
    pub thumbnail: String,
    pub short_description: String,
    pub game_url: String,
    pub genre: String,
    pub platform: String,
    pub publisher: String,
    pub developer: String,
    pub release_date: String,
    pub freetogame_profile_url: String,
}

impl RemoteCatalogItem {
    /// Convert into the canonical record.
    ///
    /// Surrounding whitespace is trimmed from every field. Every text field
    /// must still be non-empty afterwards: the feed promises a value for each
    /// of them, so a blank one is a schema mismatch.
    pub fn normalize(self) -> NetworkResult<CatalogItem> {
        let id = self.id;
        let field = |name: &str, value: String| -> NetworkResult<String> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(NetworkError::Decode(format!(
                    "catalog item {} has an empty {}",
                    id, name
                )));
            }
            Ok(trimmed.to_string())
        };

        Ok(CatalogItem {
            id,
            title: field("title", self.title)?,
            thumbnail_url: field("thumbnail", self.thumbnail)?,
            short_description: field("short_description", self.short_description)?,
            detail_url: field("game_url", self.game_url)?,
            genre: field("genre", self.genre)?,
            platform: field("platform", self.platform)?,
            publisher: field("publisher", self.publisher)?,
            developer: field("developer", self.developer)?,
            release_date: field("release_date", self.release_date)?,
            profile_url: field("freetogame_profile_url", self.freetogame_profile_url)?,
        })
    }
}

impl From<&CatalogItem> for RemoteCatalogItem {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            thumbnail: item.thumbnail_url.clone(),
            short_description: item.short_description.clone(),
            game_url: item.detail_url.clone(),
            genre: item.genre.clone(),
            platform: item.platform.clone(),
            publisher: item.publisher.clone(),
            developer: item.developer.clone(),
            release_date: item.release_date.clone(),
            freetogame_profile_url: item.profile_url.clone(),
        }
    }
}
