use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_NAME_LEN: usize = 200;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    #[error("Invalid date for {field}: {value} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("Field {field} is out of range (max {max})")]
    OutOfRange { field: &'static str, max: u64 },
}

// ---------------------------------------------------------------------------
// Artists
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Platform name → profile URL.
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Body of artist create / update requests.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArtistInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

impl ArtistInput {
    /// Trim fields, derive the slug when absent and check limits.
    pub fn normalize(mut self) -> Result<Self, ValidationError> {
        self.name = required_text("name", &self.name)?;
        let slug = match self.slug.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => slugify(&self.name),
        };
        if !is_valid_slug(&slug) {
            return Err(ValidationError::InvalidSlug(slug));
        }
        self.slug = Some(slug);
        self.bio = optional_text(self.bio);
        self.image_url = optional_text(self.image_url);
        self.genres = self
            .genres
            .into_iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Releases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    #[default]
    Single,
    Ep,
    Album,
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseType::Single => write!(f, "single"),
            ReleaseType::Ep => write!(f, "ep"),
            ReleaseType::Album => write!(f, "album"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: String,
    pub artist_id: String,
    pub title: String,
    pub release_type: ReleaseType,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub tracks: Vec<String>,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReleaseInput {
    #[serde(default)]
    pub artist_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_type: ReleaseType,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub tracks: Vec<String>,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

/// A [`ReleaseInput`] that passed validation.
#[derive(Debug, Clone)]
pub struct ValidRelease {
    pub artist_id: String,
    pub title: String,
    pub release_type: ReleaseType,
    pub release_date: NaiveDate,
    pub cover_url: Option<String>,
    pub tracks: Vec<String>,
    pub links: BTreeMap<String, String>,
}

impl ReleaseInput {
    pub fn validate(self) -> Result<ValidRelease, ValidationError> {
        let artist_id = self.artist_id.trim().to_string();
        if artist_id.is_empty() {
            return Err(ValidationError::MissingField("artist_id"));
        }
        let title = required_text("title", &self.title)?;
        let release_date = parse_day("release_date", &self.release_date)?;
        Ok(ValidRelease {
            artist_id,
            title,
            release_type: self.release_type,
            release_date,
            cover_url: optional_text(self.cover_url),
            tracks: self
                .tracks
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            links: self.links,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lowercase ASCII alphanumerics, everything else collapsed to single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            dash = false;
        } else if !dash && !slug.is_empty() {
            slug.push('-');
            dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_NAME_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Parse a `YYYY-MM-DD` day.
pub fn parse_day(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NAME_LEN,
        });
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("  The Weeknd & Friends!! "), "the-weeknd-friends");
        assert_eq!(slugify("A$AP"), "a-ap");
    }

    #[test]
    fn artist_without_slug_gets_one() {
        let input = ArtistInput {
            name: " Arijit Singh ".into(),
            ..Default::default()
        };
        let n = input.normalize().unwrap();
        assert_eq!(n.name, "Arijit Singh");
        assert_eq!(n.slug.as_deref(), Some("arijit-singh"));
    }

    #[test]
    fn artist_with_symbol_only_name_has_no_slug() {
        let input = ArtistInput {
            name: "???".into(),
            ..Default::default()
        };
        assert!(matches!(
            input.normalize(),
            Err(ValidationError::InvalidSlug(_))
        ));
    }

    #[test]
    fn explicit_slug_must_be_lowercase() {
        let input = ArtistInput {
            name: "X".into(),
            slug: Some("Bad Slug".into()),
            ..Default::default()
        };
        assert!(input.normalize().is_err());
    }

    #[test]
    fn release_requires_parseable_date() {
        let input = ReleaseInput {
            artist_id: "a1".into(),
            title: "Debut".into(),
            release_date: "2024-13-01".into(),
            ..Default::default()
        };
        assert!(matches!(
            input.validate(),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn release_type_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ReleaseType::Ep).unwrap(), "ep");
    }

    #[test]
    fn overlong_title_is_rejected() {
        let input = ReleaseInput {
            artist_id: "a1".into(),
            title: "x".repeat(201),
            release_date: "2024-01-01".into(),
            ..Default::default()
        };
        assert!(matches!(
            input.validate(),
            Err(ValidationError::TooLong { field: "title", .. })
        ));
    }
}
