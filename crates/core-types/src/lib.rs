//! Core entity records and display types for the directory search.
//!
//! The three sources (organizations, investors, people) return loosely
//! shaped JSON. Records here deserialize leniently: a field with the wrong
//! type, or an empty string, is treated as absent so that the display
//! projection can substitute a fallback instead of failing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

pub mod config;
pub mod routes;

/// One of the three independent lookup sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Organization,
    Investor,
    Person,
}

impl EntityKind {
    /// Render order of the dropdown sections.
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Organization,
        EntityKind::Investor,
        EntityKind::Person,
    ];

    /// Collection segment used by both the REST API and the client routes.
    pub const fn path_segment(self) -> &'static str {
        match self {
            EntityKind::Organization => "companies",
            EntityKind::Investor => "investors",
            EntityKind::Person => "people",
        }
    }

    pub const fn section_title(self) -> &'static str {
        match self {
            EntityKind::Organization => "Companies",
            EntityKind::Investor => "Investors",
            EntityKind::Person => "People",
        }
    }

    pub const fn fallback_name(self) -> &'static str {
        match self {
            EntityKind::Organization => "Unnamed Company",
            EntityKind::Investor => "Unnamed Investor",
            EntityKind::Person => "Unnamed Person",
        }
    }

    pub const fn placeholder(self) -> PlaceholderIcon {
        match self {
            EntityKind::Organization => PlaceholderIcon::Building,
            EntityKind::Investor => PlaceholderIcon::TrendingUp,
            EntityKind::Person => PlaceholderIcon::Users,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Organization => "organization",
            EntityKind::Investor => "investor",
            EntityKind::Person => "person",
        };
        f.write_str(label)
    }
}

/// Generic icon drawn when a hit has no image of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceholderIcon {
    Building,
    TrendingUp,
    Users,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitImage {
    Url(String),
    Placeholder(PlaceholderIcon),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub short_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub investor_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub profile_picture: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub slug: Option<String>,
}

/// A single source entry, tagged by the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRecord {
    Organization(OrganizationRecord),
    Investor(InvestorRecord),
    Person(PersonRecord),
}

impl SourceRecord {
    /// Parse one raw entry. Entries that are not objects become an
    /// all-absent record of the requested kind.
    pub fn from_value(kind: EntityKind, value: &Value) -> Self {
        match kind {
            EntityKind::Organization => {
                SourceRecord::Organization(parse_or_default(value))
            }
            EntityKind::Investor => SourceRecord::Investor(parse_or_default(value)),
            EntityKind::Person => SourceRecord::Person(parse_or_default(value)),
        }
    }

    pub const fn kind(&self) -> EntityKind {
        match self {
            SourceRecord::Organization(_) => EntityKind::Organization,
            SourceRecord::Investor(_) => EntityKind::Investor,
            SourceRecord::Person(_) => EntityKind::Person,
        }
    }

    /// Project into the uniform display model. `position` is the entry's
    /// index within its source and only feeds the fallback id.
    pub fn project(&self, position: usize) -> DisplayHit {
        let kind = self.kind();
        let (id, name, image, subtitle, slug) = match self {
            SourceRecord::Organization(r) => (
                &r.id,
                &r.name,
                &r.logo,
                r.short_description.clone(),
                &r.slug,
            ),
            SourceRecord::Investor(r) => (
                &r.id,
                &r.name,
                &r.logo,
                Some(investor_type_label(r.investor_type.as_deref())),
                &r.slug,
            ),
            SourceRecord::Person(r) => (
                &r.id,
                &r.full_name,
                &r.profile_picture,
                r.bio.clone(),
                &r.slug,
            ),
        };

        DisplayHit {
            kind,
            id: id.clone().unwrap_or_else(|| format!("{kind}-{position}")),
            title: name
                .clone()
                .unwrap_or_else(|| kind.fallback_name().to_string()),
            subtitle,
            image: image
                .clone()
                .map_or(HitImage::Placeholder(kind.placeholder()), HitImage::Url),
            slug: slug.clone(),
        }
    }
}

/// Uniform row shown in the search dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayHit {
    pub kind: EntityKind,
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub image: HitImage,
    pub slug: Option<String>,
}

impl DisplayHit {
    /// Detail route for this hit; a missing slug yields an empty segment.
    pub fn route(&self) -> String {
        routes::detail_route(self.kind, self.slug.as_deref())
    }
}

fn investor_type_label(investor_type: Option<&str>) -> String {
    match investor_type {
        Some("VC") => "Venture Capital".to_string(),
        Some(other) => other.to_string(),
        None => "Investor".to_string(),
    }
}

fn parse_or_default<T>(value: &Value) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    if !value.is_object() {
        return T::default();
    }
    T::deserialize(value).unwrap_or_default()
}

/// Accept strings and numbers, treat everything else (and `""`) as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
