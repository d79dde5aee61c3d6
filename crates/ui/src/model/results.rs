//! Aggregation of the three raw source payloads into one display model.

use core_types::{DisplayHit, EntityKind, SourceRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entries kept per source.
pub const PAGE_SIZE: usize = 3;

/// Raw per-source payloads exactly as the lookups returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPayloads {
    pub organizations: Value,
    pub investors: Value,
    pub people: Value,
}

impl RawPayloads {
    pub fn get(&self, kind: EntityKind) -> &Value {
        match kind {
            EntityKind::Organization => &self.organizations,
            EntityKind::Investor => &self.investors,
            EntityKind::Person => &self.people,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedResultSet {
    pub organizations: Vec<DisplayHit>,
    pub investors: Vec<DisplayHit>,
    pub people: Vec<DisplayHit>,
}

impl AggregatedResultSet {
    pub fn total(&self) -> usize {
        self.organizations.len() + self.investors.len() + self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn section(&self, kind: EntityKind) -> &[DisplayHit] {
        match kind {
            EntityKind::Organization => &self.organizations,
            EntityKind::Investor => &self.investors,
            EntityKind::Person => &self.people,
        }
    }

    /// Non-empty sections in render order.
    pub fn sections(&self) -> impl Iterator<Item = (EntityKind, &[DisplayHit])> + '_ {
        EntityKind::ALL
            .into_iter()
            .map(|kind| (kind, self.section(kind)))
            .filter(|(_, hits)| !hits.is_empty())
    }
}

/// Normalize with the default page size.
pub fn normalize(raw: &RawPayloads) -> AggregatedResultSet {
    normalize_capped(raw, PAGE_SIZE)
}

/// Pure: the same payloads always produce the same result set.
pub fn normalize_capped(raw: &RawPayloads, cap: usize) -> AggregatedResultSet {
    let project = |kind: EntityKind| -> Vec<DisplayHit> {
        entries(raw.get(kind))
            .iter()
            .take(cap)
            .enumerate()
            .map(|(pos, entry)| SourceRecord::from_value(kind, entry).project(pos))
            .collect()
    };

    AggregatedResultSet {
        organizations: project(EntityKind::Organization),
        investors: project(EntityKind::Investor),
        people: project(EntityKind::Person),
    }
}

/// A bare list, or the list inside a paginated `{"results": [...]}` envelope.
/// Anything else has no entries.
fn entries(payload: &Value) -> &[Value] {
    match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("results") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    }
}
