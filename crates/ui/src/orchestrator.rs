//! Parallel fetch across the three sources, tagged with sequence tokens.
//!
//! Every dispatch takes a token strictly greater than all earlier ones. The
//! orchestrator remembers only the latest token; an outcome is applied when
//! its token is still the latest and dropped otherwise, whatever order the
//! network completed in.

use crate::model::results::{AggregatedResultSet, RawPayloads, normalize_capped};
use core_types::EntityKind;
use directory_client::{Lookup, LookupRequest};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceToken(u64);

impl SequenceToken {
    pub const fn value(self) -> u64 {
        self.0
    }

    const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// What a settled dispatch hands back to the widget.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub token: SequenceToken,
    pub query: String,
    pub raw: RawPayloads,
}

pub struct FetchOrchestrator {
    lookup: Arc<dyn Lookup>,
    page_size: u32,
    latest: SequenceToken,
}

impl FetchOrchestrator {
    pub fn new(lookup: Arc<dyn Lookup>, page_size: u32) -> Self {
        Self {
            lookup,
            page_size,
            latest: SequenceToken::default(),
        }
    }

    /// The freshness guard: only the latest issued token may be applied.
    pub fn is_current(&self, token: SequenceToken) -> bool {
        token == self.latest
    }

    /// Make every in-flight dispatch stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest = self.latest.next();
    }

    fn issue(&mut self) -> SequenceToken {
        self.latest = self.latest.next();
        self.latest
    }

    /// Spawn the three lookups for `query`; `deliver` receives the outcome
    /// once all of them have settled. Must be called within a tokio runtime.
    pub fn dispatch<F>(&mut self, query: impl Into<String>, deliver: F) -> SequenceToken
    where
        F: FnOnce(DispatchOutcome) + Send + 'static,
    {
        let token = self.issue();
        let query = query.into();
        let lookup = self.lookup.clone();
        let limit = self.page_size;
        debug!(token = token.value(), %query, "dispatching search");

        tokio::spawn(async move {
            let raw = fetch_all(lookup.as_ref(), &query, limit).await;
            deliver(DispatchOutcome { token, query, raw });
        });
        token
    }

    /// Dispatch and await in place, returning the normalized result set.
    pub async fn search_once(&mut self, query: &str) -> AggregatedResultSet {
        let token = self.issue();
        debug!(token = token.value(), %query, "dispatching one-shot search");
        let raw = fetch_all(self.lookup.as_ref(), query, self.page_size).await;
        normalize_capped(&raw, self.page_size as usize)
    }
}

/// Run the three lookups concurrently. A failing source contributes an
/// empty list and never affects the other two.
pub async fn fetch_all(lookup: &dyn Lookup, query: &str, limit: u32) -> RawPayloads {
    let (organizations, investors, people) = tokio::join!(
        fetch_source(lookup, EntityKind::Organization, query, limit),
        fetch_source(lookup, EntityKind::Investor, query, limit),
        fetch_source(lookup, EntityKind::Person, query, limit),
    );
    RawPayloads {
        organizations,
        investors,
        people,
    }
}

async fn fetch_source(lookup: &dyn Lookup, kind: EntityKind, query: &str, limit: u32) -> Value {
    let req = LookupRequest::new(kind, query, limit);
    match lookup.lookup(&req).await {
        Ok(payload) => payload,
        Err(err) => {
            warn!(request_id = %req.id, source = %kind, error = %err, "source lookup failed; treating as empty");
            Value::Array(Vec::new())
        }
    }
}
