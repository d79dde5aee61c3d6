//! Lookup contract for the three directory sources.
//!
//! The search widget only depends on the [`Lookup`] trait. [`DirectoryClient`]
//! implements it over the directory REST API; [`StubLookup`] answers every
//! lookup with an empty list so the widget can be wired without a backend.

use async_trait::async_trait;
use core_types::EntityKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub mod client;

pub use client::DirectoryClient;

/// One per-source lookup issued as part of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    pub id: Uuid,
    pub kind: EntityKind,
    pub query: String,
    pub limit: u32,
}

impl LookupRequest {
    pub fn new(kind: EntityKind, query: impl Into<String>, limit: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            query: query.into(),
            limit,
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("lookup timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("invalid json payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl LookupError {
    /// Client errors and undecodable bodies will not improve on retry.
    pub const fn is_retryable(&self) -> bool {
        match self {
            LookupError::Transport(_) | LookupError::Timeout { .. } => true,
            LookupError::Status(code) => *code >= 500,
            LookupError::Decode(_) => false,
        }
    }
}

/// Source lookup used by the fetch orchestrator.
///
/// Implementations return the raw JSON payload; shaping it into display
/// rows (and tolerating malformed payloads) is the caller's job.
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, req: &LookupRequest) -> Result<Value, LookupError>;
}

/// Lookup that always returns an empty list.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubLookup;

#[async_trait]
impl Lookup for StubLookup {
    async fn lookup(&self, _req: &LookupRequest) -> Result<Value, LookupError> {
        Ok(Value::Array(Vec::new()))
    }
}
