//! Core data models for agents, contact records, and ingestion results.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// One contact extracted from an uploaded file.
///
/// Produced by the normalizer from a single spreadsheet/CSV row and
/// immutable afterwards. `name` and `phone` are non-empty by construction;
/// `notes` defaults to the empty string when the source row had none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub notes: String,
}

/// A sales agent eligible to receive distributed contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating an agent.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAgent {
    pub name: String,
    pub email: String,
    pub mobile: String,
}

/// Partial update for an agent; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub is_active: Option<bool>,
}

/// One agent's share of an ingested list.
///
/// `assigned_count` always equals `items.len()`; it is carried explicitly
/// so summaries can be rendered without loading items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub agent_id: String,
    pub items: Vec<ContactRecord>,
    pub assigned_count: usize,
}

/// The persisted outcome of one successful ingestion.
///
/// Invariant: the sum of `assigned_count` over `distributions` equals
/// `total_items`, and concatenating all items in distribution order
/// reconstructs the source rows in their original order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionResult {
    pub id: String,
    pub file_name: String,
    pub total_items: usize,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
    pub distributions: Vec<Distribution>,
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

// E.164: leading +, non-zero country code, at most 15 digits total.
static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{1,14}$").expect("valid mobile regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE_RE.is_match(mobile)
}

/// Validates agent fields shared by the HTTP and CLI create/update paths.
///
/// Checks only the fields that are present and returns the first violation
/// as a human-readable message.
pub fn validate_agent_fields(
    name: Option<&str>,
    email: Option<&str>,
    mobile: Option<&str>,
) -> Result<(), String> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err("name is required".to_string());
        }
    }
    if let Some(email) = email {
        if !is_valid_email(email) {
            return Err("please include a valid email".to_string());
        }
    }
    if let Some(mobile) = mobile {
        if !is_valid_mobile(mobile) {
            return Err(
                "please include a valid mobile number with country code (e.g. +1234567890)"
                    .to_string(),
            );
        }
    }
    Ok(())
}
