//! Request payloads accepted at the edge of the engine
//!
//! `StepData` is the loosely-shaped bag callers hand to the process entry
//! points. Only the keys listed here are recognised; anything else in the
//! incoming JSON is ignored. Each step turns the bag into its own typed input
//! (see `workflow::step_inputs`) before any business rule runs.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Accept integers given either as JSON numbers or as numeric strings,
/// the way HTML forms post them
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got '{}'", s))),
    }
}

/// Recognised keys of the per-step data bag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepData {
    pub comments: Option<String>,
    pub signature: Option<String>,

    #[serde(deserialize_with = "lenient_int")]
    pub days_approved: Option<i64>,

    // Training HR review
    pub budget_status: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub credit_hours: Option<i64>,
    pub budget_comments: Option<String>,
    pub reference_number: Option<String>,

    // GCR step-specific signatures
    pub hr1_signature: Option<String>,
    pub hr2_signature: Option<String>,
    pub hr3_signature: Option<String>,
    pub gm_final_signature: Option<String>,

    pub lampiran_a_details: Option<LampiranADetails>,
}

impl StepData {
    /// Parse the bag from arbitrary JSON; unknown keys are dropped
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

/// Leave-balance figures HR3 enters for Lampiran A
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LampiranADetails {
    pub employee_id: String,
    #[serde(deserialize_with = "lenient_int")]
    pub total_days_balance: Option<i64>,
    #[serde(deserialize_with = "lenient_int")]
    pub gc_days_approved: Option<i64>,
    #[serde(deserialize_with = "lenient_int")]
    pub remaining_days: Option<i64>,
    pub verified_date: Option<NaiveDate>,
}

/// Payload of a new training application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSubmission {
    pub programme_title: String,
    pub organiser: String,
    #[serde(default)]
    pub venue: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub objectives: Option<String>,
    pub applicant_signature: String,
}

/// Payload of a new GCR (leave collection) application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcrSubmission {
    pub days_requested: u32,
    pub leave_year: i32,
    #[serde(default)]
    pub reason: Option<String>,
    pub applicant_signature: String,
}
