//! Typed per-step inputs
//!
//! Every step gets its own input struct, built from the caller's `StepData`
//! bag at the boundary. Shape problems (missing signature, malformed number,
//! comment too long) are collected field by field into one `Validation`
//! error; rules that need the stored application live in the processors.

use approval_types::{GcrDecision, TrainingDecision};
use base64::Engine;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{MAX_COMMENT_LENGTH, SIGNATURE_DATA_URL_PREFIX};
use crate::error::{FieldError, Result, WorkflowError};
use crate::types::StepData;

static REFERENCE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9/_-]{0,63}$").expect("valid reference pattern"));

/// A signature-pad image, validated as a base64 `data:image/...` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(String);

impl Signature {
    pub fn parse(field: &'static str, raw: Option<&str>) -> std::result::Result<Self, FieldError> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())
            .ok_or_else(|| FieldError::new(field, "signature is required"))?;

        let rest = raw.strip_prefix(SIGNATURE_DATA_URL_PREFIX)
            .ok_or_else(|| FieldError::new(field, "signature must be an image data URL"))?;

        let (_, payload) = rest.split_once(";base64,")
            .ok_or_else(|| FieldError::new(field, "signature must be base64 encoded"))?;

        match base64::engine::general_purpose::STANDARD.decode(payload) {
            Ok(bytes) if !bytes.is_empty() => Ok(Self(raw.to_string())),
            Ok(_) => Err(FieldError::new(field, "signature image is empty")),
            Err(e) => Err(FieldError::new(field, format!("signature is not valid base64: {}", e))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Collects field errors while an input is being assembled
#[derive(Default)]
struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    fn take<T>(&mut self, result: std::result::Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.0.push(e);
                None
            }
        }
    }

    /// `value` is `None` only when some field already failed
    fn finish<T>(self, value: Option<T>) -> Result<T> {
        match value {
            Some(value) if self.0.is_empty() => Ok(value),
            _ => Err(WorkflowError::Validation(self.0)),
        }
    }
}

fn optional_text(field: &'static str, raw: Option<&String>) -> std::result::Result<Option<String>, FieldError> {
    match raw.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(text) if text.chars().count() > MAX_COMMENT_LENGTH => Err(FieldError::new(
            field,
            format!("must be at most {} characters", MAX_COMMENT_LENGTH),
        )),
        Some(text) => Ok(Some(text.to_string())),
    }
}

fn non_negative(field: &'static str, raw: Option<i64>) -> std::result::Result<Option<u32>, FieldError> {
    match raw {
        None => Ok(None),
        Some(n) => u32::try_from(n)
            .map(Some)
            .map_err(|_| FieldError::new(field, "must be a non-negative whole number")),
    }
}

fn required_non_negative(field: &'static str, raw: Option<i64>) -> std::result::Result<u32, FieldError> {
    non_negative(field, raw)?.ok_or_else(|| FieldError::new(field, "is required"))
}

/// First non-empty signature among the step-specific key and the generic one
fn signature_from<'a>(specific: &'a Option<String>, generic: &'a Option<String>) -> Option<&'a str> {
    specific.as_deref()
        .filter(|s| !s.trim().is_empty())
        .or(generic.as_deref())
}

#[derive(Debug, Clone, PartialEq)]
pub struct HodReviewInput {
    pub decision: TrainingDecision,
    pub comments: Option<String>,
}

impl HodReviewInput {
    pub fn from_step_data(decision: TrainingDecision, data: &StepData) -> Result<Self> {
        let mut errors = FieldErrors::default();
        let comments = errors.take(optional_text("comments", data.comments.as_ref()));
        errors.finish(Some(Self { decision, comments: comments.flatten() }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HrReviewInput {
    pub comments: Option<String>,
    pub budget_status: Option<String>,
    pub credit_hours: Option<u32>,
    pub budget_comments: Option<String>,
    pub reference_number: Option<String>,
}

impl HrReviewInput {
    pub fn from_step_data(data: &StepData) -> Result<Self> {
        let mut errors = FieldErrors::default();
        let comments = errors.take(optional_text("comments", data.comments.as_ref()));
        let budget_status = errors.take(optional_text("budget_status", data.budget_status.as_ref()));
        let credit_hours = errors.take(non_negative("credit_hours", data.credit_hours));
        let budget_comments = errors.take(optional_text("budget_comments", data.budget_comments.as_ref()));

        let reference_number = match data.reference_number.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(reference) if REFERENCE_NUMBER.is_match(reference) => Some(reference.to_string()),
            Some(_) => {
                errors.push(FieldError::new(
                    "reference_number",
                    "may only contain letters, digits, '/', '_' and '-'",
                ));
                None
            }
        };

        errors.finish(Some(Self {
            comments: comments.flatten(),
            budget_status: budget_status.flatten(),
            credit_hours: credit_hours.flatten(),
            budget_comments: budget_comments.flatten(),
            reference_number,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingGmInput {
    pub decision: TrainingDecision,
    pub comments: Option<String>,
}

impl TrainingGmInput {
    pub fn from_step_data(decision: TrainingDecision, data: &StepData) -> Result<Self> {
        let mut errors = FieldErrors::default();
        let comments = errors.take(optional_text("comments", data.comments.as_ref()));
        errors.finish(Some(Self { decision, comments: comments.flatten() }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hr1VerificationInput {
    pub signature: Signature,
}

impl Hr1VerificationInput {
    pub fn from_step_data(data: &StepData) -> Result<Self> {
        let mut errors = FieldErrors::default();
        let signature = errors.take(Signature::parse(
            "signature",
            signature_from(&data.hr1_signature, &data.signature),
        ));
        errors.finish(signature.map(|signature| Self { signature }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GcrGmDecisionInput {
    pub decision: GcrDecision,
    /// 0 for a rejection regardless of what the caller sent
    pub days_approved: u32,
    pub comments: Option<String>,
}

impl GcrGmDecisionInput {
    pub fn from_step_data(decision: GcrDecision, data: &StepData) -> Result<Self> {
        let mut errors = FieldErrors::default();
        let comments = errors.take(optional_text("comments", data.comments.as_ref()));

        let days_approved = match decision {
            GcrDecision::Rejected => 0,
            GcrDecision::Approved => match data.days_approved {
                Some(days) if days > 0 => u32::try_from(days).unwrap_or(u32::MAX),
                Some(_) => {
                    errors.push(FieldError::new("days_approved", "must be a positive whole number"));
                    0
                }
                None => {
                    errors.push(FieldError::new("days_approved", "is required when approving"));
                    0
                }
            },
        };

        errors.finish(Some(Self { decision, days_approved, comments: comments.flatten() }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hr2RecordingInput {
    pub signature: Signature,
}

impl Hr2RecordingInput {
    pub fn from_step_data(data: &StepData) -> Result<Self> {
        let mut errors = FieldErrors::default();
        let signature = errors.take(Signature::parse(
            "hr2_signature",
            signature_from(&data.hr2_signature, &data.signature),
        ));
        errors.finish(signature.map(|signature| Self { signature }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LampiranAInput {
    pub employee_id: String,
    pub total_days_balance: u32,
    pub gc_days_approved: u32,
    pub remaining_days: u32,
    pub verified_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hr3LampiranInput {
    pub signature: Signature,
    pub lampiran: LampiranAInput,
}

impl Hr3LampiranInput {
    pub fn from_step_data(data: &StepData) -> Result<Self> {
        let mut errors = FieldErrors::default();
        let signature = errors.take(Signature::parse(
            "hr3_signature",
            signature_from(&data.hr3_signature, &data.signature),
        ));

        let lampiran = match data.lampiran_a_details.as_ref() {
            None => {
                errors.push(FieldError::new("lampiran_a_details", "is required"));
                None
            }
            Some(details) => {
                let employee_id = details.employee_id.trim().to_string();
                if employee_id.is_empty() {
                    errors.push(FieldError::new("employee_id", "is required"));
                }
                let total = errors.take(required_non_negative("total_days_balance", details.total_days_balance));
                let gc = errors.take(required_non_negative("gc_days_approved", details.gc_days_approved));
                let remaining = errors.take(required_non_negative("remaining_days", details.remaining_days));

                match (total, gc, remaining) {
                    (Some(total_days_balance), Some(gc_days_approved), Some(remaining_days)) => Some(LampiranAInput {
                        employee_id,
                        total_days_balance,
                        gc_days_approved,
                        remaining_days,
                        verified_date: details.verified_date,
                    }),
                    _ => None,
                }
            }
        };

        errors.finish(signature.zip(lampiran).map(|(signature, lampiran)| Self { signature, lampiran }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GmFinalInput {
    pub signature: Signature,
}

impl GmFinalInput {
    pub fn from_step_data(data: &StepData) -> Result<Self> {
        let mut errors = FieldErrors::default();
        let signature = errors.take(Signature::parse(
            "gm_final_signature",
            signature_from(&data.gm_final_signature, &data.signature),
        ));
        errors.finish(signature.map(|signature| Self { signature }))
    }
}
