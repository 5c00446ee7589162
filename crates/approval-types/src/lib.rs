//! Shared value types for the approval workflow engine
//!
//! Identifiers, roles, statuses and decisions are all strongly typed here so
//! that no part of the engine ever has to reason about raw status strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error raised when a textual token does not name a known value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTokenError {
    #[error("unrecognised {kind} '{value}'")]
    Unrecognised { kind: &'static str, value: String },
}

impl ParseTokenError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self::Unrecognised { kind, value: value.to_string() }
    }
}

/// The two document types routed through the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    Training,
    Gcr,
}

impl ApplicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Gcr => "gcr",
        }
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationType {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "training" => Ok(Self::Training),
            "gcr" => Ok(Self::Gcr),
            other => Err(ParseTokenError::new("application type", other)),
        }
    }
}

/// Strongly typed ApplicationId. Always a UUID, including when deserialized,
/// since the id ends up in file names under the data root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ApplicationId(String);

impl ApplicationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|_| Self(s.to_string()))
            .map_err(|e| format!("Invalid ApplicationId format: {}", e))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ApplicationId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_string(&s)
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed UserId
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Roles that take part in the approval chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    Hod,
    Hr,
    Gm,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Hod => "hod",
            Self::Hr => "hr",
            Self::Gm => "gm",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staff" => Ok(Self::Staff),
            "hod" => Ok(Self::Hod),
            "hr" => Ok(Self::Hr),
            "gm" => Ok(Self::Gm),
            other => Err(ParseTokenError::new("role", other)),
        }
    }
}

/// Who is performing the current action. Passed explicitly into every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: UserId,
    pub role: Role,
}

impl ActorContext {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Training application status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    PendingHod,
    PendingHr,
    PendingGm,
    Approved,
    Rejected,
}

impl TrainingStatus {
    pub const ALL: [TrainingStatus; 5] = [
        Self::PendingHod,
        Self::PendingHr,
        Self::PendingGm,
        Self::Approved,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingHod => "pending_hod",
            Self::PendingHr => "pending_hr",
            Self::PendingGm => "pending_gm",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Whether the step bound to this status branches on a decision
    pub fn requires_decision(&self) -> bool {
        matches!(self, Self::PendingHod | Self::PendingGm)
    }

    /// The only role allowed to act while the application sits in this status
    pub fn acting_role(&self) -> Option<Role> {
        match self {
            Self::PendingHod => Some(Role::Hod),
            Self::PendingHr => Some(Role::Hr),
            Self::PendingGm => Some(Role::Gm),
            Self::Approved | Self::Rejected => None,
        }
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingStatus {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ParseTokenError::new("training status", s))
    }
}

/// GCR (Gantian Cuti Rehat) application status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GcrStatus {
    PendingHr1,
    PendingGm,
    PendingHr2,
    PendingHr3,
    PendingGmFinal,
    Approved,
    Rejected,
}

impl GcrStatus {
    pub const ALL: [GcrStatus; 7] = [
        Self::PendingHr1,
        Self::PendingGm,
        Self::PendingHr2,
        Self::PendingHr3,
        Self::PendingGmFinal,
        Self::Approved,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingHr1 => "pending_hr1",
            Self::PendingGm => "pending_gm",
            Self::PendingHr2 => "pending_hr2",
            Self::PendingHr3 => "pending_hr3",
            Self::PendingGmFinal => "pending_gm_final",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Only the first GM decision branches; every other step just advances
    pub fn requires_decision(&self) -> bool {
        matches!(self, Self::PendingGm)
    }

    pub fn acting_role(&self) -> Option<Role> {
        match self {
            Self::PendingHr1 | Self::PendingHr2 | Self::PendingHr3 => Some(Role::Hr),
            Self::PendingGm | Self::PendingGmFinal => Some(Role::Gm),
            Self::Approved | Self::Rejected => None,
        }
    }
}

impl fmt::Display for GcrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GcrStatus {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ParseTokenError::new("gcr status", s))
    }
}

/// Decisions accepted by the branching steps of the training chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingDecision {
    Recommended,
    NotRecommended,
    Approved,
    Rejected,
}

impl TrainingDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::NotRecommended => "not_recommended",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TrainingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingDecision {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recommended" => Ok(Self::Recommended),
            "not_recommended" => Ok(Self::NotRecommended),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseTokenError::new("training decision", other)),
        }
    }
}

/// Decisions accepted by the GM step of the GCR chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GcrDecision {
    Approved,
    Rejected,
}

impl GcrDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for GcrDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GcrDecision {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseTokenError::new("gcr decision", other)),
        }
    }
}
