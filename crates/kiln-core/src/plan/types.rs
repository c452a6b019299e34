//! Request and plan types exchanged with callers.
//!
//! Field names double as the JSON wire names, so renaming a field is a
//! breaking change for clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum goal length, in characters, after trimming.
pub const MAX_GOAL_CHARS: usize = 2000;

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Priority tier for a plan or a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Accepts only the canonical spelling; loose model output goes through
    /// [`super::parser::normalize_priority`] first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Self::High),
            "Medium" => Ok(Self::Medium),
            "Low" => Ok(Self::Low),
            other => Err(format!("invalid priority: {other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Goal request
// ---------------------------------------------------------------------------

/// Body of `POST /generate-plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRequest {
    pub goal: String,
}

/// Reasons a goal is rejected before any provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoalError {
    #[error("goal must not be empty")]
    Empty,

    #[error("goal is {len} characters; at most {max} are allowed")]
    TooLong { len: usize, max: usize },
}

impl GoalRequest {
    pub fn new(goal: impl Into<String>) -> Self {
        Self { goal: goal.into() }
    }

    /// Trim the goal and check its length.
    ///
    /// Returns the trimmed goal text on success.
    pub fn validate(&self) -> Result<String, GoalError> {
        let trimmed = self.goal.trim();
        let len = trimmed.chars().count();
        if len == 0 {
            return Err(GoalError::Empty);
        }
        if len > MAX_GOAL_CHARS {
            return Err(GoalError::TooLong {
                len,
                max: MAX_GOAL_CHARS,
            });
        }
        Ok(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// Execution plan
// ---------------------------------------------------------------------------

/// One ordered step of an [`ExecutionPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// 1-based position in the plan.
    pub step_number: u32,
    pub title: String,
    pub description: String,
    /// Free text, e.g. "3 hours".
    pub estimated_time: String,
    pub priority: Priority,
}

/// A validated plan as returned to callers.
///
/// Unknown fields in model output are dropped on deserialization, so they
/// never reach a response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// One-sentence restatement of the goal.
    pub goal_summary: String,
    pub priority_level: Priority,
    pub estimated_total_time: String,
    /// Ordered steps; 4-8 by convention, not enforced.
    pub execution_plan: Vec<ExecutionStep>,
    /// Something concrete the user can finish within 30 minutes.
    pub first_action_to_take_now: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_roundtrips_through_str() {
        for p in [Priority::High, Priority::Medium, Priority::Low] {
            assert_eq!(p.as_str().parse::<Priority>().unwrap(), p);
        }
    }

    #[test]
    fn priority_rejects_non_canonical() {
        assert!("high".parse::<Priority>().is_err());
        assert!("Urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn priority_serializes_as_bare_string() {
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"Medium\"");
    }

    #[test]
    fn validate_trims_goal() {
        let req = GoalRequest::new("  Learn to play chess \n");
        assert_eq!(req.validate().unwrap(), "Learn to play chess");
    }

    #[test]
    fn validate_rejects_empty_and_whitespace() {
        assert_eq!(GoalRequest::new("").validate(), Err(GoalError::Empty));
        assert_eq!(GoalRequest::new(" \t\n ").validate(), Err(GoalError::Empty));
    }

    #[test]
    fn validate_length_bounds() {
        let exact = "a".repeat(MAX_GOAL_CHARS);
        assert!(GoalRequest::new(exact).validate().is_ok());

        let over = "a".repeat(MAX_GOAL_CHARS + 1);
        assert_eq!(
            GoalRequest::new(over).validate(),
            Err(GoalError::TooLong {
                len: MAX_GOAL_CHARS + 1,
                max: MAX_GOAL_CHARS
            })
        );
    }

    #[test]
    fn validate_counts_characters_not_bytes() {
        // 2000 two-byte characters is within bounds.
        let goal = "é".repeat(MAX_GOAL_CHARS);
        assert!(GoalRequest::new(goal).validate().is_ok());
    }

    #[test]
    fn plan_ignores_unknown_fields() {
        let json = serde_json::json!({
            "goal_summary": "Learn chess.",
            "priority_level": "High",
            "estimated_total_time": "2 weeks",
            "execution_plan": [],
            "first_action_to_take_now": "Install a chess app.",
            "motivation": "You can do it!"
        });
        let plan: ExecutionPlan = serde_json::from_value(json).unwrap();
        let out = serde_json::to_value(&plan).unwrap();
        assert!(out.get("motivation").is_none());
    }
}
