//! Execution plans: data model, prompts, output parsing, and generation.

pub mod generator;
pub mod parser;
pub mod prompt;
pub mod types;

pub use generator::{DEFAULT_MAX_ATTEMPTS, GenerateError, GeneratorSettings, PlanGenerator};
pub use parser::{PlanParseError, normalize_priority, parse_plan, strip_code_fences};
pub use types::{ExecutionPlan, ExecutionStep, GoalError, GoalRequest, MAX_GOAL_CHARS, Priority};
