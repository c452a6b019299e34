//! `kiln plan`: one-shot generation from the command line.
//!
//! Uses the same goal validation and generator as `POST /generate-plan`.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::ValueEnum;

use kiln_core::plan::{ExecutionPlan, GoalRequest, PlanGenerator};

/// How `kiln plan` prints the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Readable summary, first action, then steps.
    #[default]
    Text,
    /// The plan JSON exactly as the HTTP endpoint returns it.
    Json,
}

pub async fn run_plan(generator: &PlanGenerator, goal: &str, format: OutputFormat) -> Result<()> {
    let goal = GoalRequest::new(goal).validate().context("invalid goal")?;
    let plan = generator
        .generate(&goal)
        .await
        .context("failed to generate plan")?;

    let output = match format {
        OutputFormat::Text => render_text(&plan).context("failed to render plan")?,
        OutputFormat::Json => {
            serde_json::to_string_pretty(&plan).context("failed to serialize plan")?
        }
    };
    println!("{output}");
    Ok(())
}

/// Render a plan for the terminal.
pub fn render_text(plan: &ExecutionPlan) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    writeln!(out, "Goal: {}", plan.goal_summary)?;
    writeln!(
        out,
        "Priority: {}    Estimated time: {}",
        plan.priority_level, plan.estimated_total_time
    )?;
    out.push('\n');

    writeln!(out, "First action to take now:")?;
    writeln!(out, "  {}", plan.first_action_to_take_now)?;
    out.push('\n');

    writeln!(out, "Execution plan:")?;
    for step in &plan.execution_plan {
        writeln!(
            out,
            "  {}. {} [{}, {}]",
            step.step_number, step.title, step.priority, step.estimated_time
        )?;
        writeln!(out, "     {}", step.description)?;
    }

    Ok(out.trim_end().to_string())
}
