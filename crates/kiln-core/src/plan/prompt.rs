//! Prompt construction for plan generation.
//!
//! Pure string assembly, no I/O. The system prompt carries the full output
//! contract; the user prompt only embeds the goal.

use crate::provider::ChatMessage;

/// Output contract sent as the system message on every attempt.
pub const SYSTEM_PROMPT: &str = r#"You are a structured planning assistant. Output ONLY valid JSON. No markdown, no code fences, no explanation, no motivational text.

Rules:
- No fluff or motivational speech.
- Clear, actionable steps only.
- Practical advice only.
- Your entire response must be a single valid JSON object matching the exact schema below.

Schema (use these exact keys):
{
  "goal_summary": "Short clarified version of the user's goal (one sentence)",
  "priority_level": "High" or "Medium" or "Low",
  "estimated_total_time": "X days or X weeks (e.g. \"2 weeks\")",
  "execution_plan": [
    {
      "step_number": 1,
      "title": "Step title",
      "description": "Clear actionable explanation",
      "estimated_time": "X hours or X days",
      "priority": "High" or "Medium" or "Low"
    }
  ],
  "first_action_to_take_now": "One specific action the user can do in the next 30 minutes"
}

Return 4-8 steps. first_action_to_take_now must be concrete and doable immediately."#;

/// Build the user message for a goal. The goal is embedded verbatim.
pub fn build_user_prompt(goal: &str) -> String {
    format!(
        "Convert this goal into a structured execution plan. \
         Output only the JSON object, nothing else.\n\nGoal: {goal}"
    )
}

/// The full message list for one generation attempt: system, then user.
pub fn build_messages(goal: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_user_prompt(goal)),
    ]
}
