//! Shared test utilities for kiln tests.
//!
//! Provides [`ScriptedProvider`], a [`ChatProvider`] that replays canned
//! responses and counts how often it was called, plus fixture plan
//! payloads. Nothing here touches the network.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use kiln_core::provider::{ChatProvider, ChatRequest, ProviderError};

/// One scripted provider reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Return this text as the completion.
    Text(String),
    /// Fail the call as an upstream API error with this status.
    ApiError(u16),
}

/// A provider double that answers from a script.
///
/// Replies are consumed in order. Once the script runs out, the last reply
/// repeats. An empty script answers every call with an empty string.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
    calls: AtomicUsize,
    has_credentials: bool,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            has_credentials: true,
        }
    }

    /// Reply with each text in turn.
    pub fn with_texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        Self::new(texts.into_iter().map(|t| Reply::Text(t.into())))
    }

    /// Always reply with the same text.
    pub fn always(text: impl Into<String>) -> Self {
        Self::new([Reply::Text(text.into())])
    }

    /// Report no credentials, as when no API key is configured.
    pub fn without_credentials(mut self) -> Self {
        self.has_credentials = false;
        self
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }

    fn next_reply(&self) -> Option<Reply> {
        let mut last = self.last.lock().expect("last lock poisoned");
        if let Some(reply) = self.replies.lock().expect("replies lock poisoned").pop_front() {
            *last = Some(reply);
        }
        last.clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn has_credentials(&self) -> bool {
        self.has_credentials
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(request);

        match self.next_reply() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::ApiError(status)) => Err(ProviderError::Api {
                status,
                message: format!("scripted failure ({status})"),
            }),
            None => Ok(String::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A schema-valid plan for "Learn to play chess", with loose priority
/// spellings that normalize to Medium / High / High / Medium / Low.
pub fn chess_plan_value() -> serde_json::Value {
    serde_json::json!({
        "goal_summary": "Learn the rules and fundamentals of chess well enough to play full games.",
        "priority_level": "medium",
        "estimated_total_time": "4 weeks",
        "execution_plan": [
            {
                "step_number": 1,
                "title": "Learn piece movement",
                "description": "Study how each piece moves, including castling and en passant.",
                "estimated_time": "2 hours",
                "priority": "High"
            },
            {
                "step_number": 2,
                "title": "Learn basic checkmates",
                "description": "Practice king-and-queen and king-and-rook mates against a computer.",
                "estimated_time": "3 hours",
                "priority": "high priority"
            },
            {
                "step_number": 3,
                "title": "Study opening principles",
                "description": "Control the center, develop pieces, and castle early.",
                "estimated_time": "1 week",
                "priority": "MEDIUM"
            },
            {
                "step_number": 4,
                "title": "Play and review games",
                "description": "Play three rapid games a week and review each mistake.",
                "estimated_time": "3 weeks",
                "priority": "low"
            }
        ],
        "first_action_to_take_now": "Create a free account on lichess.org and finish the first rules lesson.",
        "notes": "extra field the schema does not know about"
    })
}

/// [`chess_plan_value`] serialized as the model would send it.
pub fn chess_plan_json() -> String {
    chess_plan_value().to_string()
}

/// The normalized plan body a caller should receive for [`chess_plan_json`].
pub fn chess_plan_normalized() -> serde_json::Value {
    let mut value = chess_plan_value();
    let obj = value.as_object_mut().expect("fixture is an object");
    obj.remove("notes");
    obj.insert("priority_level".to_string(), "Medium".into());
    let priorities = ["High", "High", "Medium", "Low"];
    if let Some(serde_json::Value::Array(steps)) = obj.get_mut("execution_plan") {
        for (step, priority) in steps.iter_mut().zip(priorities) {
            step["priority"] = priority.into();
        }
    }
    value
}
