//! Progress events (§4.2.6, §6). A finite, non-restartable stream of
//! immutable events followed by one terminal result — never a
//! partially-populated result object mutated in place (§9).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Discovery,
    Comparison,
    Analysis,
    Report,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub comparison_id: String,
    pub phase: Phase,
    pub current: u32,
    pub total: u32,
    pub current_object: Option<String>,
    pub message: Option<String>,
    pub estimated_time_remaining: Option<u32>,
}

impl ProgressEvent {
    pub fn new(comparison_id: impl Into<String>, phase: Phase, current: u32, total: u32) -> Self {
        Self {
            comparison_id: comparison_id.into(),
            phase,
            current,
            total,
            current_object: None,
            message: None,
            estimated_time_remaining: None,
        }
    }

    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.current_object = Some(object.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Sender half of a comparison's progress channel. A thin wrapper keeps the
/// orchestrator and comparers from depending on a concrete channel type.
pub type ProgressSender = tokio::sync::mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>;

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}
