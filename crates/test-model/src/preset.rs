use quill_model::ModelFinishReason;
use serde::{Deserialize, Serialize};

/// The failure a preset response should produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetFailure {
    /// The credential is rejected.
    Authentication,
    /// The quota is exhausted.
    RateLimitExceeded,
    /// The prompt is blocked.
    Moderated,
    /// The connection drops.
    Transport,
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Message deltas in this response.
    pub deltas: Vec<String>,
    /// The finish reason reported after the last delta.
    pub finish_reason: ModelFinishReason,
    /// If set, the request fails instead of producing any event.
    pub failure: Option<PresetFailure>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified message deltas.
    #[inline]
    pub fn with_deltas<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deltas: deltas.into_iter().map(Into::into).collect(),
            finish_reason: ModelFinishReason::Stop,
            failure: None,
        }
    }

    /// Creates a `PresetResponse` that always fails.
    #[inline]
    pub fn failing(failure: PresetFailure) -> Self {
        Self {
            deltas: vec![],
            finish_reason: ModelFinishReason::Stop,
            failure: Some(failure),
        }
    }

    /// Overrides the finish reason.
    #[inline]
    pub fn with_finish_reason(mut self, reason: ModelFinishReason) -> Self {
        self.finish_reason = reason;
        self
    }
}
