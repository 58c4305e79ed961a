//! Pass staging and the shared per-utterance context threaded through the pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::pack::PackSet;

/// Where in the pipeline a pass runs, relative to the timing and pitch passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PassStage {
    PreTiming,
    PostTiming,
    PostPitch,
}

/// Per-utterance state shared across every pass invocation.
pub struct PassContext {
    pub pack: Arc<PackSet>,
    pub speed: f64,
    pub base_pitch: f64,
    pub inflection: f64,
    pub clause_type: char,
    /// Scratch values a pass can leave for a later pass in the same run (e.g. cluster detection
    /// results consumed by cluster_blend).
    pub scratchpad: HashMap<String, f64>,
}

impl PassContext {
    pub fn new(pack: Arc<PackSet>, speed: f64, base_pitch: f64, inflection: f64, clause_type: char) -> Self {
        Self {
            pack,
            speed: crate::common::safe_speed(speed),
            base_pitch,
            inflection,
            clause_type,
            scratchpad: HashMap::new(),
        }
    }
}

/// A single pass's failure, carrying its own name for [`PipelineError`]'s message prefix.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PassError(pub String);

impl PassError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Failure of the overall pipeline run, naming which registered pass failed.
#[derive(Debug, Error)]
#[error("pass '{pass}' failed: {source}")]
pub struct PipelineError {
    pub pass: &'static str,
    #[source]
    pub source: PassError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_message_is_prefixed_with_pass_name() {
        let err = PipelineError {
            pass: "nasalization",
            source: PassError::new("boom"),
        };
        assert_eq!(err.to_string(), "pass 'nasalization' failed: boom");
    }

    #[test]
    fn pass_stage_ordering_matches_pipeline_order() {
        assert!(PassStage::PreTiming < PassStage::PostTiming);
        assert!(PassStage::PostTiming < PassStage::PostPitch);
    }
}
