//! Phonetic realization pipeline for a formant-based text-to-speech frontend.
//!
//! Given a token stream produced upstream (phoneme defs, syllable/word boundaries, stress, and
//! tie-bars already assigned), [`pipeline::run_all`] mutates it through three staged groups of
//! passes so a downstream formant synthesizer can render natural-sounding speech: vowels lengthen
//! under stress, stops aspirate word-initially, formants glide smoothly across boundaries, and so
//! on. See [`context::PassStage`] for the stage contracts and [`pipeline::PASSES`] for the
//! registered pass order.

pub mod common;
pub mod context;
pub mod field;
pub mod frame;
pub mod pack;
pub mod passes;
pub mod phoneme;
pub mod pipeline;
pub mod token;
pub mod tokenbuild;

pub use context::{PassContext, PassError, PassStage, PipelineError};
pub use field::{FieldId, FieldTable, FIELD_COUNT};
pub use frame::{satisfies_output_contract, FrameSpec, TokenFrame};
pub use pack::{LanguagePack, PackError, PackSet};
pub use phoneme::{PhonemeDef, PhonemeFlags};
pub use pipeline::{run_all, run_passes};
pub use token::{Stress, Token};
