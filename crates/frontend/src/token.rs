//! The shared token type every pass reads and mutates in place.

use std::sync::Arc;

use crate::field::FieldTable;
use crate::phoneme::PhonemeDef;

/// Stress mark on a syllable/vowel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stress {
    #[default]
    None,
    Primary,
    Secondary,
}

impl Stress {
    pub fn is_stressed(self) -> bool {
        self != Stress::None
    }
}

/// One phoneme instance or synthetic gap/aspiration segment in the token stream.
///
/// See the module-level invariants in [`crate`] for the contracts that must hold across passes
/// (I1-I7).
#[derive(Debug, Clone)]
pub struct Token {
    // --- Identity ---
    pub def: Option<Arc<PhonemeDef>>,
    pub silence: bool,

    // --- Prosodic flags ---
    pub word_start: bool,
    pub syllable_start: bool,
    pub stress: Stress,
    pub tone: String,
    pub lengthened: bool,
    pub tied_to: bool,
    pub tied_from: bool,
    pub syllable_index: u32,
    pub base_char: Option<char>,
    pub is_diphthong_glide: bool,

    // --- Gap tags (mutually exclusive with `def`, see I4) ---
    pub pre_stop_gap: bool,
    pub cluster_gap: bool,
    pub vowel_hiatus_gap: bool,
    pub post_stop_aspiration: bool,
    pub voiced_closure: bool,

    // --- Timing ---
    pub duration_ms: f64,
    pub fade_ms: f64,

    // --- Field table ---
    pub fields: FieldTable,

    // --- Optional diphthong end-targets ---
    pub has_end_cf1: bool,
    pub end_cf1: f64,
    pub has_end_cf2: bool,
    pub end_cf2: f64,
    pub has_end_cf3: bool,
    pub end_cf3: f64,
    pub has_end_pf1: bool,
    pub end_pf1: f64,
    pub has_end_pf2: bool,
    pub end_pf2: f64,
    pub has_end_pf3: bool,
    pub end_pf3: f64,

    // --- Transition overrides: 0.0 means "no override" ---
    pub trans_f1_scale: f64,
    pub trans_f2_scale: f64,
    pub trans_f3_scale: f64,

    // --- Prominence: -1.0 means unset ---
    pub prominence: f64,
}

impl Token {
    /// A real (non-silence, non-gap) token for the given phoneme definition.
    pub fn phoneme(def: Arc<PhonemeDef>) -> Self {
        Self {
            def: Some(def),
            silence: false,
            word_start: false,
            syllable_start: false,
            stress: Stress::None,
            tone: String::new(),
            lengthened: false,
            tied_to: false,
            tied_from: false,
            syllable_index: 0,
            base_char: None,
            is_diphthong_glide: false,
            pre_stop_gap: false,
            cluster_gap: false,
            vowel_hiatus_gap: false,
            post_stop_aspiration: false,
            voiced_closure: false,
            duration_ms: 0.0,
            fade_ms: 0.0,
            fields: FieldTable::new(),
            has_end_cf1: false,
            end_cf1: 0.0,
            has_end_cf2: false,
            end_cf2: 0.0,
            has_end_cf3: false,
            end_cf3: 0.0,
            has_end_pf1: false,
            end_pf1: 0.0,
            has_end_pf2: false,
            end_pf2: 0.0,
            has_end_pf3: false,
            end_pf3: 0.0,
            trans_f1_scale: 0.0,
            trans_f2_scale: 0.0,
            trans_f3_scale: 0.0,
            prominence: -1.0,
        }
    }

    /// A synthetic silence/gap token (I4: `def == None && silence == true`).
    pub fn gap(duration_ms: f64, fade_ms: f64) -> Self {
        Self {
            def: None,
            silence: true,
            word_start: false,
            syllable_start: false,
            stress: Stress::None,
            tone: String::new(),
            lengthened: false,
            tied_to: false,
            tied_from: false,
            syllable_index: 0,
            base_char: None,
            is_diphthong_glide: false,
            pre_stop_gap: false,
            cluster_gap: false,
            vowel_hiatus_gap: false,
            post_stop_aspiration: false,
            voiced_closure: false,
            duration_ms,
            fade_ms,
            fields: FieldTable::new(),
            has_end_cf1: false,
            end_cf1: 0.0,
            has_end_cf2: false,
            end_cf2: 0.0,
            has_end_cf3: false,
            end_cf3: 0.0,
            has_end_pf1: false,
            end_pf1: 0.0,
            has_end_pf2: false,
            end_pf2: 0.0,
            has_end_pf3: false,
            end_pf3: 0.0,
            trans_f1_scale: 0.0,
            trans_f2_scale: 0.0,
            trans_f3_scale: 0.0,
            prominence: -1.0,
        }
    }

    pub fn is_silence_or_missing(&self) -> bool {
        self.silence || self.def.is_none()
    }

    pub fn is_vowel(&self) -> bool {
        self.def.as_ref().is_some_and(|d| d.is_vowel())
    }

    pub fn is_stop_like(&self) -> bool {
        if self.silence {
            return false;
        }
        self.def.as_ref().is_some_and(|d| d.is_stop_like())
    }

    pub fn is_nasal(&self) -> bool {
        if self.silence {
            return false;
        }
        self.def.as_ref().is_some_and(|d| d.is_nasal())
    }

    pub fn is_liquid(&self) -> bool {
        if self.silence {
            return false;
        }
        self.def.as_ref().is_some_and(|d| d.is_liquid())
    }

    pub fn is_semivowel(&self) -> bool {
        if self.silence {
            return false;
        }
        self.def.as_ref().is_some_and(|d| d.is_semivowel())
    }

    pub fn is_voiced(&self) -> bool {
        self.def.as_ref().is_some_and(|d| d.is_voiced())
    }

    pub fn key(&self) -> Option<&str> {
        self.def.as_ref().map(|d| d.key.as_str())
    }
}
