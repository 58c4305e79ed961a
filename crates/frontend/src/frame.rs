//! The contract the downstream formant synthesizer expects from a fully-processed token.
//!
//! This module does not render audio; it only describes the shape a `Token` must satisfy once
//! every pass has run, and a function to check that shape holds.

use serde::Serialize;

use crate::common::get_field;
use crate::field::FieldId;
use crate::token::Token;

/// A flattened, resolved view of one token's formant targets, ready for frame synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameSpec {
    pub duration_ms: f64,
    pub fade_ms: f64,
    pub cf: [f64; 3],
    pub pf: [f64; 3],
    pub end_cf: Option<[f64; 3]>,
    pub end_pf: Option<[f64; 3]>,
    pub voice_pitch: f64,
    pub end_voice_pitch: f64,
    pub voice_amplitude: f64,
    pub aspiration_amplitude: f64,
    pub frication_amplitude: f64,
}

impl FrameSpec {
    pub fn resolve(tok: &Token) -> FrameSpec {
        FrameSpec {
            duration_ms: tok.duration_ms,
            fade_ms: tok.fade_ms,
            cf: [get_field(tok, FieldId::Cf1), get_field(tok, FieldId::Cf2), get_field(tok, FieldId::Cf3)],
            pf: [get_field(tok, FieldId::Pf1), get_field(tok, FieldId::Pf2), get_field(tok, FieldId::Pf3)],
            end_cf: (tok.has_end_cf1 || tok.has_end_cf2 || tok.has_end_cf3)
                .then_some([tok.end_cf1, tok.end_cf2, tok.end_cf3]),
            end_pf: (tok.has_end_pf1 || tok.has_end_pf2 || tok.has_end_pf3)
                .then_some([tok.end_pf1, tok.end_pf2, tok.end_pf3]),
            voice_pitch: get_field(tok, FieldId::VoicePitch),
            end_voice_pitch: get_field(tok, FieldId::EndVoicePitch),
            voice_amplitude: get_field(tok, FieldId::VoiceAmplitude),
            aspiration_amplitude: get_field(tok, FieldId::AspirationAmplitude),
            frication_amplitude: get_field(tok, FieldId::FricationAmplitude),
        }
    }
}

/// A [`FrameSpec`] plus the token identity a consumer needs to line frames up with input text.
#[derive(Debug, Clone, Serialize)]
pub struct TokenFrame {
    pub key: Option<String>,
    pub silence: bool,
    pub word_start: bool,
    pub syllable_start: bool,
    pub stress: &'static str,
    #[serde(flatten)]
    pub frame: FrameSpec,
}

impl TokenFrame {
    pub fn resolve(tok: &Token) -> TokenFrame {
        TokenFrame {
            key: tok.key().map(str::to_string),
            silence: tok.silence,
            word_start: tok.word_start,
            syllable_start: tok.syllable_start,
            stress: match tok.stress {
                crate::token::Stress::None => "none",
                crate::token::Stress::Primary => "primary",
                crate::token::Stress::Secondary => "secondary",
            },
            frame: FrameSpec::resolve(tok),
        }
    }
}

/// Checks the output contract (§6): real tokens have positive duration and `fade <= duration`.
pub fn satisfies_output_contract(tok: &Token) -> bool {
    if tok.is_silence_or_missing() {
        return tok.duration_ms >= 0.0 && tok.fade_ms <= tok.duration_ms;
    }
    tok.duration_ms > 0.0 && tok.fade_ms <= tok.duration_ms && tok.duration_ms.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phoneme::{PhonemeDef, PhonemeFlags};
    use std::sync::Arc;

    #[test]
    fn resolve_picks_up_set_fields_and_leaves_end_targets_absent_by_default() {
        let mut def = PhonemeDef::new("a", PhonemeFlags::IS_VOWEL);
        def.fields.set(FieldId::Cf1, 700.0);
        let mut tok = Token::phoneme(Arc::new(def));
        tok.duration_ms = 80.0;
        tok.fade_ms = 10.0;

        let frame = FrameSpec::resolve(&tok);
        assert_eq!(frame.cf[0], 700.0);
        assert!(frame.end_cf.is_none());
        assert!(satisfies_output_contract(&tok));
    }
}
