//! Shared resolution primitives and neighbor-walk helpers used by every pass.

use crate::field::FieldId;
use crate::pack::LanguagePack;
use crate::token::Token;

/// Token override if set, else the phoneme def's default, else `0.0`.
pub fn get_field(tok: &Token, id: FieldId) -> f64 {
    if tok.fields.is_set(id) {
        return tok.fields.raw(id);
    }
    if let Some(def) = &tok.def {
        if def.fields.is_set(id) {
            return def.fields.raw(id);
        }
    }
    0.0
}

/// Whether `id` is resolvable from either the token or its def.
pub fn has_field(tok: &Token, id: FieldId) -> bool {
    tok.fields.is_set(id) || tok.def.as_ref().is_some_and(|d| d.fields.is_set(id))
}

/// Write a token-level override, setting its mask bit (I3).
pub fn set_field(tok: &mut Token, id: FieldId, value: f64) {
    tok.fields.set(id, value);
}

/// Enforce I1: `0 <= fade_ms <= duration_ms`, and I2: `duration_ms` finite and `>= 0`.
pub fn clamp_fade_to_duration(tok: &mut Token) {
    if !tok.duration_ms.is_finite() || tok.duration_ms < 0.0 {
        tok.duration_ms = 0.0;
    }
    if !tok.fade_ms.is_finite() || tok.fade_ms < 0.0 {
        tok.fade_ms = 0.0;
    }
    if tok.fade_ms > tok.duration_ms {
        tok.fade_ms = tok.duration_ms;
    }
}

/// Clamp speaking speed away from zero/negative so downstream divisions are safe.
pub fn safe_speed(speed: f64) -> f64 {
    if speed < 0.05 {
        0.05
    } else {
        speed
    }
}

pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.clamp(lo, hi)
}

pub fn clamp01(v: f64) -> f64 {
    clamp(v, 0.0, 1.0)
}

/// Previous token that is neither silence nor missing a def.
pub fn prev_non_silence(tokens: &[Token], idx: usize) -> Option<&Token> {
    tokens[..idx].iter().rev().find(|t| !t.is_silence_or_missing())
}

/// Next token that is neither silence nor missing a def.
pub fn next_non_silence(tokens: &[Token], idx: usize) -> Option<&Token> {
    tokens[idx + 1..].iter().find(|t| !t.is_silence_or_missing())
}

/// Whether the token at `idx` is at or before the utterance-final real token.
pub fn is_word_final_index(tokens: &[Token], idx: usize) -> bool {
    for t in &tokens[idx + 1..] {
        if t.is_silence_or_missing() {
            continue;
        }
        return t.word_start;
    }
    true
}

/// Walk backward from `idx_before` (inclusive) for the previous *real* token, treating a
/// silence token with no micro-gap tag and `duration_ms > max_skip_ms` as a real pause that
/// blocks the search (boundary passes must not treat phonemes across a real pause as adjacent).
pub fn find_prev_real(tokens: &[Token], idx_before: Option<usize>, max_skip_ms: f64) -> Option<usize> {
    let start = idx_before?;
    for j in (0..=start).rev() {
        let t = &tokens[j];
        if !t.is_silence_or_missing() {
            return Some(j);
        }
        if t.silence {
            let is_micro_gap = t.pre_stop_gap || t.cluster_gap || t.vowel_hiatus_gap;
            if !is_micro_gap && t.duration_ms > max_skip_ms {
                break;
            }
        }
    }
    None
}

/// Perceptual minimum duration for `tok`'s phonological class, in priority order: vowel, nasal,
/// liquid, semivowel, affricate, stop, tap, trill, fricative-like (positive frication amplitude),
/// then a voiced-consonant catch-all. Shared by `rate_compensation` and `cluster_timing`.
pub fn class_floor_ms(lang: &LanguagePack, tok: &Token) -> f64 {
    if tok.is_silence_or_missing() {
        return 0.0;
    }
    let def = match &tok.def {
        Some(d) => d,
        None => return 0.0,
    };
    use crate::phoneme::PhonemeFlags;
    if def.is_vowel() {
        lang.class_floor_vowel_ms
    } else if def.is_nasal() {
        lang.class_floor_nasal_ms
    } else if def.is_liquid() {
        lang.class_floor_liquid_ms
    } else if def.is_semivowel() {
        lang.class_floor_semivowel_ms
    } else if def.flags.contains(PhonemeFlags::IS_AFFRICATE) {
        lang.class_floor_affricate_ms
    } else if def.flags.contains(PhonemeFlags::IS_STOP) {
        lang.class_floor_stop_ms
    } else if def.flags.contains(PhonemeFlags::IS_TAP) {
        lang.class_floor_tap_ms
    } else if def.flags.contains(PhonemeFlags::IS_TRILL) {
        lang.class_floor_trill_ms
    } else if get_field(tok, FieldId::FricationAmplitude) > 0.05 {
        lang.class_floor_fricative_ms
    } else if def.is_voiced() {
        lang.class_floor_voiced_consonant_ms
    } else {
        0.0
    }
}

/// Place of articulation, shared between coarticulation-family and boundary-smoothing passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Unknown,
    Labial,
    Alveolar,
    Palatal,
    Velar,
}

/// Pure IPA-key -> place classification (mirrors the reference `getPlace` table).
pub fn place_of(key: &str) -> Place {
    const LABIAL: &[&str] = &["p", "b", "m", "f", "v", "w", "ʍ", "ɸ", "β"];
    const ALVEOLAR: &[&str] = &[
        "t", "d", "n", "s", "z", "l", "r", "ɹ", "ɾ", "θ", "ð", "ɬ", "ɮ", "ɻ", "ɖ", "ʈ", "ɳ", "ɽ",
    ];
    const PALATAL: &[&str] = &[
        "ʃ", "ʒ", "tʃ", "dʒ", "t\u{361}ʃ", "d\u{361}ʒ", "j", "ɲ", "ç", "ʝ", "c", "ɟ", "ʎ",
    ];
    const VELAR: &[&str] = &["k", "g", "ŋ", "x", "ɣ", "ɰ"];

    if LABIAL.contains(&key) {
        Place::Labial
    } else if ALVEOLAR.contains(&key) {
        Place::Alveolar
    } else if PALATAL.contains(&key) {
        Place::Palatal
    } else if VELAR.contains(&key) {
        Place::Velar
    } else {
        Place::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phoneme::{PhonemeDef, PhonemeFlags};
    use std::sync::Arc;

    #[test]
    fn get_field_prefers_token_override_over_def_default() {
        let mut def = PhonemeDef::new("a", PhonemeFlags::IS_VOWEL);
        def.fields.set(FieldId::Cf1, 700.0);
        let mut t = Token::phoneme(Arc::new(def));
        assert_eq!(get_field(&t, FieldId::Cf1), 700.0);
        set_field(&mut t, FieldId::Cf1, 650.0);
        assert_eq!(get_field(&t, FieldId::Cf1), 650.0);
        assert!(t.fields.is_set(FieldId::Cf1));
    }

    #[test]
    fn missing_field_resolves_to_zero() {
        let def = PhonemeDef::new("a", PhonemeFlags::IS_VOWEL);
        let t = Token::phoneme(Arc::new(def));
        assert!(!has_field(&t, FieldId::Cf2));
        assert_eq!(get_field(&t, FieldId::Cf2), 0.0);
    }

    #[test]
    fn clamp_fade_to_duration_enforces_i1() {
        let mut t = Token::gap(10.0, 15.0);
        clamp_fade_to_duration(&mut t);
        assert_eq!(t.fade_ms, 10.0);

        let mut t2 = Token::gap(-5.0, -1.0);
        clamp_fade_to_duration(&mut t2);
        assert_eq!(t2.duration_ms, 0.0);
        assert_eq!(t2.fade_ms, 0.0);
    }

    #[test]
    fn place_of_classifies_common_consonants() {
        assert_eq!(place_of("p"), Place::Labial);
        assert_eq!(place_of("t"), Place::Alveolar);
        assert_eq!(place_of("ʃ"), Place::Palatal);
        assert_eq!(place_of("k"), Place::Velar);
        assert_eq!(place_of("h"), Place::Unknown);
    }

    #[test]
    fn find_prev_real_stops_at_a_genuine_pause() {
        let mut tokens = vec![
            Token::phoneme(Arc::new(PhonemeDef::new("a", PhonemeFlags::IS_VOWEL))),
            Token::gap(200.0, 0.0),
            Token::phoneme(Arc::new(PhonemeDef::new("b", PhonemeFlags::empty()))),
        ];
        tokens[1].silence = true;
        assert_eq!(find_prev_real(&tokens, Some(1), 60.0), None);
    }
}
