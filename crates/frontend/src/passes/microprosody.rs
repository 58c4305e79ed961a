//! Local F0 perturbation from neighboring consonant voicing and intrinsic vowel height, plus
//! voiceless-context duration adjustments.

use crate::common::{clamp, get_field, set_field};
use crate::context::{PassContext, PassError};
use crate::field::FieldId;
use crate::token::Token;

fn is_voiceless_consonant(tok: &Token) -> bool {
    !tok.is_silence_or_missing() && !tok.is_vowel() && !tok.is_voiced()
}

fn is_voiced_obstruent(tok: &Token, fricative_threshold: f64) -> bool {
    if tok.is_silence_or_missing() || tok.is_vowel() || tok.is_nasal() || tok.is_liquid() || tok.is_semivowel() {
        return false;
    }
    tok.is_stop_like() || get_field(tok, FieldId::FricationAmplitude) > fricative_threshold
}

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let lang = ctx.pack.lang.clone();

    for i in 0..tokens.len() {
        if !tokens[i].is_vowel() {
            continue;
        }
        if !crate::common::has_field(&tokens[i], FieldId::VoicePitch) || !crate::common::has_field(&tokens[i], FieldId::EndVoicePitch) {
            continue;
        }
        if tokens[i].duration_ms < lang.min_vowel_ms {
            continue;
        }

        let mut start_delta = 0.0;
        let mut end_delta = 0.0;

        if let Some(prev) = crate::common::prev_non_silence(tokens, i) {
            if is_voiceless_consonant(prev) {
                start_delta += lang.voiceless_raise_hz;
            } else if is_voiced_obstruent(prev, 0.05) {
                let is_fricative = !prev.is_stop_like();
                let scale = if is_fricative { lang.voiced_fricative_lower_scale } else { 1.0 };
                start_delta -= lang.voiced_lower_hz * scale;
            }
        }
        if let Some(next) = crate::common::next_non_silence(tokens, i) {
            if is_voiceless_consonant(next) {
                end_delta += lang.voiceless_raise_hz;
            } else if is_voiced_obstruent(next, 0.05) {
                let is_fricative = !next.is_stop_like();
                let scale = if is_fricative { lang.voiced_fricative_lower_scale } else { 1.0 };
                end_delta -= lang.voiced_lower_hz * scale;
            }
        }

        let cf1 = get_field(&tokens[i], FieldId::Cf1);
        if cf1 > 0.0 && cf1 < lang.high_threshold_hz {
            start_delta += lang.high_raise_hz;
            end_delta += lang.high_raise_hz;
        }
        if cf1 > lang.low_threshold_hz {
            start_delta -= lang.low_drop_hz;
            end_delta -= lang.low_drop_hz;
        }

        start_delta = clamp(start_delta, -lang.max_total_delta_hz, lang.max_total_delta_hz);
        end_delta = clamp(end_delta, -lang.max_total_delta_hz, lang.max_total_delta_hz);

        let start_p = (get_field(&tokens[i], FieldId::VoicePitch) + start_delta).max(20.0);
        let end_p = (get_field(&tokens[i], FieldId::EndVoicePitch) + end_delta).max(20.0);
        set_field(&mut tokens[i], FieldId::VoicePitch, start_p);
        set_field(&mut tokens[i], FieldId::EndVoicePitch, end_p);

        if !tokens[i].is_diphthong_glide {
            if let Some(next) = crate::common::next_non_silence(tokens, i) {
                if is_voiceless_consonant(next) {
                    let shortened = tokens[i].duration_ms * lang.pre_voiceless_shorten_scale;
                    tokens[i].duration_ms = shortened.max(lang.pre_voiceless_min_ms);
                    crate::common::clamp_fade_to_duration(&mut tokens[i]);
                }
            }
        }
    }

    // Phase 5: voiceless coda lengthening, a separate pass over the whole stream.
    for i in 0..tokens.len() {
        if !is_voiceless_consonant(&tokens[i]) {
            continue;
        }
        if let Some(prev) = crate::common::prev_non_silence(tokens, i) {
            if prev.is_voiced() || prev.is_vowel() {
                tokens[i].duration_ms *= lang.voiceless_coda_lengthen_scale;
                crate::common::clamp_fade_to_duration(&mut tokens[i]);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackSet;
    use crate::phoneme::{PhonemeDef, PhonemeFlags};
    use std::sync::Arc;

    #[test]
    fn voiceless_onset_raises_pitch_and_respects_total_cap() {
        let mut pack = PackSet::default();
        pack.lang.min_vowel_ms = 10.0;
        pack.lang.voiceless_raise_hz = 15.0;
        pack.lang.max_total_delta_hz = 10.0;
        pack.lang.high_threshold_hz = 0.0;
        pack.lang.low_threshold_hz = 100000.0;
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');

        let s = Token::phoneme(Arc::new(PhonemeDef::new("s", PhonemeFlags::empty())));
        let mut a = Token::phoneme(Arc::new(PhonemeDef::new("a", PhonemeFlags::IS_VOWEL)));
        a.duration_ms = 80.0;
        a.fields.set(FieldId::VoicePitch, 100.0);
        a.fields.set(FieldId::EndVoicePitch, 100.0);
        let mut tokens = vec![s, a];

        run(&mut ctx, &mut tokens).unwrap();
        assert_eq!(get_field(&tokens[1], FieldId::VoicePitch), 110.0);
    }
}
