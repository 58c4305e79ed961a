//! Scores vowel stress/length/position into a `prominence` scalar, then realizes it as duration
//! and amplitude changes. The most behavior-rich pass in the pipeline; runs in sub-phases.

use crate::common::{clamp01, get_field, set_field};
use crate::context::{PassContext, PassError};
use crate::field::FieldId;
use crate::token::{Stress, Token};

const REDUCED_BASE_CHARS: [char; 5] = ['ə', 'ɐ', 'ᵊ', 'ɨ', 'ᵻ'];

struct WordSpan {
    start: usize,
    end: usize, // exclusive
    last_syllable_start: Option<usize>,
}

fn word_spans(tokens: &[Token]) -> Vec<WordSpan> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    for i in 0..tokens.len() {
        if i > 0 && tokens[i].word_start {
            spans.push(close_span(tokens, start, i));
            start = i;
        }
    }
    if start < tokens.len() {
        spans.push(close_span(tokens, start, tokens.len()));
    }
    spans
}

fn close_span(tokens: &[Token], start: usize, end: usize) -> WordSpan {
    let last_syllable_start = (start..end).rev().find(|&i| tokens[i].syllable_start);
    WordSpan { start, end, last_syllable_start }
}

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let lang = &ctx.pack.lang;
    let spans = word_spans(tokens);

    // (1) Score.
    for span in &spans {
        let mut first_vowel_seen = false;
        for i in span.start..span.end {
            if !tokens[i].is_vowel() {
                continue;
            }
            let mut score = match tokens[i].stress {
                Stress::Primary => 1.0,
                Stress::Secondary => lang.secondary_level,
                Stress::None => inherit_onset_stress(tokens, span.start, i, lang.secondary_level),
            };

            let long_bonus_eligible = tokens[i].lengthened
                && (lang.long_vowel_mode == "always"
                    || (lang.long_vowel_mode == "unstressed-only" && score < f64::EPSILON));
            if long_bonus_eligible {
                score = score.max(lang.long_vowel_level);
            }

            if !first_vowel_seen {
                score += lang.word_init_boost;
                first_vowel_seen = true;
            }
            if let Some(last) = span.last_syllable_start {
                if i >= last {
                    score -= lang.word_final_reduc;
                }
            }
            tokens[i].prominence = clamp01(score);
        }
    }

    // (1b) Monosyllable floor.
    for span in &spans {
        let vowels: Vec<usize> = (span.start..span.end)
            .filter(|&i| tokens[i].is_vowel() && !tokens[i].tied_from)
            .collect();
        if vowels.len() == 1 {
            let i = vowels[0];
            let mono_floor = lang.secondary_level;
            tokens[i].prominence = tokens[i].prominence.max(mono_floor);
        }
    }

    // (1c) Full-vowel protection.
    for i in 0..tokens.len() {
        if !tokens[i].is_vowel() {
            continue;
        }
        let is_reduced = tokens[i].base_char.is_some_and(|c| REDUCED_BASE_CHARS.contains(&c));
        if !is_reduced && tokens[i].prominence < lang.full_vowel_floor {
            tokens[i].prominence = lang.full_vowel_floor;
        }
    }

    // Offglide inheritance.
    for i in 0..tokens.len() {
        if tokens[i].is_vowel() && tokens[i].tied_from {
            let inherited = i.checked_sub(1).map(|p| tokens[p].prominence).filter(|p| *p >= 0.0);
            tokens[i].prominence = inherited.unwrap_or(0.5);
        }
    }

    // (2) Duration realization.
    for i in 0..tokens.len() {
        if !tokens[i].is_vowel() || tokens[i].tied_from {
            continue;
        }
        let p = tokens[i].prominence;
        if p < 0.0 {
            continue;
        }
        if p >= 0.9 {
            tokens[i].duration_ms *= lang.primary_stress_weight;
        } else if p >= 0.4 {
            tokens[i].duration_ms *= lang.secondary_stress_weight;
        }
        if p >= 0.9 && !tokens[i].tied_to {
            tokens[i].duration_ms = tokens[i].duration_ms.max(lang.primary_floor_ms / ctx.speed);
        }
        if p >= 0.4 {
            tokens[i].duration_ms = tokens[i].duration_ms.max(lang.prominent_floor_ms / ctx.speed);
        }
        if p < 0.3 {
            let scale = lang.reduced_ceiling + (p / 0.3) * (1.0 - lang.reduced_ceiling);
            tokens[i].duration_ms *= scale;
        }
        crate::common::clamp_fade_to_duration(&mut tokens[i]);
    }

    // (2b) Syllable-position shaping: every syllable except the last of each word.
    for span in &spans {
        let Some(last_syll) = span.last_syllable_start else { continue };
        let mut syll_start = span.start;
        let mut onset_done = false;
        for i in span.start..span.end {
            if tokens[i].syllable_start {
                syll_start = i;
                onset_done = false;
            }
            if syll_start >= last_syll {
                continue; // last syllable of the word is exempt
            }
            if tokens[i].pre_stop_gap || tokens[i].cluster_gap || tokens[i].vowel_hiatus_gap {
                continue;
            }
            if tokens[i].is_vowel() {
                onset_done = true;
                if !tokens[i].stress.is_stressed() {
                    let next_syllable_start = (i + 1..span.end).find(|&j| tokens[j].syllable_start).unwrap_or(span.end);
                    let open_syllable = (i + 1..next_syllable_start).all(|j| tokens[j].is_vowel() || tokens[j].is_silence_or_missing());
                    if open_syllable {
                        tokens[i].duration_ms *= lang.open_nucleus_scale;
                    }
                }
            } else if !onset_done {
                tokens[i].duration_ms *= lang.onset_scale;
            } else {
                tokens[i].duration_ms *= lang.coda_scale;
            }
            tokens[i].duration_ms = tokens[i].duration_ms.max(2.0);
            crate::common::clamp_fade_to_duration(&mut tokens[i]);
        }
    }

    // (3) Amplitude realization.
    for i in 0..tokens.len() {
        if !tokens[i].is_vowel() {
            continue;
        }
        let p = tokens[i].prominence;
        if p < 0.0 {
            continue;
        }
        let db = if p >= 0.5 {
            lang.boost_db * lang.primary_stress_weight * (p - 0.5) / 0.5
        } else if p < 0.3 {
            -lang.reduction_db * (1.0 - p / 0.3)
        } else {
            0.0
        };
        if db != 0.0 {
            let scale = 10f64.powf(db / 20.0);
            let cur = get_field(&tokens[i], FieldId::VoiceAmplitude);
            set_field(&mut tokens[i], FieldId::VoiceAmplitude, cur * scale);
        }
    }

    Ok(())
}

fn inherit_onset_stress(tokens: &[Token], word_start: usize, vowel_idx: usize, secondary_level: f64) -> f64 {
    let syllable_start = (word_start..vowel_idx).rev().find(|&i| tokens[i].syllable_start);
    let Some(onset_start) = syllable_start else { return 0.0 };
    for j in (onset_start..vowel_idx).rev() {
        if tokens[j].word_start || (tokens[j].is_vowel() && j != onset_start) {
            break;
        }
        if !tokens[j].is_vowel() && tokens[j].stress.is_stressed() {
            return if tokens[j].stress == Stress::Primary { 1.0 } else { secondary_level };
        }
    }
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackSet;
    use crate::phoneme::{PhonemeDef, PhonemeFlags};
    use std::sync::Arc;

    fn lang() -> PackSet {
        let mut pack = PackSet::default();
        pack.lang.secondary_level = 0.6;
        pack.lang.primary_stress_weight = 1.3;
        pack.lang.secondary_stress_weight = 1.1;
        pack.lang.primary_floor_ms = 60.0;
        pack.lang.prominent_floor_ms = 40.0;
        pack.lang.reduced_ceiling = 0.5;
        pack.lang.full_vowel_floor = 0.2;
        pack.lang.boost_db = 3.0;
        pack.lang.reduction_db = 2.0;
        pack
    }

    fn consonant(key: &str) -> Token {
        Token::phoneme(Arc::new(PhonemeDef::new(key, PhonemeFlags::empty())))
    }
    fn vowel(key: &str) -> Token {
        Token::phoneme(Arc::new(PhonemeDef::new(key, PhonemeFlags::IS_VOWEL)))
    }

    #[test]
    fn monosyllable_box_gets_secondary_floor_and_duration_weight() {
        let mut ctx = PassContext::new(Arc::new(lang()), 1.0, 0.0, 0.0, '.');
        let mut b = consonant("b");
        b.word_start = true;
        b.syllable_start = true;
        let mut o = vowel("ɒ");
        o.duration_ms = 50.0;
        let ks = consonant("ks");
        let mut tokens = vec![b, o, ks];

        run(&mut ctx, &mut tokens).unwrap();

        assert!((tokens[1].prominence - 0.6).abs() < 1e-9);
        let expected_floor = (50.0 * 1.1_f64).max(40.0);
        assert!((tokens[1].duration_ms - expected_floor).abs() < 1e-9);
    }
}
