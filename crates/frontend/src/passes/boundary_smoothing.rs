//! Chooses a fade time and per-formant transition speed for every real-token boundary.

use crate::common::{find_prev_real, place_of, Place};
use crate::context::{PassContext, PassError};
use crate::field::FieldId;
use crate::token::Token;

const MIN_FADE_MS: f64 = 6.0;
const ASPIRATION_DOMINANT_AMP: f64 = 0.08;
const ASPIRATION_DOMINANT_VOICE_AMP: f64 = 0.1;
const V_TO_C_MULTIPLIER: f64 = 1.4;
const UTTERANCE_FINAL_MULTIPLIER: f64 = 1.5;
const NASAL_OVERRIDE_F1_SCALE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Vowel,
    Stop,
    Fricative,
    Nasal,
    Liquid,
    Other,
}

fn category_of(tok: &Token) -> Category {
    if tok.is_vowel() || tok.is_semivowel() {
        Category::Vowel
    } else if tok.is_stop_like() {
        Category::Stop
    } else if tok.is_nasal() {
        Category::Nasal
    } else if tok.is_liquid() {
        Category::Liquid
    } else if crate::common::get_field(tok, FieldId::FricationAmplitude) > 0.05 {
        Category::Fricative
    } else {
        Category::Other
    }
}

fn category_name(c: Category) -> &'static str {
    match c {
        Category::Vowel => "vowel",
        Category::Stop => "stop",
        Category::Fricative => "fricative",
        Category::Nasal => "nasal",
        Category::Liquid => "liquid",
        Category::Other => "other",
    }
}

fn lookup_fade_target(lang_targets: &std::collections::HashMap<String, f64>, prev: Category, cur: Category, fallback_cluster_ms: f64) -> f64 {
    let key = format!("{}_{}", category_name(prev), category_name(cur));
    if let Some(v) = lang_targets.get(&key) {
        return *v;
    }
    let reverse_fallbacks: &[(Category, Category, &str)] = &[
        (Category::Nasal, Category::Fricative, "nasal_fricative"),
        (Category::Fricative, Category::Nasal, "fricative_nasal"),
        (Category::Stop, Category::Nasal, "stop_nasal"),
        (Category::Nasal, Category::Liquid, "nasal_liquid"),
        (Category::Liquid, Category::Fricative, "liquid_fricative"),
    ];
    for (p, c, key) in reverse_fallbacks {
        if prev == *p && cur == *c {
            if let Some(v) = lang_targets.get(*key) {
                return *v;
            }
        }
    }
    if prev == Category::Other && cur == Category::Vowel {
        if let Some(v) = lang_targets.get("fricative_vowel") {
            return *v;
        }
    }
    if prev == Category::Vowel && cur == Category::Other {
        if let Some(v) = lang_targets.get("vowel_fricative") {
            return *v;
        }
    }
    if prev != Category::Vowel && cur != Category::Vowel {
        return fallback_cluster_ms;
    }
    0.0
}

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let lang = ctx.pack.lang.clone();
    let speed = ctx.speed;
    let fade_speed = speed.max(1.0);
    let fallback_cluster = 10.0 / speed;

    for i in 0..tokens.len() {
        if tokens[i].is_silence_or_missing() {
            continue;
        }
        let Some(prev_idx) = find_prev_real(tokens, i.checked_sub(1), 60.0) else { continue };

        let prev_cat = category_of(&tokens[prev_idx]);
        let cur_cat = category_of(&tokens[i]);
        let target_raw = lookup_fade_target(&lang.boundary_fade_targets, prev_cat, cur_cat, fallback_cluster);
        let target = target_raw / fade_speed;

        let cur_voiced = tokens[i].is_voiced();
        let prev_voiced = tokens[prev_idx].is_voiced();
        let voicing_flip_guard = cur_cat != Category::Vowel
            && prev_cat != Category::Vowel
            && cur_cat != Category::Stop
            && prev_cat != Category::Stop
            && !tokens[i].word_start
            && cur_voiced != prev_voiced;
        let aspiration_dominant_guard = crate::common::get_field(&tokens[i], FieldId::AspirationAmplitude) > ASPIRATION_DOMINANT_AMP
            && crate::common::get_field(&tokens[i], FieldId::VoiceAmplitude) < ASPIRATION_DOMINANT_VOICE_AMP;

        if target > 0.0 && !voicing_flip_guard && !aspiration_dominant_guard {
            let dur = tokens[i].duration_ms;
            let cap = (0.75 * dur).min(target);
            let floored = cap.max(MIN_FADE_MS.min(dur));
            if floored > tokens[i].fade_ms {
                tokens[i].fade_ms = floored;
            }
            crate::common::clamp_fade_to_duration(&mut tokens[i]);
        }

        let next_real_exists = tokens[i + 1..].iter().any(|t| !t.is_silence_or_missing());
        let hiatus = prev_cat == Category::Vowel && cur_cat == Category::Vowel;
        let pre_silence_vowel = cur_cat == Category::Vowel && !next_real_exists;
        if hiatus || pre_silence_vowel {
            continue;
        }

        let consonant_key = if cur_cat != Category::Vowel {
            tokens[i].key()
        } else if prev_cat != Category::Vowel {
            tokens[prev_idx].key()
        } else {
            None
        };
        let Some(key) = consonant_key else { continue };
        let place = place_of(key);
        let place_name = match place {
            Place::Labial => "labial",
            Place::Alveolar => "alveolar",
            Place::Palatal => "palatal",
            Place::Velar => "velar",
            Place::Unknown => continue,
        };

        let mut f1 = *lang.place_trans_scales.get(&format!("{place_name}_f1")).unwrap_or(&0.0);
        let mut f2 = *lang.place_trans_scales.get(&format!("{place_name}_f2")).unwrap_or(&0.0);
        let mut f3 = *lang.place_trans_scales.get(&format!("{place_name}_f3")).unwrap_or(&0.0);

        if prev_cat == Category::Vowel && cur_cat != Category::Vowel {
            f1 = (f1 * V_TO_C_MULTIPLIER).min(1.0);
            f2 = (f2 * V_TO_C_MULTIPLIER).min(1.0);
            f3 = (f3 * V_TO_C_MULTIPLIER).min(1.0);
        }
        if cur_cat != Category::Vowel && !next_real_exists {
            f1 *= UTTERANCE_FINAL_MULTIPLIER;
            f2 *= UTTERANCE_FINAL_MULTIPLIER;
            f3 *= UTTERANCE_FINAL_MULTIPLIER;
        }
        if lang.nasal_f1_instant && (prev_cat == Category::Nasal || cur_cat == Category::Nasal) {
            f1 = NASAL_OVERRIDE_F1_SCALE;
        }

        tokens[i].trans_f1_scale = f1;
        tokens[i].trans_f2_scale = f2;
        tokens[i].trans_f3_scale = f3;
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
    fn boundary_fade_never_decreases_and_respects_target() {
        let mut pack = PackSet::default();
        pack.lang.boundary_fade_targets.insert("vowel_stop".to_string(), 20.0);
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');

        let mut a = Token::phoneme(Arc::new(PhonemeDef::new("a", PhonemeFlags::IS_VOWEL)));
        a.duration_ms = 80.0;
        let mut t = Token::phoneme(Arc::new(PhonemeDef::new("t", PhonemeFlags::IS_STOP)));
        t.duration_ms = 50.0;
        t.fade_ms = 2.0;
        let mut tokens = vec![a, t];

        run(&mut ctx, &mut tokens).unwrap();
        assert_eq!(tokens[1].fade_ms, 20.0);
    }

    #[test]
    fn hiatus_leaves_trans_scales_at_sentinel() {
        let pack = PackSet::default();
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');
        let a = Token::phoneme(Arc::new(PhonemeDef::new("a", PhonemeFlags::IS_VOWEL)));
        let o = Token::phoneme(Arc::new(PhonemeDef::new("o", PhonemeFlags::IS_VOWEL)));
        let mut tokens = vec![a, o];
        run(&mut ctx, &mut tokens).unwrap();
        assert_eq!(tokens[1].trans_f1_scale, 0.0);
    }
}
