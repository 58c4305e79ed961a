//! Perceptual duration floors at high speaking rate, word-final schwa reduction, cluster
//! proportion preservation, and rate-dependent schwa shortening. Five phases, numbered as in the
//! reference implementation (phase 0 runs unconditionally; phases 1-4 are gated together).

use crate::common::class_floor_ms;
use crate::context::{PassContext, PassError};
use crate::token::Token;

fn is_schwa(tok: &Token) -> bool {
    matches!(tok.key(), Some("ə") | Some("@"))
}

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let lang = ctx.pack.lang.clone();
    let speed = ctx.speed;

    // Phase 0: word-final schwa reduction, unconditional on rate_comp_enabled.
    if lang.word_final_schwa_reduction_enabled {
        for i in 0..tokens.len() {
            if !is_schwa(&tokens[i]) || tokens[i].stress.is_stressed() {
                continue;
            }
            if !crate::common::is_word_final_index(tokens, i) {
                continue;
            }
            tokens[i].duration_ms = (tokens[i].duration_ms * lang.word_final_schwa_scale).max(lang.word_final_schwa_min_ms);
            crate::common::clamp_fade_to_duration(&mut tokens[i]);
        }
    }

    if !lang.rate_comp_enabled {
        return Ok(());
    }

    // Snapshot pre-floor durations for phase 3's ratio comparison.
    let orig_dur: Vec<f64> = tokens.iter().map(|t| t.duration_ms).collect();

    // Phase 1: perceptual floor enforcement.
    let speed_scale = lang.rate_comp_speed_scale * (1.0_f64).min(((speed - 1.0) / 4.0).max(0.0));
    for i in 0..tokens.len() {
        if tokens[i].is_silence_or_missing() {
            continue;
        }
        let floor = class_floor_ms(&lang, &tokens[i]) * (1.0 - speed_scale);
        if tokens[i].duration_ms < floor {
            tokens[i].duration_ms = floor;
            crate::common::clamp_fade_to_duration(&mut tokens[i]);
        }
    }

    // Phase 2: word-final protection bonus.
    for i in 0..tokens.len() {
        if tokens[i].is_silence_or_missing() {
            continue;
        }
        if crate::common::is_word_final_index(tokens, i) {
            tokens[i].duration_ms += lang.word_final_bonus_ms;
        } else if penultimate_at_word_end(tokens, i) {
            tokens[i].duration_ms += 0.5 * lang.word_final_bonus_ms;
        }
    }

    // Phase 3: cluster proportion guard.
    for i in 1..tokens.len() {
        let c1 = i - 1;
        if tokens[c1].is_silence_or_missing()
            || tokens[i].is_silence_or_missing()
            || tokens[c1].is_vowel()
            || tokens[i].is_vowel()
            || tokens[i].word_start
            || tokens[i].syllable_start
        {
            continue;
        }
        let (d1_orig, d2_orig) = (orig_dur[c1], orig_dur[i]);
        if d1_orig <= 0.0 || d2_orig <= 0.0 {
            continue;
        }
        let orig_ratio = d1_orig / d2_orig;
        let cur_ratio = tokens[c1].duration_ms / tokens[i].duration_ms;
        if (cur_ratio - orig_ratio).abs() <= lang.cluster_max_shift {
            continue;
        }
        let floor1 = class_floor_ms(&lang, &tokens[c1]);
        let floor2 = class_floor_ms(&lang, &tokens[i]);
        if cur_ratio < orig_ratio {
            let target = (tokens[i].duration_ms * orig_ratio)
                .min(d1_orig)
                .max(floor1)
                .max(tokens[c1].duration_ms);
            tokens[c1].duration_ms = target;
        } else {
            let target = (tokens[c1].duration_ms / orig_ratio)
                .min(d2_orig)
                .max(floor2)
                .max(tokens[i].duration_ms);
            tokens[i].duration_ms = target;
        }
        crate::common::clamp_fade_to_duration(&mut tokens[c1]);
        crate::common::clamp_fade_to_duration(&mut tokens[i]);
    }

    // Phase 4: rate-dependent schwa shortening.
    if lang.rate_comp_schwa_reduction_enabled && speed > lang.rate_comp_schwa_threshold {
        let thr = lang.rate_comp_schwa_threshold;
        let over = ((speed - thr) / thr).min(1.0).max(0.0);
        let scale = 1.0 + over * (lang.rate_comp_schwa_scale - 1.0);
        for i in 0..tokens.len() {
            if !is_schwa(&tokens[i]) || tokens[i].word_start || tokens[i].stress.is_stressed() {
                continue;
            }
            let floor = class_floor_ms(&lang, &tokens[i]);
            tokens[i].duration_ms = (tokens[i].duration_ms * scale).max(floor);
            crate::common::clamp_fade_to_duration(&mut tokens[i]);
        }
    }

    Ok(())
}

fn penultimate_at_word_end(tokens: &[Token], idx: usize) -> bool {
    let next_real = tokens[idx + 1..].iter().position(|t| !t.is_silence_or_missing());
    match next_real {
        Some(off) => crate::common::is_word_final_index(tokens, idx + 1 + off),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackSet;
    use crate::phoneme::{PhonemeDef, PhonemeFlags};
    use std::sync::Arc;

    #[test]
    fn schwa_shortened_at_moderate_overspeed_but_floored_at_high_speed() {
        let mut pack = PackSet::default();
        pack.lang.rate_comp_schwa_reduction_enabled = true;
        pack.lang.rate_comp_schwa_threshold = 1.5;
        pack.lang.rate_comp_schwa_scale = 0.5;
        pack.lang.class_floor_vowel_ms = 30.0;
        let pack = Arc::new(pack);

        let mut ctx = PassContext::new(pack.clone(), 2.0, 0.0, 0.0, '.');
        let mut tokens = vec![Token::phoneme(Arc::new(PhonemeDef::new("ə", PhonemeFlags::IS_VOWEL)))];
        tokens[0].duration_ms = 40.0;
        run(&mut ctx, &mut tokens).unwrap();
        assert!((tokens[0].duration_ms - 33.333333333).abs() < 1e-6);

        let mut ctx2 = PassContext::new(pack, 3.0, 0.0, 0.0, '.');
        let mut tokens2 = vec![Token::phoneme(Arc::new(PhonemeDef::new("ə", PhonemeFlags::IS_VOWEL)))];
        tokens2[0].duration_ms = 40.0;
        run(&mut ctx2, &mut tokens2).unwrap();
        assert_eq!(tokens2[0].duration_ms, 30.0);
    }
}
