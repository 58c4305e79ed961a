//! Three independently-gated positional effects: stop aspiration scaling, `/l/` darkness, and
//! glottal reinforcement. All three are gated by the language's positional-allophone switch.

use crate::common::{
    clamp, clamp01, clamp_fade_to_duration, get_field, is_word_final_index, prev_non_silence, set_field,
};
use crate::context::{PassContext, PassError};
use crate::field::FieldId;
use crate::token::Token;

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    if !ctx.pack.lang.positional_allophones_enabled {
        return Ok(());
    }
    scale_stop_aspiration(ctx, tokens);
    darken_laterals(ctx, tokens);
    reinforce_glottal_stop(ctx, tokens);
    Ok(())
}

fn scale_stop_aspiration(ctx: &mut PassContext, tokens: &mut [Token]) {
    let speed = ctx.speed;
    let lang = &ctx.pack.lang;
    let len = tokens.len();

    for i in 0..len {
        if !tokens[i].post_stop_aspiration {
            continue;
        }
        let stop_idx = match i.checked_sub(1) {
            Some(j) if tokens[j].is_stop_like() => j,
            _ => continue,
        };
        let stop_word_start = tokens[stop_idx].word_start;
        let stop_stressed = tokens[stop_idx].stress.is_stressed();
        let word_final = is_word_final_index(tokens, i);
        let intervocalic = prev_non_silence(tokens, stop_idx).is_some_and(|t| t.is_vowel())
            && tokens[i + 1..].iter().find(|t| !t.is_silence_or_missing()).is_some_and(|t| t.is_vowel());

        let s = if stop_word_start && stop_stressed {
            lang.aspiration_scale_initial_stressed
        } else if stop_word_start {
            lang.aspiration_scale_initial
        } else if word_final {
            lang.aspiration_scale_final
        } else if intervocalic {
            lang.aspiration_scale_intervocalic
        } else {
            1.0
        };
        let s = clamp(s, 0.05, 2.0);

        let tok = &mut tokens[i];
        tok.duration_ms *= s;
        tok.fade_ms *= s;
        if tok.fields.is_set(FieldId::AspirationAmplitude) {
            let v = get_field(tok, FieldId::AspirationAmplitude) * s;
            set_field(tok, FieldId::AspirationAmplitude, v);
        }
        if tok.fields.is_set(FieldId::FricationAmplitude) {
            let v = get_field(tok, FieldId::FricationAmplitude) * s;
            set_field(tok, FieldId::FricationAmplitude, v);
        }
        let min_fade = (2.0 / speed).min(tok.duration_ms);
        tok.fade_ms = tok.fade_ms.max(min_fade);
        clamp_fade_to_duration(tok);
    }
}

fn darken_laterals(ctx: &mut PassContext, tokens: &mut [Token]) {
    let lang = &ctx.pack.lang;
    let target = lang.l_darkness_target_f2.max(200.0);
    let len = tokens.len();

    for i in 0..len {
        let is_lateral = tokens[i].key() == Some("l") || tokens[i].key() == Some("ɫ");
        if !is_lateral {
            continue;
        }
        let prevocalic = tokens[i + 1..]
            .iter()
            .find(|t| !t.is_silence_or_missing())
            .is_some_and(|t| t.is_vowel());
        let postvocalic = tokens[..i]
            .iter()
            .rev()
            .find(|t| !t.is_silence_or_missing())
            .is_some_and(|t| t.is_vowel());

        let d = clamp01(if prevocalic {
            lang.l_darkness_prevocalic
        } else if postvocalic {
            lang.l_darkness_postvocalic
        } else {
            lang.l_darkness_syllabic
        });

        for id in [FieldId::Cf2, FieldId::Pf2] {
            let tok = &tokens[i];
            if crate::common::has_field(tok, id) {
                let cur = get_field(tok, id);
                if cur > 0.0 {
                    let new = cur + (target - cur) * d;
                    set_field(&mut tokens[i], id, new);
                }
            }
        }
    }
}

fn reinforce_glottal_stop(ctx: &mut PassContext, tokens: &mut Vec<Token>) {
    let lang = &ctx.pack.lang;
    let v_hash = lang.glottal_reinforcement_contexts.iter().any(|c| c == "V_#");
    let hash_hash = lang.glottal_reinforcement_contexts.iter().any(|c| c == "#_#");
    if !v_hash && !hash_hash {
        return;
    }
    let glottal_def = match ctx.pack.phoneme("ʔ") {
        Some(def) => def.clone(),
        None => return,
    };
    let base_ms = lang.glottal_reinforcement_base_ms;
    let speed = ctx.speed;

    let len = tokens.len();
    let mut out = Vec::with_capacity(len + 4);
    for i in 0..len {
        let is_target = {
            let t = &tokens[i];
            !t.is_silence_or_missing() && t.is_stop_like() && !t.is_voiced() && is_word_final_index(tokens, i)
        };
        if is_target {
            let prev_vowel = out.iter().rev().find(|t: &&Token| !t.is_silence_or_missing()).is_some_and(|t| t.is_vowel());
            let already_glottal = out.last().is_some_and(|t| t.key() == Some("ʔ"));
            let allowed = (v_hash && prev_vowel) || hash_hash;
            if allowed && !already_glottal {
                let mut glottal = Token::phoneme(glottal_def.clone());
                glottal.duration_ms = base_ms / speed;
                glottal.fade_ms = (3.0 / speed).min(glottal.duration_ms);
                out.push(glottal);
            }
        }
        out.push(tokens[i].clone());
    }
    *tokens = out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackSet;
    use crate::phoneme::{PhonemeDef, PhonemeFlags};
    use crate::token::Stress;
    use std::sync::Arc;

    fn base_ctx() -> PackSet {
        let mut pack = PackSet::default();
        pack.lang.positional_allophones_enabled = true;
        pack.lang.aspiration_scale_initial_stressed = 1.5;
        pack.lang.aspiration_scale_initial = 1.2;
        pack.lang.aspiration_scale_final = 0.8;
        pack.lang.aspiration_scale_intervocalic = 1.0;
        pack
    }

    #[test]
    fn scales_aspiration_after_stressed_word_initial_stop() {
        let pack = base_ctx();
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');

        let mut p = Token::phoneme(Arc::new(PhonemeDef::new("p", PhonemeFlags::IS_STOP)));
        p.word_start = true;
        p.stress = Stress::Primary;
        let mut asp = Token::phoneme(Arc::new(PhonemeDef::new("h\u{0361}", PhonemeFlags::empty())));
        asp.post_stop_aspiration = true;
        asp.duration_ms = 20.0;
        asp.fade_ms = 4.0;
        asp.fields.set(FieldId::AspirationAmplitude, 1.0);
        let a = Token::phoneme(Arc::new(PhonemeDef::new("a", PhonemeFlags::IS_VOWEL)));

        let mut tokens = vec![p, asp, a];
        run(&mut ctx, &mut tokens).unwrap();

        assert!((tokens[1].duration_ms - 30.0).abs() < 1e-9);
        assert_eq!(get_field(&tokens[1], FieldId::AspirationAmplitude), 1.5);
    }

    #[test]
    fn inserts_glottal_stop_before_word_final_voiceless_stop_after_vowel() {
        let mut pack = base_ctx();
        pack.lang.glottal_reinforcement_contexts = vec!["V_#".to_string()];
        pack.lang.glottal_reinforcement_base_ms = 20.0;
        pack.phonemes.insert(
            "ʔ".to_string(),
            Arc::new(PhonemeDef::new("ʔ", PhonemeFlags::IS_STOP)),
        );
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');

        let a = Token::phoneme(Arc::new(PhonemeDef::new("a", PhonemeFlags::IS_VOWEL)));
        let mut t = Token::phoneme(Arc::new(PhonemeDef::new("t", PhonemeFlags::IS_STOP)));
        t.word_start = false;
        let mut tokens = vec![a, t];

        run(&mut ctx, &mut tokens).unwrap();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].key(), Some("ʔ"));
        assert_eq!(tokens[2].key(), Some("t"));
    }

    #[test]
    fn does_not_double_insert_glottal_stop() {
        let mut pack = base_ctx();
        pack.lang.glottal_reinforcement_contexts = vec!["#_#".to_string()];
        pack.lang.glottal_reinforcement_base_ms = 20.0;
        pack.phonemes.insert(
            "ʔ".to_string(),
            Arc::new(PhonemeDef::new("ʔ", PhonemeFlags::IS_STOP)),
        );
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');

        let glottal = Token::phoneme(Arc::new(PhonemeDef::new("ʔ", PhonemeFlags::IS_STOP)));
        let t = Token::phoneme(Arc::new(PhonemeDef::new("t", PhonemeFlags::IS_STOP)));
        let mut tokens = vec![glottal, t];

        run(&mut ctx, &mut tokens).unwrap();
        assert_eq!(tokens.len(), 2);
    }
}
