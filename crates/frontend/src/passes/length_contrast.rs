//! Vowel duration ceilings/floors, explicit-geminate shaping, and realization of the `lengthened`
//! marker on consonants via batched gap insertion.

use crate::context::{PassContext, PassError};
use crate::token::Token;

struct GapInsertion {
    insert_before: usize,
    duration_ms: f64,
    fade_ms: f64,
}

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let lang = ctx.pack.lang.clone();
    let speed = ctx.speed;

    // Vowel ceilings and floors.
    for tok in tokens.iter_mut() {
        if !tok.is_vowel() {
            continue;
        }
        if !tok.lengthened {
            let ceil = lang.short_ceil_ms / speed;
            if tok.duration_ms > ceil {
                tok.duration_ms = ceil;
            }
        } else {
            let floor = lang.long_floor_ms / speed;
            if tok.duration_ms < floor {
                tok.duration_ms = floor;
            }
        }
        crate::common::clamp_fade_to_duration(tok);
    }

    // Explicit geminates: C1 [preStopGap] C2, same key, C2 not word_start.
    for i in 0..tokens.len() {
        if !tokens[i].pre_stop_gap {
            continue;
        }
        let Some(c1) = i.checked_sub(1) else { continue };
        let c2 = i + 1;
        if c2 >= tokens.len() {
            continue;
        }
        if tokens[c2].word_start {
            continue;
        }
        if tokens[c1].key().is_none() || tokens[c1].key() != tokens[c2].key() {
            continue;
        }
        tokens[i].duration_ms *= lang.geminate_closure_scale;
        tokens[i].fade_ms *= lang.geminate_closure_scale;
        crate::common::clamp_fade_to_duration(&mut tokens[i]);
        if tokens[c2].is_stop_like() {
            tokens[c2].duration_ms *= lang.geminate_release_scale;
            crate::common::clamp_fade_to_duration(&mut tokens[c2]);
        }
        if let Some(v) = prev_in_word_vowel(tokens, c1) {
            tokens[v].duration_ms *= lang.pre_geminate_vowel_scale;
            crate::common::clamp_fade_to_duration(&mut tokens[v]);
        }
    }

    // Marked consonants (`lengthened`).
    let mut insertions = Vec::new();
    for i in 0..tokens.len() {
        if tokens[i].is_silence_or_missing() || !tokens[i].lengthened {
            continue;
        }
        if tokens[i].is_stop_like() {
            insertions.push(GapInsertion {
                insert_before: i,
                duration_ms: (40.0 / speed) * lang.geminate_closure_scale,
                fade_ms: 4.0 / speed,
            });
            tokens[i].duration_ms *= lang.geminate_release_scale;
        } else {
            tokens[i].duration_ms *= lang.geminate_closure_scale;
        }
        crate::common::clamp_fade_to_duration(&mut tokens[i]);
        if let Some(v) = prev_in_word_vowel(tokens, i) {
            tokens[v].duration_ms *= lang.pre_geminate_vowel_scale;
            crate::common::clamp_fade_to_duration(&mut tokens[v]);
        }
        tokens[i].lengthened = false;
    }

    for ins in insertions.into_iter().rev() {
        let gap = Token::gap(ins.duration_ms, ins.fade_ms.min(ins.duration_ms));
        tokens.insert(ins.insert_before, gap);
    }
    Ok(())
}

fn prev_in_word_vowel(tokens: &[Token], idx: usize) -> Option<usize> {
    for j in (0..idx).rev() {
        if tokens[j].is_vowel() {
            return Some(j);
        }
        if tokens[j].word_start {
            break;
        }
    }
    None
}
