//! Shortens consonants in clusters and in word-medial/word-final position, never below the
//! class floor `rate_compensation` enforces later in the stage.

use crate::common::class_floor_ms;
use crate::context::{PassContext, PassError};
use crate::token::Token;

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let lang = &ctx.pack.lang;
    let len = tokens.len();

    for i in 0..len {
        if tokens[i].is_silence_or_missing() || tokens[i].is_vowel() {
            continue;
        }
        let floor = class_floor_ms(lang, &tokens[i]);

        let in_cluster = i
            .checked_sub(1)
            .is_some_and(|p| !tokens[p].is_silence_or_missing() && !tokens[p].is_vowel())
            && !tokens[i].word_start
            && !tokens[i].syllable_start;
        let word_medial = !tokens[i].word_start
            && tokens[i + 1..].iter().find(|t| !t.is_silence_or_missing()).is_some();
        let word_final = crate::common::is_word_final_index(tokens, i);

        let scale = if in_cluster {
            lang.cluster_timing_scale
        } else if word_final {
            lang.cluster_timing_final_scale
        } else if word_medial {
            lang.cluster_timing_medial_scale
        } else {
            1.0
        };
        if scale <= 0.0 || scale >= 1.0 {
            continue;
        }
        let shortened = tokens[i].duration_ms * scale;
        tokens[i].duration_ms = shortened.max(floor);
        crate::common::clamp_fade_to_duration(&mut tokens[i]);
    }
    Ok(())
}
