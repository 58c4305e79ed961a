//! Phrase-final lengthening: stretches the last and penultimate syllables, scaled by clause type.

use crate::context::{PassContext, PassError};
use crate::token::Token;

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let lang = &ctx.pack.lang;
    let syllable_starts: Vec<usize> = (0..tokens.len())
        .filter(|&i| tokens[i].syllable_start && !tokens[i].is_silence_or_missing())
        .collect();
    if syllable_starts.is_empty() {
        return Ok(());
    }

    let clause_scale = if ctx.clause_type == '?' { lang.question_scale } else { lang.statement_scale };

    let last_start = *syllable_starts.last().unwrap();
    scale_syllable(tokens, last_start, lang.final_syllable_scale * clause_scale, lang.prosody_nucleus_only);

    if syllable_starts.len() >= 2 {
        let penult_start = syllable_starts[syllable_starts.len() - 2];
        scale_syllable(tokens, penult_start, lang.penultimate_syllable_scale, lang.prosody_nucleus_only);
    }
    Ok(())
}

fn scale_syllable(tokens: &mut [Token], start: usize, scale: f64, nucleus_only: bool) {
    if scale == 1.0 || scale == 0.0 {
        return;
    }
    let end = (start + 1..tokens.len()).find(|&i| tokens[i].syllable_start).unwrap_or(tokens.len());
    if nucleus_only {
        if let Some(v) = (start..end).find(|&i| tokens[i].is_vowel()) {
            tokens[v].duration_ms *= scale;
            crate::common::clamp_fade_to_duration(&mut tokens[v]);
        }
    } else {
        for i in start..end {
            if tokens[i].is_silence_or_missing() {
                continue;
            }
            tokens[i].duration_ms *= scale;
            crate::common::clamp_fade_to_duration(&mut tokens[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackSet;
    use crate::phoneme::{PhonemeDef, PhonemeFlags};
    use std::sync::Arc;

    #[test]
    fn lengthens_final_syllable_by_clause_scale() {
        let mut pack = PackSet::default();
        pack.lang.final_syllable_scale = 1.2;
        pack.lang.question_scale = 1.5;
        pack.lang.statement_scale = 1.0;
        pack.lang.penultimate_syllable_scale = 1.0;
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '?');

        let mut s = Token::phoneme(Arc::new(PhonemeDef::new("s", PhonemeFlags::IS_VOWEL)));
        s.syllable_start = true;
        s.word_start = true;
        s.duration_ms = 100.0;
        let mut tokens = vec![s];

        run(&mut ctx, &mut tokens).unwrap();
        assert!((tokens[0].duration_ms - 180.0).abs() < 1e-9);
    }
}
