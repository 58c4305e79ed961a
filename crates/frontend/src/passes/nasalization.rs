//! Anticipatory vowel nasalization before a same-word nasal consonant.

use crate::common::get_field;
use crate::context::{PassContext, PassError};
use crate::field::FieldId;
use crate::token::Token;

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let blend = ctx.pack.lang.nasalization_blend;
    let target = ctx.pack.lang.nasalization_target_ca_np;
    if blend <= 0.0 {
        return Ok(());
    }

    let len = tokens.len();
    for i in 0..len {
        if !tokens[i].is_vowel() {
            continue;
        }
        let next_idx = match tokens[i + 1..].iter().position(|t| !t.is_silence_or_missing()) {
            Some(off) => i + 1 + off,
            None => continue,
        };
        if tokens[next_idx].word_start || !tokens[next_idx].is_nasal() {
            continue;
        }
        let cur = get_field(&tokens[i], FieldId::CaNp);
        let new = cur + (cur.max(target) - cur) * blend;
        crate::common::set_field(&mut tokens[i], FieldId::CaNp, new);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackSet;
    use crate::phoneme::{PhonemeDef, PhonemeFlags};
    use std::sync::Arc;

    fn ctx(blend: f64, target: f64) -> PassContext {
        let mut pack = PackSet::default();
        pack.lang.nasalization_blend = blend;
        pack.lang.nasalization_target_ca_np = target;
        PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.')
    }

    #[test]
    fn nudges_vowel_toward_target_before_nasal() {
        let mut tokens = vec![
            Token::phoneme(Arc::new(PhonemeDef::new("a", PhonemeFlags::IS_VOWEL))),
            Token::phoneme(Arc::new(PhonemeDef::new("n", PhonemeFlags::IS_NASAL))),
        ];
        run(&mut ctx(0.5, 1.0), &mut tokens).unwrap();
        assert_eq!(get_field(&tokens[0], FieldId::CaNp), 0.5);
    }

    #[test]
    fn skips_across_word_boundary() {
        let mut tokens = vec![
            Token::phoneme(Arc::new(PhonemeDef::new("a", PhonemeFlags::IS_VOWEL))),
            Token::phoneme(Arc::new(PhonemeDef::new("n", PhonemeFlags::IS_NASAL))),
        ];
        tokens[1].word_start = true;
        run(&mut ctx(0.5, 1.0), &mut tokens).unwrap();
        assert_eq!(get_field(&tokens[0], FieldId::CaNp), 0.0);
    }
}
