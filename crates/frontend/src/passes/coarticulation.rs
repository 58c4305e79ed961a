//! Locus-based coarticulation: nudges a flanking consonant's `cf2`/`pf2` toward a per-place
//! target Hz value, the same pull-toward-target shape `allophones` uses for `/l/` darkness.

use crate::common::{get_field, has_field, place_of, set_field, Place};
use crate::context::{PassContext, PassError};
use crate::field::FieldId;
use crate::token::Token;

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    if !ctx.pack.lang.coarticulation_enabled {
        return Ok(());
    }
    let fraction = ctx.pack.lang.coarticulation_fraction;
    if fraction <= 0.0 {
        return Ok(());
    }
    let loci = &ctx.pack.lang.coarticulation_loci;

    for i in 0..tokens.len() {
        if tokens[i].is_silence_or_missing() || tokens[i].is_vowel() {
            continue;
        }
        let key = match tokens[i].key() {
            Some(k) => k,
            None => continue,
        };
        let adjacent_vowel = tokens
            .get(i + 1)
            .map(|t| !t.is_silence_or_missing() && t.is_vowel())
            .unwrap_or(false)
            || i.checked_sub(1).is_some_and(|p| !tokens[p].is_silence_or_missing() && tokens[p].is_vowel());
        if !adjacent_vowel {
            continue;
        }
        let place = place_of(key);
        let place_name = match place {
            Place::Labial => "labial",
            Place::Alveolar => "alveolar",
            Place::Palatal => "palatal",
            Place::Velar => "velar",
            Place::Unknown => continue,
        };
        let locus = match loci.get(place_name) {
            Some(hz) => *hz,
            None => continue,
        };
        for id in [FieldId::Cf2, FieldId::Pf2] {
            if has_field(&tokens[i], id) {
                let cur = get_field(&tokens[i], id);
                let new = cur + (locus - cur) * fraction;
                set_field(&mut tokens[i], id, new);
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
    fn pulls_consonant_f2_toward_place_locus() {
        let mut pack = PackSet::default();
        pack.lang.coarticulation_enabled = true;
        pack.lang.coarticulation_fraction = 0.5;
        pack.lang.coarticulation_loci.insert("velar".to_string(), 2000.0);
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');

        let mut k = Token::phoneme(Arc::new(PhonemeDef::new("k", PhonemeFlags::IS_STOP)));
        k.fields.set(FieldId::Cf2, 1000.0);
        let a = Token::phoneme(Arc::new(PhonemeDef::new("a", PhonemeFlags::IS_VOWEL)));
        let mut tokens = vec![k, a];

        run(&mut ctx, &mut tokens).unwrap();
        assert_eq!(get_field(&tokens[0], FieldId::Cf2), 1500.0);
    }
}
