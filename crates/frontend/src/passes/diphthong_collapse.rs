//! Merges adjacent tied vowel pairs into a single glide token carrying end-targets (I5).

use crate::common::get_field;
use crate::context::{PassContext, PassError};
use crate::field::FieldId;
use crate::token::Token;

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let min_duration = ctx.pack.lang.diphthong_min_duration_ms;

    let mut i = 0;
    while i + 1 < tokens.len() {
        let mergeable = tokens[i].tied_to && tokens[i + 1].tied_from && tokens[i].is_vowel() && tokens[i + 1].is_vowel();
        if !mergeable {
            i += 1;
            continue;
        }
        let b = tokens.remove(i + 1);
        let a = &mut tokens[i];

        let summed = a.duration_ms + b.duration_ms;
        a.duration_ms = summed.max(min_duration);
        crate::common::clamp_fade_to_duration(a);

        a.end_cf1 = get_field(&b, FieldId::Cf1);
        a.has_end_cf1 = true;
        a.end_cf2 = get_field(&b, FieldId::Cf2);
        a.has_end_cf2 = true;
        a.end_cf3 = get_field(&b, FieldId::Cf3);
        a.has_end_cf3 = true;
        a.end_pf1 = get_field(&b, FieldId::Pf1);
        a.has_end_pf1 = true;
        a.end_pf2 = get_field(&b, FieldId::Pf2);
        a.has_end_pf2 = true;
        a.end_pf3 = get_field(&b, FieldId::Pf3);
        a.has_end_pf3 = true;

        let b_pitch = get_field(&b, FieldId::VoicePitch);
        if b_pitch > 0.0 {
            crate::common::set_field(a, FieldId::EndVoicePitch, b_pitch);
        }

        a.is_diphthong_glide = true;
        a.tied_to = false;
        a.tied_from = false;
        // Don't advance: the merged token may still be `tiedTo` the next glide (triphthongs).
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
    fn merges_diphthong_pair_with_end_targets() {
        let mut pack = PackSet::default();
        pack.lang.diphthong_min_duration_ms = 80.0;
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');

        let mut a = Token::phoneme(Arc::new(PhonemeDef::new("a", PhonemeFlags::IS_VOWEL)));
        a.tied_to = true;
        a.duration_ms = 60.0;
        a.fields.set(FieldId::Cf1, 700.0);
        a.fields.set(FieldId::Cf2, 1200.0);

        let mut i = Token::phoneme(Arc::new(PhonemeDef::new("ɪ", PhonemeFlags::IS_VOWEL)));
        i.tied_from = true;
        i.duration_ms = 40.0;
        i.fields.set(FieldId::Cf1, 350.0);
        i.fields.set(FieldId::Cf2, 2200.0);

        let mut tokens = vec![a, i];
        run(&mut ctx, &mut tokens).unwrap();

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].duration_ms, 100.0);
        assert_eq!(get_field(&tokens[0], FieldId::Cf1), 700.0);
        assert_eq!(tokens[0].end_cf1, 350.0);
        assert_eq!(get_field(&tokens[0], FieldId::Cf2), 1200.0);
        assert_eq!(tokens[0].end_cf2, 2200.0);
        assert!(tokens[0].is_diphthong_glide);
        assert!(!tokens[0].tied_to && !tokens[0].tied_from);
    }
}
