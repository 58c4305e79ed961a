//! Splits a sufficiently long `/l/` into an onglide piece (original prosody, original fade) and a
//! body piece (micro-fade, prosody cleared), nudging the onglide's F1/F2 toward the lateral.

use crate::common::{get_field, set_field};
use crate::context::{PassContext, PassError};
use crate::field::FieldId;
use crate::token::{Stress, Token};

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let pct = ctx.pack.lang.liquid_dynamics_lateral_onglide_duration_pct;
    if pct <= 0.0 {
        return Ok(());
    }
    let speed = ctx.speed;
    let f1_delta = ctx.pack.lang.liquid_dynamics_f1_delta;
    let f2_delta = ctx.pack.lang.liquid_dynamics_f2_delta;

    let mut out = Vec::with_capacity(tokens.len() + 4);
    for tok in tokens.drain(..) {
        let is_lateral = matches!(tok.key(), Some("l") | Some("ɫ"));
        if !is_lateral || tok.duration_ms < 8.0 {
            out.push(tok);
            continue;
        }

        let dur = tok.duration_ms;
        let pct = pct.clamp(0.0, 1.0);
        let mut dur_a = (dur * pct).clamp(4.0, dur - 4.0);
        if !dur_a.is_finite() {
            dur_a = dur / 2.0;
        }
        let dur_b = dur - dur_a;

        let mut piece_a = tok.clone();
        piece_a.duration_ms = dur_a;
        for (id, delta) in [(FieldId::Cf1, f1_delta), (FieldId::Pf1, f1_delta), (FieldId::Cf2, f2_delta), (FieldId::Pf2, f2_delta)] {
            let cur = get_field(&piece_a, id);
            if cur > 0.0 {
                set_field(&mut piece_a, id, (cur + delta).max(0.0));
            }
        }

        let mut piece_b = tok;
        piece_b.duration_ms = dur_b;
        piece_b.fade_ms = (1.0_f64).max(2.0 / speed);
        piece_b.word_start = false;
        piece_b.syllable_start = false;
        piece_b.stress = Stress::None;
        piece_b.tone = String::new();
        piece_b.lengthened = false;
        piece_b.tied_to = false;
        piece_b.tied_from = false;
        crate::common::clamp_fade_to_duration(&mut piece_a);
        crate::common::clamp_fade_to_duration(&mut piece_b);

        out.push(piece_a);
        out.push(piece_b);
    }
    *tokens = out;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackSet;
    use crate::phoneme::{PhonemeDef, PhonemeFlags};
    use std::sync::Arc;

    #[test]
    fn splits_long_lateral_into_onglide_and_body() {
        let mut pack = PackSet::default();
        pack.lang.liquid_dynamics_lateral_onglide_duration_pct = 0.3;
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');

        let mut l = Token::phoneme(Arc::new(PhonemeDef::new("l", PhonemeFlags::IS_LIQUID)));
        l.duration_ms = 40.0;
        l.word_start = true;
        l.stress = Stress::Primary;
        let mut tokens = vec![l];

        run(&mut ctx, &mut tokens).unwrap();
        assert_eq!(tokens.len(), 2);
        assert!((tokens[0].duration_ms - 12.0).abs() < 1e-9);
        assert!((tokens[1].duration_ms - 28.0).abs() < 1e-9);
        assert!(tokens[0].word_start);
        assert!(!tokens[1].word_start);
        assert_eq!(tokens[1].stress, Stress::None);
    }

    #[test]
    fn short_lateral_is_untouched() {
        let mut pack = PackSet::default();
        pack.lang.liquid_dynamics_lateral_onglide_duration_pct = 0.3;
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');
        let mut l = Token::phoneme(Arc::new(PhonemeDef::new("l", PhonemeFlags::IS_LIQUID)));
        l.duration_ms = 5.0;
        let mut tokens = vec![l];
        run(&mut ctx, &mut tokens).unwrap();
        assert_eq!(tokens.len(), 1);
    }
}
