//! Rule-driven, language-specific formant shifts: a trigger consonant nudges an adjacent vowel's
//! named field by a fixed Hz delta.

use crate::common::{get_field, set_field};
use crate::context::{PassContext, PassError};
use crate::field::FieldId;
use crate::token::Token;

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let rules = ctx.pack.lang.special_coartic_rules.clone();
    if rules.is_empty() {
        return Ok(());
    }

    for rule in &rules {
        let field = match field_id_from_name(&rule.field) {
            Some(id) => id,
            None => continue, // ConfigError-class: unknown field name, skip silently
        };
        for i in 0..tokens.len() {
            if tokens[i].key() != Some(rule.trigger.as_str()) {
                continue;
            }
            if rule.direction != "after" {
                if let Some(p) = i.checked_sub(1) {
                    apply_to_vowel(tokens, p, field, rule.delta_hz);
                }
            }
            if rule.direction != "before" {
                apply_to_vowel(tokens, i + 1, field, rule.delta_hz);
            }
        }
    }
    Ok(())
}

fn apply_to_vowel(tokens: &mut [Token], idx: usize, field: FieldId, delta: f64) {
    if let Some(t) = tokens.get_mut(idx) {
        if t.is_vowel() {
            let new = get_field(t, field) + delta;
            set_field(t, field, new);
        }
    }
}

fn field_id_from_name(name: &str) -> Option<FieldId> {
    use FieldId::*;
    Some(match name {
        "cf1" => Cf1,
        "cf2" => Cf2,
        "cf3" => Cf3,
        "pf1" => Pf1,
        "pf2" => Pf2,
        "pf3" => Pf3,
        "cb1" => Cb1,
        "cb2" => Cb2,
        "cb3" => Cb3,
        "pb1" => Pb1,
        "pb2" => Pb2,
        "pb3" => Pb3,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{PackSet, SpecialCoarticRule};
    use crate::phoneme::{PhonemeDef, PhonemeFlags};
    use std::sync::Arc;

    #[test]
    fn applies_rule_to_following_vowel() {
        let mut pack = PackSet::default();
        pack.lang.special_coartic_rules.push(SpecialCoarticRule {
            trigger: "k".to_string(),
            field: "cf2".to_string(),
            delta_hz: -150.0,
            direction: "after".to_string(),
        });
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');

        let k = Token::phoneme(Arc::new(PhonemeDef::new("k", PhonemeFlags::IS_STOP)));
        let mut a = Token::phoneme(Arc::new(PhonemeDef::new("a", PhonemeFlags::IS_VOWEL)));
        a.fields.set(FieldId::Cf2, 1200.0);
        let mut tokens = vec![k, a];

        run(&mut ctx, &mut tokens).unwrap();
        assert_eq!(get_field(&tokens[1], FieldId::Cf2), 1050.0);
    }

    #[test]
    fn unknown_field_name_is_silently_skipped() {
        let mut pack = PackSet::default();
        pack.lang.special_coartic_rules.push(SpecialCoarticRule {
            trigger: "k".to_string(),
            field: "bogus".to_string(),
            delta_hz: -150.0,
            direction: String::new(),
        });
        let mut ctx = PassContext::new(Arc::new(pack), 1.0, 0.0, 0.0, '.');
        let mut tokens = vec![Token::phoneme(Arc::new(PhonemeDef::new("k", PhonemeFlags::IS_STOP)))];
        assert!(run(&mut ctx, &mut tokens).is_ok());
    }
}
