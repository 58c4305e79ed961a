//! Tints the second consonant of a cluster's onset formants toward the first, while leaving its
//! own end-targets (`has_end_cf*`) at their canonical value so interpolation ramps in from the
//! blended onset.

use crate::common::{get_field, set_field};
use crate::context::{PassContext, PassError};
use crate::field::FieldId;
use crate::token::Token;

const BLENDABLE: [FieldId; 6] = [
    FieldId::Cf1,
    FieldId::Cf2,
    FieldId::Cf3,
    FieldId::Pf1,
    FieldId::Pf2,
    FieldId::Pf3,
];

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let fraction = ctx.pack.lang.cluster_blend_fraction;
    if fraction <= 0.0 {
        return Ok(());
    }
    let len = tokens.len();
    for i in 1..len {
        let c1_idx = i - 1;
        if tokens[c1_idx].is_silence_or_missing()
            || tokens[i].is_silence_or_missing()
            || tokens[c1_idx].is_vowel()
            || tokens[i].is_vowel()
            || tokens[i].word_start
            || tokens[i].syllable_start
        {
            continue;
        }
        for id in BLENDABLE {
            let c1_val = get_field(&tokens[c1_idx], id);
            if c1_val <= 0.0 {
                continue;
            }
            let c2_val = get_field(&tokens[i], id);
            if c2_val <= 0.0 {
                continue;
            }
            let tinted = c2_val + (c1_val - c2_val) * fraction;
            set_field(&mut tokens[i], id, tinted);
        }
    }
    Ok(())
}
