//! Assigns per-word, monotone `syllable_index` values (I7).

use crate::context::{PassContext, PassError};
use crate::token::Token;

pub fn run(_ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let mut syllable = 0u32;
    let mut have_started_syllable = false;

    for tok in tokens.iter_mut() {
        if tok.word_start {
            syllable = 0;
            have_started_syllable = false;
        }
        if tok.syllable_start {
            if have_started_syllable {
                syllable += 1;
            }
            have_started_syllable = true;
        }
        tok.syllable_index = syllable;
    }
    Ok(())
}
