//! A minimal, deterministic token-stream builder from a compact textual notation.
//!
//! Not a production grapheme-to-phoneme engine: it exists so tests and the CLI demo can
//! construct a `Vec<Token>` without a real G2P component. Grammar:
//!
//! - Words are separated by whitespace.
//! - A word's syllables are separated by `.`.
//! - A syllable's segments are separated by `_`, with an optional leading stress digit
//!   (`0`, `1`, `2`) applied to the syllable's first vowel segment.
//! - A segment may itself be a tied pair `a‿ɪ`, producing two tokens with `tied_to`/`tied_from`
//!   set (diphthongs, affricates).
//!
//! Example: `"k_1a‿ɪt"` — word `cat`-shaped nonsense; really `"1k_a‿ɪ.t"`.

use crate::pack::{PackError, PackSet};
use crate::token::{Stress, Token};

pub fn parse(notation: &str, pack: &PackSet) -> Result<Vec<Token>, PackError> {
    let mut tokens = Vec::new();

    for word in notation.split_whitespace() {
        let mut word_start = true;
        for syllable in word.split('.') {
            if syllable.is_empty() {
                continue;
            }
            let (stress, rest) = split_stress(syllable);
            let mut syllable_start = true;
            let mut stress_applied = false;

            for segment in rest.split('_') {
                if segment.is_empty() {
                    continue;
                }
                let parts: Vec<&str> = segment.split('‿').collect();
                for (p_idx, key) in parts.iter().enumerate() {
                    let def = pack.require_phoneme(key)?.clone();
                    let mut tok = Token::phoneme(def);
                    tok.base_char = key.chars().next();
                    tok.word_start = word_start;
                    tok.syllable_start = syllable_start;
                    word_start = false;
                    syllable_start = false;

                    if p_idx == 0 && parts.len() > 1 {
                        tok.tied_to = true;
                    }
                    if p_idx > 0 {
                        tok.tied_from = true;
                    }
                    if !stress_applied && tok.is_vowel() {
                        tok.stress = stress;
                        stress_applied = true;
                    }
                    tokens.push(tok);
                }
            }
        }
    }
    Ok(tokens)
}

fn split_stress(syllable: &str) -> (Stress, &str) {
    match syllable.as_bytes().first() {
        Some(b'1') => (Stress::Primary, &syllable[1..]),
        Some(b'2') => (Stress::Secondary, &syllable[1..]),
        Some(b'0') => (Stress::None, &syllable[1..]),
        _ => (Stress::None, syllable),
    }
}
