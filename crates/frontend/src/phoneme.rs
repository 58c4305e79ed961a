//! Immutable phoneme definitions loaded from a [`crate::pack::PackSet`].

use bitflags::bitflags;

use crate::field::FieldTable;

bitflags! {
    /// Phonological class flags for a [`PhonemeDef`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PhonemeFlags: u32 {
        const IS_VOWEL     = 1 << 0;
        const IS_STOP      = 1 << 1;
        const IS_AFFRICATE = 1 << 2;
        const IS_NASAL     = 1 << 3;
        const IS_LIQUID    = 1 << 4;
        const IS_SEMIVOWEL = 1 << 5;
        const IS_VOICED    = 1 << 6;
        const IS_TAP       = 1 << 7;
        const IS_TRILL     = 1 << 8;
    }
}

/// An immutable phoneme descriptor: its IPA key, phonological class, and default field values.
#[derive(Debug, Clone, PartialEq)]
pub struct PhonemeDef {
    pub key: String,
    pub flags: PhonemeFlags,
    pub fields: FieldTable,
}

impl PhonemeDef {
    pub fn new(key: impl Into<String>, flags: PhonemeFlags) -> Self {
        Self {
            key: key.into(),
            flags,
            fields: FieldTable::new(),
        }
    }

    pub fn is_vowel(&self) -> bool {
        self.flags.contains(PhonemeFlags::IS_VOWEL)
    }

    pub fn is_stop_like(&self) -> bool {
        self.flags.intersects(PhonemeFlags::IS_STOP | PhonemeFlags::IS_AFFRICATE)
    }

    pub fn is_nasal(&self) -> bool {
        self.flags.contains(PhonemeFlags::IS_NASAL)
    }

    pub fn is_liquid(&self) -> bool {
        self.flags.contains(PhonemeFlags::IS_LIQUID)
    }

    pub fn is_semivowel(&self) -> bool {
        self.flags.contains(PhonemeFlags::IS_SEMIVOWEL)
    }

    pub fn is_voiced(&self) -> bool {
        self.flags.contains(PhonemeFlags::IS_VOICED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_like_covers_affricates() {
        let stop = PhonemeDef::new("t", PhonemeFlags::IS_STOP);
        let affricate = PhonemeDef::new("tʃ", PhonemeFlags::IS_AFFRICATE);
        let nasal = PhonemeDef::new("n", PhonemeFlags::IS_NASAL);
        assert!(stop.is_stop_like());
        assert!(affricate.is_stop_like());
        assert!(!nasal.is_stop_like());
    }
}
