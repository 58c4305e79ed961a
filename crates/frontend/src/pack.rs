//! Loading and holding the phoneme inventory and per-language tunables.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::phoneme::PhonemeDef;

/// One rule for the `special_coartic` pass: a trigger consonant nudges an adjacent vowel's
/// named field by a fixed Hz delta.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SpecialCoarticRule {
    pub trigger: String,
    pub field: String,
    pub delta_hz: f64,
    /// `"before"`, `"after"`, or omitted/empty for "either adjacent vowel".
    #[serde(default)]
    pub direction: String,
}

/// Per-language tunables: enables, scales, thresholds, Hz deltas, ms floors, and a handful of
/// table-shaped lookups (place-indexed and field-indexed) kept as maps rather than exploded into
/// dozens of near-duplicate scalar fields. Every field defaults to its type's zero value so a
/// partial YAML document is always valid.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LanguagePack {
    // --- nasalization ---
    pub nasalization_blend: f64,
    pub nasalization_target_ca_np: f64,

    // --- allophones ---
    pub positional_allophones_enabled: bool,
    pub aspiration_scale_initial_stressed: f64,
    pub aspiration_scale_initial: f64,
    pub aspiration_scale_final: f64,
    pub aspiration_scale_intervocalic: f64,
    pub l_darkness_target_f2: f64,
    pub l_darkness_prevocalic: f64,
    pub l_darkness_postvocalic: f64,
    pub l_darkness_syllabic: f64,
    pub glottal_reinforcement_contexts: Vec<String>,
    pub glottal_reinforcement_base_ms: f64,

    // --- coarticulation / special_coartic / cluster_timing / cluster_blend ---
    pub coarticulation_enabled: bool,
    pub coarticulation_fraction: f64,
    pub coarticulation_loci: HashMap<String, f64>,
    pub special_coartic_rules: Vec<SpecialCoarticRule>,
    pub cluster_timing_scale: f64,
    pub cluster_timing_medial_scale: f64,
    pub cluster_timing_final_scale: f64,
    pub cluster_blend_fraction: f64,

    // --- prominence ---
    pub secondary_level: f64,
    pub long_vowel_mode: String,
    pub long_vowel_level: f64,
    pub word_init_boost: f64,
    pub word_final_reduc: f64,
    pub full_vowel_floor: f64,
    pub primary_stress_weight: f64,
    pub secondary_stress_weight: f64,
    pub primary_floor_ms: f64,
    pub prominent_floor_ms: f64,
    pub reduced_ceiling: f64,
    pub onset_scale: f64,
    pub coda_scale: f64,
    pub open_nucleus_scale: f64,
    pub boost_db: f64,
    pub reduction_db: f64,

    // --- prosody ---
    pub final_syllable_scale: f64,
    pub penultimate_syllable_scale: f64,
    pub question_scale: f64,
    pub statement_scale: f64,
    pub prosody_nucleus_only: bool,

    // --- rate compensation ---
    pub rate_comp_enabled: bool,
    pub word_final_schwa_reduction_enabled: bool,
    pub word_final_schwa_scale: f64,
    pub word_final_schwa_min_ms: f64,
    pub class_floor_vowel_ms: f64,
    pub class_floor_nasal_ms: f64,
    pub class_floor_liquid_ms: f64,
    pub class_floor_semivowel_ms: f64,
    pub class_floor_affricate_ms: f64,
    pub class_floor_stop_ms: f64,
    pub class_floor_tap_ms: f64,
    pub class_floor_trill_ms: f64,
    pub class_floor_fricative_ms: f64,
    pub class_floor_voiced_consonant_ms: f64,
    pub rate_comp_speed_scale: f64,
    pub word_final_bonus_ms: f64,
    pub cluster_max_shift: f64,
    pub rate_comp_schwa_reduction_enabled: bool,
    pub rate_comp_schwa_threshold: f64,
    pub rate_comp_schwa_scale: f64,

    // --- liquid dynamics ---
    pub liquid_dynamics_lateral_onglide_duration_pct: f64,
    pub liquid_dynamics_f1_delta: f64,
    pub liquid_dynamics_f2_delta: f64,

    // --- length contrast ---
    pub short_ceil_ms: f64,
    pub long_floor_ms: f64,
    pub geminate_closure_scale: f64,
    pub geminate_release_scale: f64,
    pub pre_geminate_vowel_scale: f64,
    pub marked_consonant_gap_base_ms: f64,
    pub marked_consonant_gap_fade_ms: f64,

    // --- diphthong collapse ---
    pub diphthong_min_duration_ms: f64,

    // --- boundary smoothing ---
    pub boundary_fade_targets: HashMap<String, f64>,
    pub place_trans_scales: HashMap<String, f64>,
    pub nasal_f1_instant: bool,

    // --- trajectory limit ---
    pub max_hz_per_ms: HashMap<String, f64>,
    pub liquid_rate_scale: f64,
    pub trajectory_window_ms: f64,

    // --- microprosody ---
    pub min_vowel_ms: f64,
    pub voiceless_raise_hz: f64,
    pub voiced_lower_hz: f64,
    pub voiced_fricative_lower_scale: f64,
    pub high_threshold_hz: f64,
    pub high_raise_hz: f64,
    pub low_threshold_hz: f64,
    pub low_drop_hz: f64,
    pub max_total_delta_hz: f64,
    pub pre_voiceless_shorten_scale: f64,
    pub pre_voiceless_min_ms: f64,
    pub voiceless_coda_lengthen_scale: f64,
}

/// The loaded phoneme inventory plus the active language's tunables.
#[derive(Debug, Clone, Default)]
pub struct PackSet {
    pub phonemes: HashMap<String, Arc<PhonemeDef>>,
    pub lang: LanguagePack,
}

/// On-disk/YAML shape; converted into [`PackSet`] after decoding phoneme flags.
#[derive(Debug, Deserialize)]
struct PackFile {
    #[serde(default)]
    phonemes: Vec<PhonemeEntry>,
    #[serde(default)]
    lang: LanguagePack,
}

#[derive(Debug, Deserialize)]
struct PhonemeEntry {
    key: String,
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default)]
    fields: HashMap<String, f64>,
}

#[derive(Debug, Error)]
pub enum PackError {
    #[error("failed to read pack file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse pack YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("pack references unknown phoneme key '{0}'")]
    MissingPhoneme(String),
}

impl PackSet {
    pub fn from_yaml_str(s: &str) -> Result<PackSet, PackError> {
        let file: PackFile = serde_yaml::from_str(s)?;
        let mut phonemes = HashMap::with_capacity(file.phonemes.len());
        for entry in file.phonemes {
            let def = phoneme_entry_to_def(entry);
            phonemes.insert(def.key.clone(), Arc::new(def));
        }
        Ok(PackSet {
            phonemes,
            lang: file.lang,
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<PackSet, PackError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PackError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn phoneme(&self, key: &str) -> Option<&Arc<PhonemeDef>> {
        self.phonemes.get(key)
    }

    pub fn require_phoneme(&self, key: &str) -> Result<&Arc<PhonemeDef>, PackError> {
        self.phoneme(key)
            .ok_or_else(|| PackError::MissingPhoneme(key.to_string()))
    }
}

fn phoneme_entry_to_def(entry: PhonemeEntry) -> PhonemeDef {
    use crate::phoneme::PhonemeFlags;

    let mut flags = PhonemeFlags::empty();
    for f in &entry.flags {
        flags |= match f.as_str() {
            "vowel" => PhonemeFlags::IS_VOWEL,
            "stop" => PhonemeFlags::IS_STOP,
            "affricate" => PhonemeFlags::IS_AFFRICATE,
            "nasal" => PhonemeFlags::IS_NASAL,
            "liquid" => PhonemeFlags::IS_LIQUID,
            "semivowel" => PhonemeFlags::IS_SEMIVOWEL,
            "voiced" => PhonemeFlags::IS_VOICED,
            "tap" => PhonemeFlags::IS_TAP,
            "trill" => PhonemeFlags::IS_TRILL,
            _ => PhonemeFlags::empty(),
        };
    }

    let mut def = PhonemeDef::new(entry.key, flags);
    for (name, value) in entry.fields {
        if let Some(id) = field_id_from_name(&name) {
            def.fields.set(id, value);
        }
    }
    def
}

fn field_id_from_name(name: &str) -> Option<crate::field::FieldId> {
    use crate::field::FieldId::*;
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
        "voice_pitch" => VoicePitch,
        "end_voice_pitch" => EndVoicePitch,
        "voice_amplitude" => VoiceAmplitude,
        "aspiration_amplitude" => AspirationAmplitude,
        "frication_amplitude" => FricationAmplitude,
        "ca_np" => CaNp,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
phonemes:
  - key: a
    flags: [vowel, voiced]
    fields:
      cf1: 700
      cf2: 1200
  - key: t
    flags: [stop]
lang:
  secondary_level: 0.6
  positional_allophones_enabled: true
  special_coartic_rules:
    - trigger: k
      field: cf2
      delta_hz: -150
"#;

    #[test]
    fn parses_phonemes_and_lang_from_yaml() {
        let pack = PackSet::from_yaml_str(SAMPLE).unwrap();
        let a = pack.phoneme("a").unwrap();
        assert!(a.is_vowel());
        assert_eq!(a.fields.raw(crate::field::FieldId::Cf1), 700.0);
        assert_eq!(pack.lang.secondary_level, 0.6);
        assert!(pack.lang.positional_allophones_enabled);
        assert_eq!(pack.lang.special_coartic_rules.len(), 1);
    }

    #[test]
    fn missing_fields_default_to_zero_or_empty() {
        let pack = PackSet::from_yaml_str("phonemes: []\nlang: {}\n").unwrap();
        assert_eq!(pack.lang.secondary_level, 0.0);
        assert!(pack.lang.glottal_reinforcement_contexts.is_empty());
        assert!(!pack.lang.positional_allophones_enabled);
    }

    #[test]
    fn require_phoneme_reports_missing_key() {
        let pack = PackSet::from_yaml_str("phonemes: []\nlang: {}\n").unwrap();
        match pack.require_phoneme("ʔ") {
            Err(PackError::MissingPhoneme(k)) => assert_eq!(k, "ʔ"),
            other => panic!("expected MissingPhoneme, got {other:?}"),
        }
    }
}
