//! Caps each formant field's Hz/ms rate of change across a boundary by extending `cur.fade_ms`.

use crate::common::get_field;
use crate::context::{PassContext, PassError};
use crate::field::FieldId;
use crate::token::Token;

const MAX_FADE_RATIO: f64 = 0.40;
const DUR_FLOOR_BASE_MS: f64 = 40.0;

const TRACKED_FIELDS: [FieldId; 12] = [
    FieldId::Cf1,
    FieldId::Cf2,
    FieldId::Cf3,
    FieldId::Pf1,
    FieldId::Pf2,
    FieldId::Pf3,
    FieldId::Cb1,
    FieldId::Cb2,
    FieldId::Cb3,
    FieldId::Pb1,
    FieldId::Pb2,
    FieldId::Pb3,
];

fn field_name(id: FieldId) -> &'static str {
    match id {
        FieldId::Cf1 => "cf1",
        FieldId::Cf2 => "cf2",
        FieldId::Cf3 => "cf3",
        FieldId::Pf1 => "pf1",
        FieldId::Pf2 => "pf2",
        FieldId::Pf3 => "pf3",
        FieldId::Cb1 => "cb1",
        FieldId::Cb2 => "cb2",
        FieldId::Cb3 => "cb3",
        FieldId::Pb1 => "pb1",
        FieldId::Pb2 => "pb2",
        FieldId::Pb3 => "pb3",
        _ => "",
    }
}

/// `{cf1,pf1,cb1,pb1} -> 1`, `{cf2,pf2,cb2,pb2} -> 2`, `{cf3,pf3,cb3,pb3} -> 3`, else 0.
fn trans_scale_group(id: FieldId) -> u8 {
    match id {
        FieldId::Cf1 | FieldId::Pf1 | FieldId::Cb1 | FieldId::Pb1 => 1,
        FieldId::Cf2 | FieldId::Pf2 | FieldId::Cb2 | FieldId::Pb2 => 2,
        FieldId::Cf3 | FieldId::Pf3 | FieldId::Cb3 | FieldId::Pb3 => 3,
        _ => 0,
    }
}

fn effective_scale(s: f64) -> f64 {
    if s > 0.001 {
        s
    } else {
        1.0
    }
}

pub fn run(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PassError> {
    let lang = ctx.pack.lang.clone();
    let speed = ctx.speed;

    for i in 0..tokens.len() {
        if tokens[i].is_silence_or_missing() {
            continue;
        }
        let Some(prev_idx) = i.checked_sub(1).filter(|&p| !tokens[p].is_silence_or_missing()) else { continue };
        if tokens[i].is_nasal() || tokens[i].is_semivowel() || tokens[prev_idx].is_nasal() || tokens[prev_idx].is_semivowel() {
            continue;
        }
        let liquid_involved = tokens[i].is_liquid() || tokens[prev_idx].is_liquid();

        let mut needed_fade = tokens[i].fade_ms;
        for id in TRACKED_FIELDS {
            let cur_val = get_field(&tokens[i], id);
            let prev_val = get_field(&tokens[prev_idx], id);
            if cur_val <= 0.0 || prev_val <= 0.0 {
                continue;
            }
            let delta = (cur_val - prev_val).abs();
            if delta <= 0.0 {
                continue;
            }
            let group = trans_scale_group(id);
            let trans_scale = effective_scale(match group {
                1 => tokens[i].trans_f1_scale,
                2 => tokens[i].trans_f2_scale,
                3 => tokens[i].trans_f3_scale,
                _ => 1.0,
            });
            let effective_fade = tokens[i].fade_ms * trans_scale;
            if effective_fade <= 0.0 {
                continue;
            }
            let current_rate = delta / effective_fade;
            let mut max_rate = *lang.max_hz_per_ms.get(field_name(id)).unwrap_or(&f64::INFINITY);
            if liquid_involved {
                max_rate *= lang.liquid_rate_scale.max(0.0001);
            }
            if max_rate <= 0.0 || current_rate <= max_rate {
                continue;
            }
            let required_raw = (delta / max_rate) / trans_scale;
            needed_fade = needed_fade.max(required_raw);
        }

        let window = lang.trajectory_window_ms / speed;
        let dur_floor = DUR_FLOOR_BASE_MS / speed;
        let max_fade_for_token = tokens[i].duration_ms.max(dur_floor) * MAX_FADE_RATIO;
        let capped = needed_fade.min(window).min(max_fade_for_token);
        if capped > tokens[i].fade_ms {
            tokens[i].fade_ms = capped;
        }
        crate::common::clamp_fade_to_duration(&mut tokens[i]);
    }
    Ok(())
}
