//! The ordered pass registry and the driver that runs a stage to completion.

use crate::context::{PassContext, PassError, PassStage, PipelineError};
use crate::passes;
use crate::token::Token;

pub type PassFn = fn(&mut PassContext, &mut Vec<Token>) -> Result<(), PassError>;

pub struct PassDesc {
    pub name: &'static str,
    pub stage: PassStage,
    pub run: PassFn,
}

/// Registration order matches the reference pipeline's pass registry, including
/// `diphthong_collapse` immediately before `boundary_smoothing`.
pub static PASSES: &[PassDesc] = &[
    PassDesc { name: "syllable_marking", stage: PassStage::PreTiming, run: passes::syllable_marking::run },
    PassDesc { name: "nasalization", stage: PassStage::PreTiming, run: passes::nasalization::run },
    PassDesc { name: "allophones", stage: PassStage::PreTiming, run: passes::allophones::run },
    PassDesc { name: "coarticulation", stage: PassStage::PostTiming, run: passes::coarticulation::run },
    PassDesc { name: "special_coartic", stage: PassStage::PostTiming, run: passes::special_coartic::run },
    PassDesc { name: "cluster_timing", stage: PassStage::PostTiming, run: passes::cluster_timing::run },
    PassDesc { name: "cluster_blend", stage: PassStage::PostTiming, run: passes::cluster_blend::run },
    PassDesc { name: "prominence", stage: PassStage::PostTiming, run: passes::prominence::run },
    PassDesc { name: "prosody", stage: PassStage::PostTiming, run: passes::prosody::run },
    PassDesc { name: "rate_compensation", stage: PassStage::PostTiming, run: passes::rate_compensation::run },
    PassDesc { name: "liquid_dynamics", stage: PassStage::PostTiming, run: passes::liquid_dynamics::run },
    PassDesc { name: "length_contrast", stage: PassStage::PostTiming, run: passes::length_contrast::run },
    PassDesc { name: "diphthong_collapse", stage: PassStage::PostTiming, run: passes::diphthong_collapse::run },
    PassDesc { name: "boundary_smoothing", stage: PassStage::PostTiming, run: passes::boundary_smoothing::run },
    PassDesc { name: "trajectory_limit", stage: PassStage::PostTiming, run: passes::trajectory_limit::run },
    PassDesc { name: "microprosody", stage: PassStage::PostPitch, run: passes::microprosody::run },
];

/// Run every registered pass of `stage`, in registration order, against `tokens`.
pub fn run_passes(ctx: &mut PassContext, stage: PassStage, tokens: &mut Vec<Token>) -> Result<(), PipelineError> {
    for desc in PASSES.iter().filter(|d| d.stage == stage) {
        log::debug!("running pass '{}'", desc.name);
        (desc.run)(ctx, tokens).map_err(|source| PipelineError { pass: desc.name, source })?;
    }
    Ok(())
}

/// Run all three stages in order: PreTiming, PostTiming, PostPitch.
pub fn run_all(ctx: &mut PassContext, tokens: &mut Vec<Token>) -> Result<(), PipelineError> {
    run_passes(ctx, PassStage::PreTiming, tokens)?;
    run_passes(ctx, PassStage::PostTiming, tokens)?;
    run_passes(ctx, PassStage::PostPitch, tokens)
}
