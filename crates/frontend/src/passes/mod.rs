//! One module per registered pass; see [`crate::pipeline::PASSES`] for registration order.

pub mod allophones;
pub mod boundary_smoothing;
pub mod cluster_blend;
pub mod cluster_timing;
pub mod coarticulation;
pub mod diphthong_collapse;
pub mod length_contrast;
pub mod liquid_dynamics;
pub mod microprosody;
pub mod nasalization;
pub mod prominence;
pub mod prosody;
pub mod rate_compensation;
pub mod special_coartic;
pub mod syllable_marking;
pub mod trajectory_limit;
