//! Trust scoring: weighting configuration and the pure calculator.

pub mod calculator;
pub mod weights;

pub use calculator::{MAX_SCORE, TrustBreakdown, TrustInputs, TrustScore, compute};
pub use weights::TrustWeights;
