//! Observation likelihood: similarity scoring, normalization and the
//! ground-truth field builder.

pub mod builder;
pub mod field;
pub mod normalize;
pub mod observation;
pub mod similarity;

pub use builder::{
    LikelihoodBuilder, LikelihoodConfig, LikelihoodProvider, LikelihoodSource, UniformProvider,
};
pub use field::LikelihoodField;
pub use normalize::Normalization;
pub use observation::Observation;
pub use similarity::Similarity;
