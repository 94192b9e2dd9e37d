//! Stats module - natural breaks clustering and color classification

mod ckmeans;
mod classifier;

pub use classifier::{
    build_classification, classify_all, ClassRule, Classification, ClassificationSummary, Color,
    NO_DATA_COLOR,
};
#[cfg(test)]
pub use classifier::PALETTE;
