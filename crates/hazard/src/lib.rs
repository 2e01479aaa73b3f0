pub mod lexicon;
pub mod classifier;
pub mod verdict;

pub use lexicon::{Gate, HazardLexicon, HazardProfile, UnrecognizedPolicy};
pub use classifier::HazardClassifier;
pub use verdict::{Evidence, HazardVerdict};
