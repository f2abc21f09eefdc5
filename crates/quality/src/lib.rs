//! Reply quality scoring for Solace.
//!
//! Five heuristic dimensions, each 0–100, combined as a weighted sum:
//!
//! | dimension | weight |
//! |---|---|
//! | relevance | 0.30 |
//! | professionalism | 0.20 |
//! | emotional appropriateness | 0.20 |
//! | safety | 0.20 |
//! | completeness | 0.10 |
//!
//! All text checks are plain substring matches against [`lexicon`].

pub mod assessor;
pub mod lexicon;

pub use assessor::{is_passing, QualityAssessor, QualityBreakdown};
