//! Failure kinds of the reachability analyses.
//!
//! Solver outcomes are not errors: infeasible / inconclusive results are
//! closed enums returned by the detector and the optimizer. What remains here
//! are the resource ceilings, which fail closed instead of enumerating further.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("state explosion: {explored} markings explored, ceiling is {limit}")]
    StateExplosion { explored: usize, limit: usize },
    #[error(
        "symbolic fixed point not reached within {iterations} iterations \
         ({partial} markings so far)"
    )]
    IterationBudget { iterations: usize, partial: String },
    #[error(
        "symbolic fixed point exceeded its {budget_ms} ms budget after {iterations} iterations \
         ({partial} markings so far)"
    )]
    TimeBudget {
        budget_ms: u64,
        iterations: usize,
        partial: String,
    },
    #[error("{places} places exceed the BDD variable limit")]
    TooManyPlaces { places: usize },
    #[error("symbolic set holds {count} markings, extraction ceiling is {ceiling}")]
    ExtractionCeiling { count: String, ceiling: usize },
}
