//! Symbolic reachability over BDD characteristic functions.
//!
//! Every place owns one boolean variable (`true` = token present). A set of
//! markings is the BDD whose satisfying valuations are exactly those markings.
//! The reachable set is the least fixed point
//!
//! ```text
//! R0   = encode(M0)
//! Ri+1 = Ri ∨ ⋁_t image(Ri, t)
//! ```
//!
//! Two image operators are provided. [`ImageStrategy::SemiSymbolic`] restricts
//! the set to the markings enabling `t`, enumerates them, fires each one
//! explicitly and re-encodes the successors. [`ImageStrategy::Relational`]
//! stays symbolic: it quantifies the places touched by `t` out of the enabled
//! subset and conjoins their post-firing values, which is exact for 1-safe
//! firing because `t` never changes a place outside `•t ∪ t•`.
use std::time::{Duration, Instant};

use biodivine_lib_bdd::{Bdd, BddValuation, BddVariable, BddVariableSet};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::IndexVec;
use crate::net::structure::Marking;
use crate::net::Net;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageStrategy {
    #[default]
    SemiSymbolic,
    Relational,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolicConfig {
    pub max_iterations: Option<usize>,
    pub time_budget_ms: Option<u64>,
    /// Largest cardinality for which individual markings are extracted.
    pub extraction_ceiling: usize,
    pub image: ImageStrategy,
}

impl Default for SymbolicConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            time_budget_ms: None,
            extraction_ceiling: 1000,
            image: ImageStrategy::default(),
        }
    }
}

/// Fixed point of one session together with its statistics.
#[derive(Debug, Clone)]
pub struct SymbolicReachability {
    pub reachable: Bdd,
    pub iterations: usize,
    pub cardinality: BigInt,
    pub node_count: usize,
    pub elapsed: Duration,
}

/// One analysis session: owns the variable set every characteristic function
/// of this net is built over. Functions from different sessions must not be
/// mixed.
pub struct SymbolicSession<'n> {
    net: &'n Net,
    variables: BddVariableSet,
    place_vars: IndexVec<PlaceId, BddVariable>,
}

impl<'n> SymbolicSession<'n> {
    pub fn new(net: &'n Net) -> Result<Self, AnalysisError> {
        let count = u16::try_from(net.places_len()).map_err(|_| AnalysisError::TooManyPlaces {
            places: net.places_len(),
        })?;
        let variables = BddVariableSet::new_anonymous(count);
        let place_vars = variables.variables().into_iter().collect();
        log::debug!("symbolic session: {} place variables", count);
        Ok(Self {
            net,
            variables,
            place_vars,
        })
    }

    pub fn net(&self) -> &'n Net {
        self.net
    }

    pub fn variable(&self, place: PlaceId) -> BddVariable {
        self.place_vars[place]
    }

    pub fn empty_set(&self) -> Bdd {
        self.variables.mk_false()
    }

    /// Single-point function of `marking`: one literal per place.
    pub fn encode(&self, marking: &Marking) -> Bdd {
        self.place_vars
            .iter_enumerated()
            .fold(self.variables.mk_true(), |acc, (place, &var)| {
                acc.and(&self.variables.mk_literal(var, marking.contains(place)))
            })
    }

    pub fn decode(&self, valuation: &BddValuation) -> Marking {
        self.place_vars
            .iter_enumerated()
            .filter(|(_, var)| valuation.value(**var))
            .map(|(place, _)| place)
            .collect()
    }

    /// Conjunction of the preset variables of `transition`.
    pub fn enabling_clause(&self, transition: TransitionId) -> Bdd {
        self.net.transitions[transition]
            .preset
            .iter()
            .fold(self.variables.mk_true(), |acc, &place| {
                acc.and(&self.variables.mk_var(self.place_vars[place]))
            })
    }

    pub fn image(&self, set: &Bdd, transition: TransitionId, strategy: ImageStrategy) -> Bdd {
        let enabled = set.and(&self.enabling_clause(transition));
        if enabled.is_false() {
            return self.empty_set();
        }
        match strategy {
            ImageStrategy::SemiSymbolic => self.enumerated_image(&enabled, transition),
            ImageStrategy::Relational => self.relational_image(&enabled, transition),
        }
    }

    fn enumerated_image(&self, enabled: &Bdd, transition: TransitionId) -> Bdd {
        let mut image = self.empty_set();
        for valuation in enabled.sat_valuations() {
            let marking = self.decode(&valuation);
            if let Ok(next) = self.net.fire(&marking, transition) {
                image = image.or(&self.encode(&next));
            }
        }
        image
    }

    fn relational_image(&self, enabled: &Bdd, transition: TransitionId) -> Bdd {
        let t = &self.net.transitions[transition];
        let touched: Vec<BddVariable> = t
            .preset
            .iter()
            .chain(t.postset.iter())
            .map(|&place| self.place_vars[place])
            .collect();
        let mut image = enabled.exists(&touched);
        for &place in t.preset.iter().filter(|p| !t.postset.contains(p)) {
            image = image.and(&self.variables.mk_not_var(self.place_vars[place]));
        }
        for &place in &t.postset {
            image = image.and(&self.variables.mk_var(self.place_vars[place]));
        }
        image
    }

    /// One application of the fixed-point operator.
    pub fn step(&self, reach: &Bdd, strategy: ImageStrategy) -> Bdd {
        self.net
            .transitions
            .indices()
            .fold(reach.clone(), |acc, t| acc.or(&self.image(reach, t, strategy)))
    }

    /// `true` iff both functions denote the same set of markings.
    pub fn same_set(&self, left: &Bdd, right: &Bdd) -> bool {
        left.iff(right).is_true()
    }

    pub fn compute_reachability(
        &self,
        config: &SymbolicConfig,
    ) -> Result<SymbolicReachability, AnalysisError> {
        let start = Instant::now();
        let mut reach = self.encode(&self.net.initial_marking());
        let mut iterations = 0usize;

        loop {
            if let Some(limit) = config.max_iterations {
                if iterations >= limit {
                    return Err(AnalysisError::IterationBudget {
                        iterations,
                        partial: reach.exact_cardinality().to_string(),
                    });
                }
            }
            if let Some(budget_ms) = config.time_budget_ms {
                if start.elapsed() >= Duration::from_millis(budget_ms) {
                    return Err(AnalysisError::TimeBudget {
                        budget_ms,
                        iterations,
                        partial: reach.exact_cardinality().to_string(),
                    });
                }
            }

            iterations += 1;
            let next = self.step(&reach, config.image);
            log::debug!(
                "symbolic iteration {}: {} nodes",
                iterations,
                next.size()
            );
            // step() only ever adds markings, so no new marking means equality.
            let saturated = next.and_not(&reach).is_false();
            reach = next;
            if saturated {
                break;
            }
        }

        let cardinality = reach.exact_cardinality();
        let elapsed = start.elapsed();
        log::info!(
            "symbolic fixed point after {} iterations: {} markings, {} nodes ({:?})",
            iterations,
            cardinality,
            reach.size(),
            elapsed
        );
        Ok(SymbolicReachability {
            node_count: reach.size(),
            reachable: reach,
            iterations,
            cardinality,
            elapsed,
        })
    }

    /// Enumerates `set` when it holds at most `ceiling` markings.
    pub fn extract(&self, set: &Bdd, ceiling: usize) -> Result<Vec<Marking>, AnalysisError> {
        let count = set.exact_cardinality();
        if count > BigInt::from(ceiling) {
            return Err(AnalysisError::ExtractionCeiling {
                count: count.to_string(),
                ceiling,
            });
        }
        let mut markings: Vec<Marking> = set
            .sat_valuations()
            .map(|valuation| self.decode(&valuation))
            .collect();
        markings.sort();
        Ok(markings)
    }
}
