//! 基于 ILP 的死锁检测.
//!
//! Given a finite candidate set of reachable markings, the detector searches
//! for one candidate under which every transition is disabled:
//!
//! * one binary `M_p` per place and one binary selector `y_i` per candidate;
//! * `Σ_i y_i = 1`;
//! * `M_p = Σ_i y_i · candidate_i[p]` for every place;
//! * `Σ_{p ∈ •t} M_p ≤ |•t| - 1` for every transition.
//!
//! A net with a source transition (empty preset) has no dead marking at all,
//! so the solver is not consulted for it.
use std::fmt;

use crate::lp::{
    ConstraintSense, LinearExpression, LpModel, LpSolver, OptimizationSense, SolveOutcome,
    VariableId,
};
use crate::net::ids::PlaceId;
use crate::net::index_vec::IndexVec;
use crate::net::structure::Marking;
use crate::net::Net;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadlockOutcome {
    Found(Marking),
    NoDeadlock,
    /// The solver stopped without proving either answer.
    Inconclusive(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlockResult {
    pub outcome: DeadlockOutcome,
    pub candidates: usize,
    pub solver_invoked: bool,
}

impl DeadlockResult {
    pub fn found(&self) -> bool {
        matches!(self.outcome, DeadlockOutcome::Found(_))
    }

    pub fn witness(&self) -> Option<&Marking> {
        match &self.outcome {
            DeadlockOutcome::Found(marking) => Some(marking),
            _ => None,
        }
    }

    /// `(found, witness)`; an inconclusive solve reads as `(false, None)`.
    pub fn as_pair(&self) -> (bool, Option<&Marking>) {
        (self.found(), self.witness())
    }
}

impl fmt::Display for DeadlockResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            DeadlockOutcome::Found(marking) => write!(f, "deadlock {:?}", marking),
            DeadlockOutcome::NoDeadlock => write!(f, "no deadlock"),
            DeadlockOutcome::Inconclusive(reason) => write!(f, "inconclusive: {}", reason),
        }
    }
}

pub struct IlpDeadlockDetector<S> {
    solver: S,
}

impl<S: LpSolver> IlpDeadlockDetector<S> {
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    pub fn find_deadlock(&self, net: &Net, candidates: &[Marking]) -> DeadlockResult {
        if net.has_source_transition() {
            log::debug!("source transition present, no marking can be dead");
            return DeadlockResult {
                outcome: DeadlockOutcome::NoDeadlock,
                candidates: candidates.len(),
                solver_invoked: false,
            };
        }

        let (model, marking_vars) = build_model(net, candidates);
        let outcome = match self.solver.solve(&model) {
            SolveOutcome::Optimal(assignment) => DeadlockOutcome::Found(
                marking_vars
                    .iter_enumerated()
                    .filter(|(_, var)| assignment.is_set(**var))
                    .map(|(place, _)| place)
                    .collect(),
            ),
            SolveOutcome::Infeasible => DeadlockOutcome::NoDeadlock,
            SolveOutcome::Inconclusive(reason) => {
                log::warn!("deadlock search inconclusive: {}", reason);
                DeadlockOutcome::Inconclusive(reason)
            }
        };
        DeadlockResult {
            outcome,
            candidates: candidates.len(),
            solver_invoked: true,
        }
    }
}

fn build_model(net: &Net, candidates: &[Marking]) -> (LpModel, IndexVec<PlaceId, VariableId>) {
    let mut model = LpModel::new("deadlock_detection");

    let marking_vars: IndexVec<PlaceId, VariableId> = net
        .places
        .iter()
        .map(|place| model.add_binary(format!("M_{}", place.name)))
        .collect();
    let selectors: Vec<VariableId> = (0..candidates.len())
        .map(|i| model.add_binary(format!("y_{i}")))
        .collect();

    let mut select_one = LinearExpression::new(0.0);
    for &y in &selectors {
        select_one.add_term(1.0, y);
    }
    model.add_constraint("select_exactly_one", select_one, ConstraintSense::Equal, 1.0);

    for (place, &m) in marking_vars.iter_enumerated() {
        let mut link = LinearExpression::from_variable(m);
        for (candidate, &y) in candidates.iter().zip(&selectors) {
            if candidate.contains(place) {
                link.add_term(-1.0, y);
            }
        }
        model.add_constraint(
            format!("link_{}", net.place_name(place)),
            link,
            ConstraintSense::Equal,
            0.0,
        );
    }

    for transition in net.transitions.iter() {
        let mut enabled = LinearExpression::new(0.0);
        for &place in &transition.preset {
            enabled.add_term(1.0, marking_vars[place]);
        }
        model.add_constraint(
            format!("disable_{}", transition.name),
            enabled,
            ConstraintSense::LessEqual,
            transition.preset.len() as f64 - 1.0,
        );
    }

    model.set_objective(LinearExpression::new(0.0), OptimizationSense::Minimize);
    (model, marking_vars)
}
