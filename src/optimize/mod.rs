//! 状态方程上的 ILP 优化与可达性精化.
//!
//! Maximizes `Σ c_p · M_p` subject to the state equation `M = M0 + C·σ`
//! with binary `M` and non-negative integer firing counts `σ`. The state
//! equation over-approximates reachability, so every candidate optimum is
//! checked against a [`ReachabilityCheck`]; a spurious candidate `M*` is
//! excluded by the no-good cut
//!
//! ```text
//! Σ_{p : M*_p = 1} (1 - M_p) + Σ_{p : M*_p = 0} M_p ≥ 1
//! ```
//!
//! and the program is solved again.
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::oracle::ReachabilityCheck;
use crate::lp::{
    ConstraintSense, LinearExpression, LpModel, LpSolver, OptimizationSense, SolveOutcome,
    VariableId, VariableType,
};
use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::IndexVec;
use crate::net::structure::Marking;
use crate::net::Net;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeConfig {
    /// Number of no-good cuts the refinement loop may add.
    #[serde(default = "default_max_cuts")]
    pub max_cuts: usize,
}

fn default_max_cuts() -> usize {
    50
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            max_cuts: default_max_cuts(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObjectiveError {
    #[error("objective names unknown place `{0}`")]
    UnknownPlace(String),
    #[error("weight of place `{0}` is not a finite number")]
    NonFiniteWeight(String),
}

/// Linear weight per place.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    weights: IndexVec<PlaceId, f64>,
}

impl Objective {
    pub fn uniform(net: &Net, weight: f64) -> Self {
        Self {
            weights: IndexVec::from_elem_n(weight, net.places_len()),
        }
    }

    /// Weights given by place name; unnamed places weigh 0.
    pub fn from_names<'a, It>(net: &Net, weights: It) -> Result<Self, ObjectiveError>
    where
        It: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut objective = Self::uniform(net, 0.0);
        for (name, weight) in weights {
            let place = net
                .place_id(name)
                .ok_or_else(|| ObjectiveError::UnknownPlace(name.to_string()))?;
            if !weight.is_finite() {
                return Err(ObjectiveError::NonFiniteWeight(name.to_string()));
            }
            objective.weights[place] = weight;
        }
        Ok(objective)
    }

    /// Mutual-exclusion style nets (some place name starting with `c`) favour
    /// critical sections: `c*` weighs 10, `r*` weighs 2, the rest 1. Any other
    /// net gets weight 1 everywhere.
    pub fn default_for(net: &Net) -> Self {
        let mutex_style = net.places.iter().any(|place| place.name.starts_with('c'));
        let weights = net
            .places
            .iter()
            .map(|place| match place.name.chars().next() {
                Some('c') if mutex_style => 10.0,
                Some('r') if mutex_style => 2.0,
                _ => 1.0,
            })
            .collect();
        Self { weights }
    }

    pub fn weight(&self, place: PlaceId) -> f64 {
        self.weights[place]
    }

    pub fn weights(&self) -> &IndexVec<PlaceId, f64> {
        &self.weights
    }

    pub fn value(&self, marking: &Marking) -> f64 {
        marking
            .iter()
            .fold(0.0, |total, place| total + self.weights[place])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Optimum {
    pub marking: Marking,
    pub value: f64,
    /// Number of ILP solves, the last one included.
    pub iterations: usize,
    pub cuts_added: usize,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizationFailure {
    #[error("state equation has no solution")]
    Infeasible,
    #[error("solver inconclusive: {0}")]
    Inconclusive(String),
    #[error("no reachable optimum after {cuts} no-good cuts")]
    RefinementExhausted { cuts: usize },
}

pub type OptimizationResult = Result<Optimum, OptimizationFailure>;

impl fmt::Display for Optimum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} with value {} ({} solves, {} cuts)",
            self.marking, self.value, self.iterations, self.cuts_added
        )
    }
}

/// Binary marking variables and the model they live in.
struct StateEquation {
    model: LpModel,
    marking_vars: IndexVec<PlaceId, VariableId>,
}

impl StateEquation {
    fn new(net: &Net, objective: &Objective) -> Self {
        let mut model = LpModel::new("state_equation");
        let marking_vars: IndexVec<PlaceId, VariableId> = net
            .places
            .iter()
            .map(|place| model.add_binary(format!("M_{}", place.name)))
            .collect();
        let firing_counts: IndexVec<TransitionId, VariableId> = net
            .transitions
            .iter()
            .map(|transition| {
                model.add_variable(
                    format!("sigma_{}", transition.name),
                    VariableType::Integer,
                    0.0,
                    f64::INFINITY,
                )
            })
            .collect();

        // M_p - Σ_t C[p,t]·σ_t = M0_p
        let incidence = net.c_matrix();
        let initial = net.initial_marking();
        for (place, &m) in marking_vars.iter_enumerated() {
            let mut row = LinearExpression::from_variable(m);
            for (transition, &coefficient) in incidence.row(place) {
                row.add_term(-(coefficient as f64), firing_counts[transition]);
            }
            let m0 = if initial.contains(place) { 1.0 } else { 0.0 };
            model.add_constraint(
                format!("state_{}", net.place_name(place)),
                row,
                ConstraintSense::Equal,
                m0,
            );
        }

        let mut goal = LinearExpression::new(0.0);
        for (place, &m) in marking_vars.iter_enumerated() {
            goal.add_term(objective.weight(place), m);
        }
        model.set_objective(goal, OptimizationSense::Maximize);

        Self {
            model,
            marking_vars,
        }
    }

    /// Excludes exactly the 0/1 assignment `marking`, rearranged as
    /// `Σ_{ones} -M_p + Σ_{zeros} M_p ≥ 1 - |ones|`.
    fn add_no_good_cut(&mut self, marking: &Marking, index: usize) {
        let mut cut = LinearExpression::new(0.0);
        for (place, &m) in self.marking_vars.iter_enumerated() {
            let coefficient = if marking.contains(place) { -1.0 } else { 1.0 };
            cut.add_term(coefficient, m);
        }
        self.model.add_constraint(
            format!("no_good_{index}"),
            cut,
            ConstraintSense::GreaterEqual,
            1.0 - marking.len() as f64,
        );
    }
}

pub struct ReachabilityOptimizer<S> {
    solver: S,
    config: OptimizeConfig,
}

impl<S: LpSolver> ReachabilityOptimizer<S> {
    pub fn new(solver: S, config: OptimizeConfig) -> Self {
        Self { solver, config }
    }

    pub fn optimize(
        &self,
        net: &Net,
        objective: &Objective,
        verifier: &dyn ReachabilityCheck,
    ) -> OptimizationResult {
        let mut equation = StateEquation::new(net, objective);
        let mut iterations = 0;
        let mut cuts_added = 0;

        loop {
            iterations += 1;
            let assignment = match self.solver.solve(&equation.model) {
                SolveOutcome::Optimal(assignment) => assignment,
                SolveOutcome::Infeasible => {
                    log::info!("state equation infeasible after {} cuts", cuts_added);
                    return Err(OptimizationFailure::Infeasible);
                }
                SolveOutcome::Inconclusive(reason) => {
                    log::warn!("optimization stopped at solve {}: {}", iterations, reason);
                    return Err(OptimizationFailure::Inconclusive(reason));
                }
            };

            let candidate: Marking = equation
                .marking_vars
                .iter_enumerated()
                .filter(|(_, var)| assignment.is_set(**var))
                .map(|(place, _)| place)
                .collect();

            if verifier.is_reachable(&candidate) {
                let value = objective.value(&candidate);
                log::info!(
                    "reachable optimum {:?} = {} after {} solves",
                    net.marking_names(&candidate),
                    value,
                    iterations
                );
                return Ok(Optimum {
                    marking: candidate,
                    value,
                    iterations,
                    cuts_added,
                });
            }

            if cuts_added >= self.config.max_cuts {
                log::warn!(
                    "refinement exhausted after {} cuts, last candidate {:?}",
                    cuts_added,
                    net.marking_names(&candidate)
                );
                return Err(OptimizationFailure::RefinementExhausted { cuts: cuts_added });
            }
            log::debug!(
                "spurious candidate {:?}, adding cut {}",
                net.marking_names(&candidate),
                cuts_added
            );
            equation.add_no_good_cut(&candidate, cuts_added);
            cuts_added += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::reachability::StateGraph;
    use crate::lp::{Assignment, MicroLpSolver};
    use crate::net::index_vec::Idx;
    use crate::net::NetBuilder;
    use std::cell::RefCell;

    /// p_a is marked, q never is, so `t` can never fire; the state equation
    /// still accepts σ_t = 1 because `q` is both consumed and produced.
    fn guarded_transfer() -> Net {
        let mut builder = NetBuilder::new();
        builder.add_place("p_a", true).unwrap();
        builder.add_place("p_b", false).unwrap();
        builder.add_place("q", false).unwrap();
        builder.add_transition("t").unwrap();
        for (from, to) in [("p_a", "t"), ("q", "t"), ("t", "p_b"), ("t", "q")] {
            builder.add_arc(from, to);
        }
        builder.build().unwrap()
    }

    fn ping_pong() -> Net {
        let mut builder = NetBuilder::new();
        builder.add_place("p1", true).unwrap();
        builder.add_place("p2", false).unwrap();
        for (t, from, to) in [("t12", "p1", "p2"), ("t21", "p2", "p1")] {
            builder.add_transition(t).unwrap();
            builder.add_arc(from, t);
            builder.add_arc(t, to);
        }
        builder.build().unwrap()
    }

    /// Records every model it is handed, then delegates.
    struct Recording<'a> {
        inner: MicroLpSolver,
        models: &'a RefCell<Vec<LpModel>>,
    }

    impl LpSolver for Recording<'_> {
        fn solve(&self, model: &LpModel) -> SolveOutcome {
            self.models.borrow_mut().push(model.clone());
            self.inner.solve(model)
        }
    }

    #[test]
    fn alternating_places_never_both_marked() {
        let net = ping_pong();
        let graph = StateGraph::from_net(&net);
        let optimizer = ReachabilityOptimizer::new(MicroLpSolver::default(), OptimizeConfig::default());
        let optimum = optimizer
            .optimize(&net, &Objective::uniform(&net, 1.0), &graph)
            .unwrap();
        assert_eq!(optimum.value, 1.0);
        assert_eq!(optimum.cuts_added, 0);
        assert!(graph.contains(&optimum.marking));
    }

    #[test]
    fn spurious_candidate_is_cut() {
        let net = guarded_transfer();
        let graph = StateGraph::from_net(&net);
        let objective = Objective::from_names(&net, [("p_b", 1.0)]).unwrap();
        let optimizer = ReachabilityOptimizer::new(MicroLpSolver::default(), OptimizeConfig::default());

        let optimum = optimizer.optimize(&net, &objective, &graph).unwrap();
        assert_eq!(optimum.marking, net.initial_marking());
        assert_eq!(optimum.value, 0.0);
        assert_eq!(optimum.cuts_added, 1);
        assert_eq!(optimum.iterations, 2);
    }

    #[test]
    fn exhausted_budget_is_not_infeasible() {
        let net = guarded_transfer();
        let graph = StateGraph::from_net(&net);
        let objective = Objective::from_names(&net, [("p_b", 1.0)]).unwrap();
        let optimizer = ReachabilityOptimizer::new(MicroLpSolver::default(), OptimizeConfig { max_cuts: 0 });

        assert_eq!(
            optimizer.optimize(&net, &objective, &graph),
            Err(OptimizationFailure::RefinementExhausted { cuts: 0 })
        );
    }

    #[test]
    fn cut_excludes_the_spurious_assignment() {
        let net = guarded_transfer();
        let graph = StateGraph::from_net(&net);
        let objective = Objective::from_names(&net, [("p_b", 1.0)]).unwrap();
        let models = RefCell::new(Vec::new());
        let solver = Recording {
            inner: MicroLpSolver::default(),
            models: &models,
        };
        ReachabilityOptimizer::new(solver, OptimizeConfig::default())
            .optimize(&net, &objective, &graph)
            .unwrap();

        let models = models.borrow();
        let spurious = net.marking_from_names(["p_b"]).unwrap();
        let last = models.last().unwrap();
        let cut = last
            .constraints
            .iter()
            .find(|c| c.name == "no_good_0")
            .unwrap();
        // The spurious point violates the cut, every other point satisfies it.
        let point = |marking: &Marking| {
            let mut values = vec![0.0; last.num_variables()];
            for place in marking.iter() {
                values[place.index()] = 1.0;
            }
            values
        };
        assert!(cut.expr.evaluate(&point(&spurious)) < cut.rhs);
        assert!(cut.expr.evaluate(&point(&net.initial_marking())) >= cut.rhs);
        assert!(cut.expr.evaluate(&point(&Marking::empty())) >= cut.rhs);
    }

    #[test]
    fn inconclusive_solver_is_reported() {
        struct GiveUp;
        impl LpSolver for GiveUp {
            fn solve(&self, _model: &LpModel) -> SolveOutcome {
                SolveOutcome::Inconclusive("time limit".into())
            }
        }
        let net = ping_pong();
        let graph = StateGraph::from_net(&net);
        let result = ReachabilityOptimizer::new(GiveUp, OptimizeConfig::default()).optimize(
            &net,
            &Objective::uniform(&net, 1.0),
            &graph,
        );
        assert_eq!(result, Err(OptimizationFailure::Inconclusive("time limit".into())));
    }

    #[test]
    fn value_is_computed_from_the_marking() {
        struct Fixed(Vec<f64>);
        impl LpSolver for Fixed {
            fn solve(&self, _model: &LpModel) -> SolveOutcome {
                SolveOutcome::Optimal(Assignment::new(self.0.clone(), 99.0))
            }
        }
        let net = ping_pong();
        let graph = StateGraph::from_net(&net);
        let objective = Objective::from_names(&net, [("p1", 3.5), ("p2", 1.0)]).unwrap();
        let optimum = ReachabilityOptimizer::new(Fixed(vec![1.0, 0.0, 0.0, 0.0]), OptimizeConfig::default())
            .optimize(&net, &objective, &graph)
            .unwrap();
        assert_eq!(optimum.value, 3.5);
    }

    #[test]
    fn default_objective_prefers_critical_sections() {
        let mut builder = NetBuilder::new();
        for name in ["c1", "r1", "idle"] {
            builder.add_place(name, false).unwrap();
        }
        let net = builder.build().unwrap();
        let objective = Objective::default_for(&net);
        assert_eq!(objective.weight(net.place_id("c1").unwrap()), 10.0);
        assert_eq!(objective.weight(net.place_id("r1").unwrap()), 2.0);
        assert_eq!(objective.weight(net.place_id("idle").unwrap()), 1.0);

        let plain = ping_pong();
        let empty = Objective::uniform(&plain, 1.0).value(&Marking::empty());
        assert_eq!(empty, 0.0);
        assert!(empty.is_sign_positive());
        assert!(Objective::default_for(&plain).weights().iter().all(|w| *w == 1.0));
        assert_eq!(
            Objective::from_names(&plain, [("nope", 1.0)]),
            Err(ObjectiveError::UnknownPlace("nope".into()))
        );
    }
}
