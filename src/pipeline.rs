//! One analysis session over a net.
//!
//! Runs the explicit explorer and the symbolic engine side by side, compares
//! them, then hands a candidate set to the ILP deadlock detector and a
//! reachability verifier to the ILP optimizer. Resource ceilings degrade the
//! session (a comparison is skipped, the explicit set stands in for the
//! symbolic one) instead of aborting it.
use std::time::Instant;

use itertools::Itertools;
use num_bigint::BigInt;

use crate::analysis::oracle::{ReachabilityCheck, ReachabilityOracle};
use crate::analysis::reachability::{self, StateGraph};
use crate::analysis::reachable_set::ReachableSet;
use crate::analysis::symbolic::{SymbolicReachability, SymbolicSession};
use crate::config::AnalysisConfig;
use crate::detect::{DeadlockOutcome, IlpDeadlockDetector};
use crate::error::AnalysisError;
use crate::lp::MicroLpSolver;
use crate::net::structure::Marking;
use crate::net::Net;
use crate::optimize::{Objective, OptimizationFailure, ReachabilityOptimizer};
use crate::report::{
    AnalysisReport, Comparison, DeadlockSummary, ExplicitSummary, OptimizationSummary,
    SymbolicSummary,
};

/// Report plus the explicit graph it was computed from.
pub struct Analysis {
    pub report: AnalysisReport,
    pub state_graph: StateGraph,
}

fn names(net: &Net, markings: &[Marking]) -> Vec<Vec<String>> {
    markings.iter().map(|m| net.marking_names(m)).collect()
}

fn sorted<It: IntoIterator<Item = Marking>>(markings: It) -> Vec<Marking> {
    markings.into_iter().sorted().collect()
}

pub fn analyze(
    model: &str,
    net: &Net,
    config: &AnalysisConfig,
    objective: Option<&Objective>,
) -> Analysis {
    let started = Instant::now();

    // explicit
    let explicit_start = Instant::now();
    let state_graph = StateGraph::with_config(net, &config.explicit);
    let explicit_markings = sorted(state_graph.markings().cloned());
    let explicit_deadlocks = sorted(state_graph.deadlocks(net));
    let stats = state_graph.stats(net);
    log::info!("{}: explicit exploration {:?}", model, stats);
    let explicit = ExplicitSummary {
        state_count: stats.state_count,
        edge_count: stats.edge_count,
        deadlocks: names(net, &explicit_deadlocks),
        truncated: stats.truncated,
        analysis_time: explicit_start.elapsed(),
    };
    let explicit_complete = state_graph.ensure_complete();
    if let Err(err) = &explicit_complete {
        log::warn!("{}: {}", model, err);
    }

    // symbolic
    let symbolic_start = Instant::now();
    let symbolic: Result<(SymbolicSession, SymbolicReachability), AnalysisError> =
        SymbolicSession::new(net).and_then(|session| {
            let fixed_point = session.compute_reachability(&config.symbolic)?;
            Ok((session, fixed_point))
        });

    let mut comparison = Comparison::default();
    let mut extracted: Option<Vec<Marking>> = None;
    let (symbolic_summary, symbolic_error) = match &symbolic {
        Ok((session, fixed_point)) => {
            let set = ReachableSet::from_symbolic(session, fixed_point);
            match set.markings(config.symbolic.extraction_ceiling) {
                Ok(markings) => extracted = Some(markings),
                Err(err) => log::info!("{}: {}", model, err),
            }
            let summary = SymbolicSummary {
                image: config.symbolic.image,
                iterations: fixed_point.iterations,
                cardinality: fixed_point.cardinality.to_string(),
                node_count: fixed_point.node_count,
                extracted: extracted.is_some(),
                analysis_time: symbolic_start.elapsed(),
            };
            if explicit_complete.is_ok() {
                comparison.counts_match =
                    Some(fixed_point.cardinality == BigInt::from(explicit_markings.len()));
                if let Some(markings) = &extracted {
                    comparison.sets_match = Some(*markings == explicit_markings);
                    comparison.deadlocks_match = Some(
                        sorted(reachability::deadlocks(net, markings.iter()))
                            == explicit_deadlocks,
                    );
                }
            }
            (Some(summary), None)
        }
        Err(err) => {
            log::warn!("{}: symbolic analysis failed: {}", model, err);
            (None, Some(err.to_string()))
        }
    };
    if !comparison.consistent() {
        log::warn!("{}: explicit and symbolic results disagree: {:?}", model, comparison);
    }

    // deadlock detection
    let (candidate_source, candidates) = match extracted {
        Some(markings) => ("symbolic", markings),
        None => ("explicit", explicit_markings),
    };
    let detector = IlpDeadlockDetector::new(MicroLpSolver::new(config.solver.clone()));
    let detection = detector.find_deadlock(net, &candidates);
    let matches_explicit = match &detection.outcome {
        DeadlockOutcome::Found(witness) => Some(explicit_deadlocks.binary_search(witness).is_ok()),
        DeadlockOutcome::NoDeadlock => Some(explicit_deadlocks.is_empty()),
        DeadlockOutcome::Inconclusive(_) => None,
    };
    log::info!("{}: ILP deadlock detection: {}", model, detection);
    let deadlock = DeadlockSummary {
        candidate_source: candidate_source.to_string(),
        candidates: detection.candidates,
        solver_invoked: detection.solver_invoked,
        found: detection.found(),
        witness: detection.witness().map(|m| net.marking_names(m)),
        inconclusive: match &detection.outcome {
            DeadlockOutcome::Inconclusive(reason) => Some(reason.clone()),
            _ => None,
        },
        matches_explicit,
    };

    // optimization
    let default_objective;
    let objective = match objective {
        Some(objective) => objective,
        None => {
            default_objective = Objective::default_for(net);
            &default_objective
        }
    };
    let oracle;
    let verifier: Option<&dyn ReachabilityCheck> = match (&symbolic, &explicit_complete) {
        (Ok((session, fixed_point)), _) => {
            oracle = ReachabilityOracle::new(session, fixed_point);
            Some(&oracle)
        }
        (Err(_), Ok(())) => {
            log::warn!("{}: verifying optimum candidates against the explicit graph", model);
            Some(&state_graph)
        }
        (Err(_), Err(_)) => None,
    };
    let outcome = match verifier {
        Some(verifier) => ReachabilityOptimizer::new(
            MicroLpSolver::new(config.solver.clone()),
            config.optimize.clone(),
        )
        .optimize(net, objective, verifier),
        None => {
            log::warn!("{}: no complete reachable set, optimization skipped", model);
            Err(OptimizationFailure::Inconclusive(
                "no complete reachable set to verify candidates against".to_string(),
            ))
        }
    };
    let optimization = match outcome {
        Ok(optimum) => OptimizationSummary {
            objective: objective_names(net, objective),
            witness: Some(net.marking_names(&optimum.marking)),
            value: Some(optimum.value),
            iterations: optimum.iterations,
            cuts_added: optimum.cuts_added,
            failure: None,
        },
        Err(failure) => OptimizationSummary {
            objective: objective_names(net, objective),
            witness: None,
            value: None,
            iterations: 0,
            cuts_added: 0,
            failure: Some(failure.to_string()),
        },
    };

    let report = AnalysisReport {
        model: model.to_string(),
        place_count: net.places_len(),
        transition_count: net.transitions_len(),
        arc_count: net.arcs.len(),
        explicit,
        symbolic: symbolic_summary,
        symbolic_error,
        comparison,
        deadlock,
        optimization,
        analysis_time: started.elapsed(),
    };
    Analysis {
        report,
        state_graph,
    }
}

fn objective_names(net: &Net, objective: &Objective) -> Vec<(String, f64)> {
    objective
        .weights()
        .iter_enumerated()
        .map(|(place, weight)| (net.place_name(place).to_string(), *weight))
        .collect()
}
