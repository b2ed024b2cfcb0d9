//! Reachable sets with an explicit or a symbolic backing.
use biodivine_lib_bdd::Bdd;
use itertools::Itertools;
use num_bigint::BigInt;

use crate::analysis::oracle::ReachabilityCheck;
use crate::analysis::reachability::{self, StateGraph};
use crate::analysis::symbolic::{SymbolicReachability, SymbolicSession};
use crate::error::AnalysisError;
use crate::net::structure::Marking;
use crate::net::Net;

pub enum ReachableSet<'s> {
    /// Sorted, duplicate free.
    Explicit(Vec<Marking>),
    Symbolic {
        session: &'s SymbolicSession<'s>,
        function: Bdd,
        cardinality: BigInt,
    },
}

impl<'s> ReachableSet<'s> {
    pub fn explicit<It: IntoIterator<Item = Marking>>(markings: It) -> Self {
        ReachableSet::Explicit(markings.into_iter().sorted().dedup().collect())
    }

    pub fn from_state_graph(graph: &StateGraph) -> Self {
        Self::explicit(graph.markings().cloned())
    }

    pub fn from_symbolic(session: &'s SymbolicSession<'s>, fixed_point: &SymbolicReachability) -> Self {
        ReachableSet::Symbolic {
            session,
            function: fixed_point.reachable.clone(),
            cardinality: fixed_point.cardinality.clone(),
        }
    }

    pub fn cardinality(&self) -> BigInt {
        match self {
            ReachableSet::Explicit(markings) => BigInt::from(markings.len()),
            ReachableSet::Symbolic { cardinality, .. } => cardinality.clone(),
        }
    }

    pub fn contains(&self, marking: &Marking) -> bool {
        match self {
            ReachableSet::Explicit(markings) => markings.binary_search(marking).is_ok(),
            ReachableSet::Symbolic {
                session, function, ..
            } => !session.encode(marking).and(function).is_false(),
        }
    }

    /// Individual markings, sorted. A symbolic set larger than `ceiling` is
    /// refused rather than enumerated.
    pub fn markings(&self, ceiling: usize) -> Result<Vec<Marking>, AnalysisError> {
        match self {
            ReachableSet::Explicit(markings) => Ok(markings.clone()),
            ReachableSet::Symbolic {
                session, function, ..
            } => session.extract(function, ceiling),
        }
    }

    pub fn deadlocks(&self, net: &Net, ceiling: usize) -> Result<Vec<Marking>, AnalysisError> {
        Ok(reachability::deadlocks(net, self.markings(ceiling)?.iter()))
    }
}

impl ReachabilityCheck for ReachableSet<'_> {
    fn is_reachable(&self, marking: &Marking) -> bool {
        self.contains(marking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::symbolic::SymbolicConfig;
    use crate::net::NetBuilder;

    #[test]
    fn both_backings_describe_the_same_set() {
        let mut builder = NetBuilder::new();
        builder.add_place("p1", true).unwrap();
        builder.add_place("p2", false).unwrap();
        builder.add_transition("t1").unwrap();
        builder.add_arc("p1", "t1");
        builder.add_arc("t1", "p2");
        let net = builder.build().unwrap();

        let explicit = ReachableSet::from_state_graph(&StateGraph::from_net(&net));
        let session = SymbolicSession::new(&net).unwrap();
        let fixed_point = session
            .compute_reachability(&SymbolicConfig::default())
            .unwrap();
        let symbolic = ReachableSet::from_symbolic(&session, &fixed_point);

        assert_eq!(explicit.cardinality(), symbolic.cardinality());
        assert_eq!(explicit.markings(10).unwrap(), symbolic.markings(10).unwrap());
        assert_eq!(
            explicit.deadlocks(&net, 10).unwrap(),
            vec![net.marking_from_names(["p2"]).unwrap()]
        );
        assert!(symbolic.contains(&net.initial_marking()));
    }
}
