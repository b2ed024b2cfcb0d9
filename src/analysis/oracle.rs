//! Membership queries against a symbolic fixed point.
use biodivine_lib_bdd::Bdd;

use crate::analysis::symbolic::{SymbolicReachability, SymbolicSession};
use crate::net::structure::Marking;

/// Decides whether a marking is reachable. Implemented by the symbolic oracle
/// and by explicit reachable sets, so refinement loops can verify candidates
/// against either.
pub trait ReachabilityCheck {
    fn is_reachable(&self, marking: &Marking) -> bool;
}

/// Oracle over the fixed point computed by the same session.
#[derive(Clone, Copy)]
pub struct ReachabilityOracle<'s> {
    session: &'s SymbolicSession<'s>,
    reachable: &'s Bdd,
}

impl<'s> ReachabilityOracle<'s> {
    pub fn new(session: &'s SymbolicSession<'s>, fixed_point: &'s SymbolicReachability) -> Self {
        Self {
            session,
            reachable: &fixed_point.reachable,
        }
    }

    /// Encodes `marking` as a single point and tests `point ∧ R` for
    /// satisfiability.
    pub fn contains(&self, marking: &Marking) -> bool {
        !self.session.encode(marking).and(self.reachable).is_false()
    }
}

impl ReachabilityCheck for ReachabilityOracle<'_> {
    fn is_reachable(&self, marking: &Marking) -> bool {
        self.contains(marking)
    }
}

impl ReachabilityCheck for crate::analysis::reachability::StateGraph {
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
    fn oracle_answers_membership() {
        let mut builder = NetBuilder::new();
        builder.add_place("p1", true).unwrap();
        builder.add_place("p2", false).unwrap();
        builder.add_place("p3", false).unwrap();
        builder.add_transition("t1").unwrap();
        builder.add_arc("p1", "t1");
        builder.add_arc("t1", "p2");
        let net = builder.build().unwrap();

        let session = SymbolicSession::new(&net).unwrap();
        let fixed_point = session
            .compute_reachability(&SymbolicConfig::default())
            .unwrap();
        let oracle = ReachabilityOracle::new(&session, &fixed_point);

        assert!(oracle.contains(&net.marking_from_names(["p1"]).unwrap()));
        assert!(oracle.contains(&net.marking_from_names(["p2"]).unwrap()));
        assert!(!oracle.contains(&net.marking_from_names(["p3"]).unwrap()));
        assert!(!oracle.contains(&net.marking_from_names(["p1", "p2"]).unwrap()));
        assert!(!oracle.is_reachable(&Marking::empty()));
    }
}
