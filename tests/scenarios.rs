use pn_reach::analysis::{
    ImageStrategy, ReachabilityOracle, ReachableSet, StateGraph, SymbolicConfig, SymbolicSession,
};
use pn_reach::config::AnalysisConfig;
use pn_reach::detect::IlpDeadlockDetector;
use pn_reach::lp::MicroLpSolver;
use pn_reach::net::io::{NetDescription, from_json_str, from_ron_str};
use pn_reach::net::{Marking, Net, NetBuilder};
use pn_reach::optimize::{Objective, OptimizeConfig, ReachabilityOptimizer};
use pn_reach::pipeline;

fn build(places: &[(&str, bool)], transitions: &[(&str, &[&str], &[&str])]) -> Net {
    let mut builder = NetBuilder::new();
    for &(name, marked) in places {
        builder.add_place(name, marked).unwrap();
    }
    for &(name, preset, postset) in transitions {
        builder.add_transition(name).unwrap();
        for place in preset {
            builder.add_arc(place, name);
        }
        for place in postset {
            builder.add_arc(name, place);
        }
    }
    builder.build().unwrap()
}

fn marking(net: &Net, names: &[&str]) -> Marking {
    net.marking_from_names(names.iter().copied()).unwrap()
}

fn sorted(mut markings: Vec<Marking>) -> Vec<Marking> {
    markings.sort();
    markings
}

fn symbolic_markings(net: &Net, image: ImageStrategy) -> Vec<Marking> {
    let session = SymbolicSession::new(net).unwrap();
    let config = SymbolicConfig {
        image,
        ..SymbolicConfig::default()
    };
    let fixed_point = session.compute_reachability(&config).unwrap();
    ReachableSet::from_symbolic(&session, &fixed_point)
        .markings(config.extraction_ceiling)
        .unwrap()
}

#[test]
fn scenario_a_single_transfer() {
    let net = build(&[("p1", true), ("p2", false)], &[("t1", &["p1"], &["p2"])]);
    let graph = StateGraph::from_net(&net);

    let reachable = sorted(graph.markings().cloned().collect());
    assert_eq!(
        reachable,
        sorted(vec![marking(&net, &["p1"]), marking(&net, &["p2"])])
    );
    assert_eq!(graph.deadlocks(&net), vec![marking(&net, &["p2"])]);
    assert_eq!(symbolic_markings(&net, ImageStrategy::SemiSymbolic), reachable);
}

#[test]
fn scenario_b_source_transition_has_no_deadlock() {
    let net = build(
        &[("p1", true), ("p2", false)],
        &[("t1", &["p1"], &["p2"]), ("gen", &[], &["p1"])],
    );
    let detector = IlpDeadlockDetector::new(MicroLpSolver::default());

    // even a candidate that would be dead without `gen`
    for candidates in [
        vec![],
        vec![Marking::empty()],
        vec![marking(&net, &["p2"]), marking(&net, &["p1"])],
    ] {
        let result = detector.find_deadlock(&net, &candidates);
        assert_eq!(result.as_pair(), (false, None));
        assert!(!result.solver_invoked);
    }
}

#[test]
fn scenario_c_fork_join_agreement() {
    let description: NetDescription =
        from_ron_str(include_str!("../nets/fork_join.ron")).unwrap();
    let net = description.into_net().unwrap();
    let graph = StateGraph::from_net(&net);

    let explicit = sorted(graph.markings().cloned().collect());
    assert_eq!(explicit.len(), 4);
    assert_eq!(graph.deadlocks(&net), vec![marking(&net, &["p4"])]);
    assert_eq!(graph.edges().count(), 4);

    for image in [ImageStrategy::SemiSymbolic, ImageStrategy::Relational] {
        assert_eq!(symbolic_markings(&net, image), explicit);
    }

    let detection = IlpDeadlockDetector::new(MicroLpSolver::default()).find_deadlock(&net, &explicit);
    assert_eq!(detection.witness(), Some(&marking(&net, &["p4"])));
}

#[test]
fn scenario_d_alternation_optimum_is_one() {
    let net = build(
        &[("p1", true), ("p2", false)],
        &[("t12", &["p1"], &["p2"]), ("t21", &["p2"], &["p1"])],
    );
    let session = SymbolicSession::new(&net).unwrap();
    let fixed_point = session
        .compute_reachability(&SymbolicConfig::default())
        .unwrap();
    let oracle = ReachabilityOracle::new(&session, &fixed_point);

    let optimum = ReachabilityOptimizer::new(MicroLpSolver::default(), OptimizeConfig::default())
        .optimize(&net, &Objective::uniform(&net, 1.0), &oracle)
        .unwrap();
    assert_eq!(optimum.value, 1.0);
    assert!(oracle.contains(&optimum.marking));
    assert!(!oracle.contains(&marking(&net, &["p1", "p2"])));
}

#[test]
fn deadlock_detection_is_complete_over_explicit_sets() {
    // every marking of a chain is a candidate; only the tail is dead
    let net = build(
        &[("a", true), ("b", false), ("c", false), ("d", false)],
        &[
            ("ab", &["a"], &["b"]),
            ("bc", &["b"], &["c"]),
            ("cb", &["c"], &["b"]),
            ("ad", &["a"], &["d"]),
        ],
    );
    let graph = StateGraph::from_net(&net);
    let deadlocks = graph.deadlocks(&net);
    assert_eq!(deadlocks, vec![marking(&net, &["d"])]);

    let detector = IlpDeadlockDetector::new(MicroLpSolver::default());
    let candidates: Vec<Marking> = graph.markings().cloned().collect();
    let result = detector.find_deadlock(&net, &candidates);
    let witness = result.witness().unwrap();
    assert!(deadlocks.contains(witness));
    assert!(net.is_dead(witness));
}

#[test]
fn mutex_pipeline_from_json() {
    let description: NetDescription = from_json_str(include_str!("../nets/mutex.json")).unwrap();
    let net = description.into_net().unwrap();
    let report = pipeline::analyze("mutex", &net, &AnalysisConfig::default(), None).report;

    assert_eq!(report.explicit.state_count, 3);
    assert_eq!(report.symbolic.as_ref().map(|s| s.cardinality.as_str()), Some("3"));
    assert!(report.comparison.consistent());
    assert!(!report.deadlock.found);
    assert_eq!(report.optimization.value, Some(12.0));
    assert_eq!(report.optimization.cuts_added, 0);
}
