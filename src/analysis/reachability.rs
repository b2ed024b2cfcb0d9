//! 显式可达图：从初始标识出发的广度优先枚举.
use std::collections::VecDeque;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::Path;

use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::net::ids::TransitionId;
use crate::net::structure::Marking;
use crate::net::Net;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateGraphConfig {
    /// 最多探索的状态数量. None 表示不设上限.
    pub state_limit: Option<usize>,
}

impl Default for StateGraphConfig {
    fn default() -> Self {
        Self {
            state_limit: Some(1_000_000),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StateGraphStats {
    pub state_count: usize,
    pub edge_count: usize,
    pub deadlock_count: usize,
    pub truncated: bool,
}

/// Reachability graph of a net. Nodes are distinct markings, edges carry the
/// fired transition; parallel edges are kept, so every firing that was
/// observed appears exactly once.
#[derive(Debug)]
pub struct StateGraph {
    pub graph: StableGraph<Marking, TransitionId>,
    pub initial: NodeIndex,
    pub markings: FxHashMap<Marking, NodeIndex>,
    /// Set when the state limit stopped exploration; the graph is then a
    /// prefix of the full reachability graph.
    pub truncated: bool,
    pub state_limit: Option<usize>,
}

impl StateGraph {
    pub fn from_net(net: &Net) -> Self {
        Self::with_config(net, &StateGraphConfig::default())
    }

    pub fn with_config(net: &Net, config: &StateGraphConfig) -> Self {
        let mut graph = StableGraph::new();
        let mut markings: FxHashMap<Marking, NodeIndex> = FxHashMap::default();
        let mut queue = VecDeque::new();
        let mut truncated = false;

        let initial_marking = net.initial_marking();
        let initial = graph.add_node(initial_marking.clone());
        markings.insert(initial_marking, initial);
        queue.push_back(initial);

        while let Some(state_index) = queue.pop_front() {
            let current = graph[state_index].clone();

            for transition in net.transitions.indices() {
                let Ok(next) = net.fire(&current, transition) else {
                    continue;
                };
                let target = match markings.entry(next) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        if let Some(limit) = config.state_limit {
                            if graph.node_count() >= limit {
                                truncated = true;
                                continue;
                            }
                        }
                        let index = graph.add_node(entry.key().clone());
                        entry.insert(index);
                        queue.push_back(index);
                        index
                    }
                };
                graph.add_edge(state_index, target, transition);
            }
        }

        if truncated {
            log::warn!(
                "explicit exploration truncated at {} markings",
                graph.node_count()
            );
        } else {
            log::debug!(
                "explicit exploration: {} markings, {} edges",
                graph.node_count(),
                graph.edge_count()
            );
        }

        Self {
            graph,
            initial,
            markings,
            truncated,
            state_limit: config.state_limit,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Markings in discovery (breadth-first) order.
    pub fn markings(&self) -> impl Iterator<Item = &Marking> {
        self.graph.node_indices().map(|index| &self.graph[index])
    }

    /// Every recorded firing `(source, transition, target)`.
    pub fn edges(&self) -> impl Iterator<Item = (&Marking, TransitionId, &Marking)> {
        self.graph.edge_references().map(|edge| {
            (
                &self.graph[edge.source()],
                *edge.weight(),
                &self.graph[edge.target()],
            )
        })
    }

    pub fn contains(&self, marking: &Marking) -> bool {
        self.markings.contains_key(marking)
    }

    pub fn deadlocks(&self, net: &Net) -> Vec<Marking> {
        deadlocks(net, self.markings())
    }

    /// Fails with [`AnalysisError::StateExplosion`] if exploration stopped at
    /// the state limit.
    pub fn ensure_complete(&self) -> Result<(), AnalysisError> {
        match (self.truncated, self.state_limit) {
            (true, Some(limit)) => Err(AnalysisError::StateExplosion {
                explored: self.len(),
                limit,
            }),
            _ => Ok(()),
        }
    }

    pub fn stats(&self, net: &Net) -> StateGraphStats {
        StateGraphStats {
            state_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            deadlock_count: self.deadlocks(net).len(),
            truncated: self.truncated,
        }
    }

    pub fn dot(&self, net: &Net) -> String {
        fn escape(s: &str) -> String {
            s.replace('\\', "\\\\").replace('"', "\\\"")
        }

        let edge_attr = |_, edge: petgraph::stable_graph::EdgeReference<TransitionId>| {
            format!("label=\"{}\"", escape(net.transition_name(*edge.weight())))
        };
        let node_attr = |_, (index, marking): (NodeIndex, &Marking)| {
            let places = net.marking_names(marking).join(", ");
            let shape = if net.is_dead(marking) {
                ", shape=doublecircle"
            } else {
                ""
            };
            format!(
                "label=\"s{}\\n{{{}}}\"{}",
                index.index(),
                escape(&places),
                shape
            )
        };

        format!(
            "{:?}",
            Dot::with_attr_getters(
                &self.graph,
                &[Config::EdgeNoLabel, Config::NodeNoLabel],
                &edge_attr,
                &node_attr
            )
        )
    }

    pub fn write_dot<P: AsRef<Path>>(&self, net: &Net, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.dot(net))
    }
}

/// Keeps the markings under which no transition of `net` is enabled.
pub fn deadlocks<'a, It>(net: &Net, markings: It) -> Vec<Marking>
where
    It: IntoIterator<Item = &'a Marking>,
{
    markings
        .into_iter()
        .filter(|marking| net.is_dead(marking))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::NetBuilder;

    fn build_simple_net() -> Net {
        let mut builder = NetBuilder::new();
        builder.add_place("p1", true).unwrap();
        builder.add_place("p2", false).unwrap();
        builder.add_transition("t1").unwrap();
        builder.add_arc("p1", "t1");
        builder.add_arc("t1", "p2");
        builder.build().unwrap()
    }

    #[test]
    fn state_limit_truncates_graph() {
        let net = build_simple_net();
        let config = StateGraphConfig {
            state_limit: Some(1),
        };
        let state_graph = StateGraph::with_config(&net, &config);

        assert!(state_graph.truncated);
        assert_eq!(state_graph.len(), 1);
        assert_eq!(
            state_graph.ensure_complete(),
            Err(AnalysisError::StateExplosion {
                explored: 1,
                limit: 1
            })
        );
    }

    #[test]
    fn zero_limit_still_holds_initial_marking() {
        let net = build_simple_net();
        let state_graph = StateGraph::with_config(
            &net,
            &StateGraphConfig {
                state_limit: Some(0),
            },
        );

        assert!(state_graph.truncated);
        assert!(state_graph.contains(&net.initial_marking()));
        assert_eq!(
            state_graph.ensure_complete(),
            Err(AnalysisError::StateExplosion {
                explored: 1,
                limit: 0
            })
        );
    }

    #[test]
    fn parallel_firings_are_all_recorded() {
        let mut builder = NetBuilder::new();
        builder.add_place("a", true).unwrap();
        builder.add_place("b", false).unwrap();
        for name in ["t1", "t2"] {
            builder.add_transition(name).unwrap();
            builder.add_arc("a", name);
            builder.add_arc(name, "b");
        }
        let net = builder.build().unwrap();
        let state_graph = StateGraph::from_net(&net);

        assert_eq!(state_graph.len(), 2);
        assert_eq!(state_graph.edges().count(), 2);
        assert!(!state_graph.truncated);
    }

    #[test]
    fn dot_marks_dead_states() {
        let net = build_simple_net();
        let dot = StateGraph::from_net(&net).dot(&net);
        assert!(dot.contains("doublecircle"));
        assert!(dot.contains("label=\"t1\""));
    }
}
