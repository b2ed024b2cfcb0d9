//! 网构造与一致性检查.
//!
//! The loader hands node and arc identifiers to a [`NetBuilder`]; `build`
//! resolves every arc against the declared places and transitions and rejects
//! inconsistent descriptions, so the analyses can assume a well-formed net.
use indexmap::IndexMap;
use thiserror::Error;

use crate::net::core::Net;
use crate::net::ids::{NodeId, PlaceId, TransitionId};
use crate::net::index_vec::IndexVec;
use crate::net::structure::{Arc, Place, Transition};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("duplicate node identifier `{0}`")]
    DuplicateNode(String),
    #[error("arc ({from} -> {to}) has unknown source node `{from}`")]
    UnknownSource { from: String, to: String },
    #[error("arc ({from} -> {to}) has unknown target node `{to}`")]
    UnknownTarget { from: String, to: String },
    #[error("arc ({from} -> {to}) connects two places")]
    PlaceToPlace { from: String, to: String },
    #[error("arc ({from} -> {to}) connects two transitions")]
    TransitionToTransition { from: String, to: String },
}

#[derive(Debug, Default)]
pub struct NetBuilder {
    places: IndexVec<PlaceId, Place>,
    transitions: IndexVec<TransitionId, Transition>,
    nodes: IndexMap<String, NodeId>,
    arcs: Vec<(String, String)>,
}

impl NetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_place(&mut self, name: &str, marked: bool) -> Result<PlaceId, ModelError> {
        self.reserve(name)?;
        let id = self.places.push(Place::new(name, marked));
        self.nodes.insert(name.to_string(), NodeId::Place(id));
        Ok(id)
    }

    pub fn add_transition(&mut self, name: &str) -> Result<TransitionId, ModelError> {
        self.reserve(name)?;
        let id = self.transitions.push(Transition::new(name));
        self.nodes.insert(name.to_string(), NodeId::Transition(id));
        Ok(id)
    }

    /// Records an arc; endpoints are resolved in [`NetBuilder::build`], so
    /// arcs may be declared before their nodes.
    pub fn add_arc(&mut self, from: &str, to: &str) {
        self.arcs.push((from.to_string(), to.to_string()));
    }

    fn reserve(&self, name: &str) -> Result<(), ModelError> {
        if self.nodes.contains_key(name) {
            return Err(ModelError::DuplicateNode(name.to_string()));
        }
        Ok(())
    }

    pub fn build(mut self) -> Result<Net, ModelError> {
        let mut arcs = Vec::with_capacity(self.arcs.len());
        for (from, to) in std::mem::take(&mut self.arcs) {
            let source = self.nodes.get(&from).copied();
            let target = self.nodes.get(&to).copied();
            let (source, target) = match (source, target) {
                (None, _) => return Err(ModelError::UnknownSource { from, to }),
                (_, None) => return Err(ModelError::UnknownTarget { from, to }),
                (Some(s), Some(t)) => (s, t),
            };

            match (source, target) {
                (NodeId::Place(place), NodeId::Transition(transition)) => {
                    push_unique(&mut self.places[place].outputs, transition);
                    if !self.transitions[transition].preset.contains(&place) {
                        self.transitions[transition].preset.push(place);
                    }
                }
                (NodeId::Transition(transition), NodeId::Place(place)) => {
                    push_unique(&mut self.places[place].inputs, transition);
                    if !self.transitions[transition].postset.contains(&place) {
                        self.transitions[transition].postset.push(place);
                    }
                }
                (NodeId::Place(_), NodeId::Place(_)) => {
                    return Err(ModelError::PlaceToPlace { from, to });
                }
                (NodeId::Transition(_), NodeId::Transition(_)) => {
                    return Err(ModelError::TransitionToTransition { from, to });
                }
            }
            arcs.push(Arc { source, target });
        }

        for transition in self.transitions.iter().filter(|t| t.is_source()) {
            log::warn!(
                "transition `{}` has an empty preset and is enabled under every marking",
                transition.name
            );
        }

        let net = Net::from_parts(self.places, self.transitions, arcs);
        log::debug!(
            "net built: {} places, {} transitions, {} arcs",
            net.places_len(),
            net.transitions_len(),
            net.arcs.len()
        );
        Ok(net)
    }
}

fn push_unique(list: &mut Vec<TransitionId>, transition: TransitionId) {
    if !list.contains(&transition) {
        list.push(transition);
    }
}
