//! 运行时: 可发生判定与发生语义定义.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::incidence::Incidence;
use crate::net::index_vec::IndexVec;
use crate::net::structure::{Arc, Marking, Place, Transition};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FireError {
    #[error("transition {0:?} is out of bounds")]
    OutOfBounds(TransitionId),
    #[error("transition {0:?} is not enabled under the supplied marking")]
    NotEnabled(TransitionId),
}

/// An immutable, validated 1-safe net.
///
/// Places and transitions live in index arenas; the name tables map the
/// identifiers of the source description onto those indices. A `Net` is only
/// produced by [`crate::net::NetBuilder`], which guarantees that every arc
/// endpoint exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    pub places: IndexVec<PlaceId, Place>,
    pub transitions: IndexVec<TransitionId, Transition>,
    pub arcs: Vec<Arc>,
    place_names: IndexMap<String, PlaceId>,
    transition_names: IndexMap<String, TransitionId>,
}

impl Net {
    pub(crate) fn from_parts(
        places: IndexVec<PlaceId, Place>,
        transitions: IndexVec<TransitionId, Transition>,
        arcs: Vec<Arc>,
    ) -> Self {
        let place_names = places
            .iter_enumerated()
            .map(|(id, place)| (place.name.clone(), id))
            .collect();
        let transition_names = transitions
            .iter_enumerated()
            .map(|(id, transition)| (transition.name.clone(), id))
            .collect();
        Self {
            places,
            transitions,
            arcs,
            place_names,
            transition_names,
        }
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    pub fn place_id(&self, name: &str) -> Option<PlaceId> {
        self.place_names.get(name).copied()
    }

    pub fn transition_id(&self, name: &str) -> Option<TransitionId> {
        self.transition_names.get(name).copied()
    }

    pub fn place_name(&self, place: PlaceId) -> &str {
        &self.places[place].name
    }

    pub fn transition_name(&self, transition: TransitionId) -> &str {
        &self.transitions[transition].name
    }

    pub fn initial_marking(&self) -> Marking {
        self.places
            .iter_enumerated()
            .filter(|(_, place)| place.marked)
            .map(|(id, _)| id)
            .collect()
    }

    /// `true` iff every preset place of `transition` is marked.
    pub fn is_enabled(&self, marking: &Marking, transition: TransitionId) -> bool {
        self.transitions
            .get(transition)
            .is_some_and(|t| marking.contains_all(t.preset.iter()))
    }

    pub fn enabled_transitions(&self, marking: &Marking) -> Vec<TransitionId> {
        self.transitions
            .indices()
            .filter(|&t| self.is_enabled(marking, t))
            .collect()
    }

    /// A marking is dead when no transition at all is enabled.
    pub fn is_dead(&self, marking: &Marking) -> bool {
        self.transitions.indices().all(|t| !self.is_enabled(marking, t))
    }

    /// Fires `transition`: preset tokens are removed first, then postset
    /// tokens are added, so a place in both sets stays marked.
    pub fn fire(&self, marking: &Marking, transition: TransitionId) -> Result<Marking, FireError> {
        let t = self
            .transitions
            .get(transition)
            .ok_or(FireError::OutOfBounds(transition))?;
        if !marking.contains_all(t.preset.iter()) {
            return Err(FireError::NotEnabled(transition));
        }

        let next = marking
            .iter()
            .filter(|place| !t.preset.contains(place))
            .chain(t.postset.iter().copied())
            .collect();
        Ok(next)
    }

    pub fn has_source_transition(&self) -> bool {
        self.transitions.iter().any(Transition::is_source)
    }

    pub fn pre_matrix(&self) -> Incidence<u8> {
        let mut pre = Incidence::new(self.places_len(), self.transitions_len(), 0u8);
        for (tid, transition) in self.transitions.iter_enumerated() {
            for &place in &transition.preset {
                pre.set(place, tid, 1);
            }
        }
        pre
    }

    pub fn post_matrix(&self) -> Incidence<u8> {
        let mut post = Incidence::new(self.places_len(), self.transitions_len(), 0u8);
        for (tid, transition) in self.transitions.iter_enumerated() {
            for &place in &transition.postset {
                post.set(place, tid, 1);
            }
        }
        post
    }

    /// Signed incidence matrix `C = Post - Pre`.
    pub fn c_matrix(&self) -> Incidence<i64> {
        self.post_matrix().difference(&self.pre_matrix())
    }

    /// Place names of `marking`, sorted for stable output.
    pub fn marking_names(&self, marking: &Marking) -> Vec<String> {
        let mut names: Vec<String> = marking
            .iter()
            .map(|place| self.place_name(place).to_string())
            .collect();
        names.sort();
        names
    }

    pub fn marking_from_names<'a, It>(&self, names: It) -> Option<Marking>
    where
        It: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .map(|name| self.place_id(name))
            .collect::<Option<Vec<_>>>()
            .map(Marking::from)
    }
}
