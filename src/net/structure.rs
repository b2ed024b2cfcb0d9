//! 1-安全 P/T 网静态结构元素：库所、迁移、弧与标识.
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::net::ids::{NodeId, PlaceId, TransitionId};

pub type PlaceList = SmallVec<[PlaceId; 4]>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Place {
    pub name: String,
    /// `true` iff the place carries the single token of the initial marking.
    pub marked: bool,
    /// Transitions producing into this place, in arc order.
    pub inputs: Vec<TransitionId>,
    /// Transitions consuming from this place, in arc order.
    pub outputs: Vec<TransitionId>,
}

impl Place {
    pub fn new(name: impl Into<String>, marked: bool) -> Self {
        Self {
            name: name.into(),
            marked,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Transition {
    pub name: String,
    pub preset: PlaceList,
    pub postset: PlaceList,
}

impl Transition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preset: PlaceList::new(),
            postset: PlaceList::new(),
        }
    }

    /// A transition without input places is enabled under every marking.
    pub fn is_source(&self) -> bool {
        self.preset.is_empty()
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("preset", &self.preset)
            .field("postset", &self.postset)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Arc {
    pub source: NodeId,
    pub target: NodeId,
}

impl Arc {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// 1-安全网的标识：当前持有 token 的库所集合.
///
/// The place list is kept sorted and free of duplicates, so equality and
/// hashing are by content and independent of insertion order.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PlaceId>", into = "Vec<PlaceId>")]
pub struct Marking(SmallVec<[PlaceId; 8]>);

impl Marking {
    pub fn empty() -> Self {
        Self(SmallVec::new())
    }

    pub fn from_places<It: IntoIterator<Item = PlaceId>>(places: It) -> Self {
        let mut inner: SmallVec<[PlaceId; 8]> = places.into_iter().collect();
        inner.sort_unstable();
        inner.dedup();
        Self(inner)
    }

    pub fn contains(&self, place: PlaceId) -> bool {
        self.0.binary_search(&place).is_ok()
    }

    pub fn contains_all<'a, It: IntoIterator<Item = &'a PlaceId>>(&self, places: It) -> bool {
        places.into_iter().all(|place| self.contains(*place))
    }

    pub fn iter(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dense 0/1 view over the first `places` place ids.
    pub fn to_bits(&self, places: usize) -> Vec<bool> {
        let mut bits = vec![false; places];
        for place in self.iter() {
            if let Some(slot) = bits.get_mut(place.0 as usize) {
                *slot = true;
            }
        }
        bits
    }
}

impl From<Vec<PlaceId>> for Marking {
    fn from(value: Vec<PlaceId>) -> Self {
        Self::from_places(value)
    }
}

impl From<Marking> for Vec<PlaceId> {
    fn from(value: Marking) -> Self {
        value.0.into_vec()
    }
}

impl FromIterator<PlaceId> for Marking {
    fn from_iter<It: IntoIterator<Item = PlaceId>>(iter: It) -> Self {
        Self::from_places(iter)
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}
