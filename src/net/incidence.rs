//! 库所 × 迁移稠密矩阵，用于状态方程 `M = M0 + C·σ`.
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};

type SmallRow<T> = SmallVec<[T; 8]>;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Incidence<T> {
    rows: IndexVec<PlaceId, SmallRow<T>>,
    cols: usize,
}

impl<T> Incidence<T>
where
    T: Clone,
{
    pub fn new(places: usize, transitions: usize, default: T) -> Self {
        let rows = (0..places)
            .map(|_| SmallRow::from_elem(default.clone(), transitions))
            .collect();
        Self {
            rows,
            cols: transitions,
        }
    }

    pub fn places(&self) -> usize {
        self.rows.len()
    }

    pub fn transitions(&self) -> usize {
        self.cols
    }

    pub fn set(&mut self, place: PlaceId, transition: TransitionId, value: T) {
        self.rows[place][transition.index()] = value;
    }

    pub fn get(&self, place: PlaceId, transition: TransitionId) -> &T {
        &self.rows[place][transition.index()]
    }

    pub fn get_mut(&mut self, place: PlaceId, transition: TransitionId) -> &mut T {
        &mut self.rows[place][transition.index()]
    }

    pub fn rows(&self) -> &IndexVec<PlaceId, SmallRow<T>> {
        &self.rows
    }

    /// Entries of one place row paired with their transition ids.
    pub fn row(&self, place: PlaceId) -> impl Iterator<Item = (TransitionId, &T)> {
        self.rows[place]
            .iter()
            .enumerate()
            .map(|(idx, value)| (TransitionId::from_usize(idx), value))
    }
}

impl<T> fmt::Debug for Incidence<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Incidence")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

impl Incidence<u8> {
    /// Signed effect matrix `Post - Pre`.
    pub fn difference(&self, other: &Self) -> Incidence<i64> {
        debug_assert_eq!(self.places(), other.places());
        debug_assert_eq!(self.transitions(), other.transitions());
        let rows = self
            .rows
            .iter()
            .zip(other.rows.iter())
            .map(|(left, right)| {
                left.iter()
                    .zip(right.iter())
                    .map(|(l, r)| i64::from(*l) - i64::from(*r))
                    .collect::<SmallRow<_>>()
            })
            .collect();
        Incidence {
            rows,
            cols: self.cols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_is_post_minus_pre() {
        let p0 = PlaceId::new(0);
        let p1 = PlaceId::new(1);
        let t0 = TransitionId::new(0);

        let mut pre = Incidence::new(2, 1, 0u8);
        let mut post = Incidence::new(2, 1, 0u8);
        pre.set(p0, t0, 1);
        post.set(p1, t0, 1);

        let c = post.difference(&pre);
        assert_eq!(*c.get(p0, t0), -1);
        assert_eq!(*c.get(p1, t0), 1);
    }

    #[test]
    fn self_loop_cancels_in_effect_matrix() {
        let p0 = PlaceId::new(0);
        let t0 = TransitionId::new(0);

        let mut pre = Incidence::new(1, 1, 0u8);
        let mut post = Incidence::new(1, 1, 0u8);
        pre.set(p0, t0, 1);
        post.set(p0, t0, 1);

        assert_eq!(*post.difference(&pre).get(p0, t0), 0);
    }
}
