//! # 1-安全 Petri 网核心定义
//!
//! 设库所集合 `P` 与迁移集合 `T`。标识 `M ⊆ P` 为持有 token 的库所集合：
//!
//! * 迁移 `t` **可激发** 当且仅当 `•t ⊆ M`；
//! * 迁移 **发射** 后 `M' = (M \ •t) ∪ t•`，先移除再添加，
//!   因而同时位于 `•t` 与 `t•` 的库所发射后仍持有 token；
//! * 状态方程使用 `C = Post - Pre`：`M = M0 + C·σ`。
//!
//! ## 示例
//!
//! ```rust
//! use pn_reach::net::*;
//!
//! let mut builder = NetBuilder::new();
//! builder.add_place("p0", true).unwrap();
//! builder.add_place("p1", false).unwrap();
//! let t0 = builder.add_transition("t0").unwrap();
//! builder.add_arc("p0", "t0");
//! builder.add_arc("t0", "p1");
//! let net = builder.build().unwrap();
//!
//! let marking = net.initial_marking();
//! assert_eq!(net.enabled_transitions(&marking), vec![t0]);
//! let next = net.fire(&marking, t0).unwrap();
//! assert_eq!(net.marking_names(&next), vec!["p1"]);
//! ```

pub mod builder;
pub mod core;
pub mod ids;
pub mod incidence;
pub mod index_vec;
pub mod io;
pub mod structure;

pub use builder::{ModelError, NetBuilder};
pub use self::core::{FireError, Net};
pub use ids::{NodeId, PlaceId, TransitionId};
pub use incidence::Incidence;
pub use index_vec::{Idx, IndexVec};
pub use structure::{Arc, Marking, Place, Transition};
