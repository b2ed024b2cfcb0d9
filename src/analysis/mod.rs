pub mod oracle;
pub mod reachability;
pub mod reachable_set;
pub mod symbolic;

pub use oracle::{ReachabilityCheck, ReachabilityOracle};
pub use reachability::{StateGraph, StateGraphConfig};
pub use reachable_set::ReachableSet;
pub use symbolic::{ImageStrategy, SymbolicConfig, SymbolicReachability, SymbolicSession};
