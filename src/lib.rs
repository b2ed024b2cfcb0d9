//! Reachability analysis of 1-safe Petri nets: explicit enumeration, BDD
//! fixed points, and ILP-based deadlock detection and optimization.

pub mod analysis;
pub mod config;
pub mod detect;
pub mod error;
pub mod lp;
pub mod net;
pub mod optimize;
pub mod options;
pub mod pipeline;
pub mod report;
