//! Sift Core Runtime
//!
//! Foundational reactive primitives for the Sift filter engine:
//!
//! - **Signals**: typed, versioned values with subscriber tracking
//! - **Derived values**: lazily recomputed projections of signals
//! - **Effects**: callbacks rerun when the signals they read change
//! - **State**: a signal bound to a shared, single-threaded graph
//!
//! # Example
//!
//! ```rust
//! use sift_core::reactive::ReactiveGraph;
//!
//! let mut graph = ReactiveGraph::new();
//!
//! let count = graph.create_signal(0i32);
//! let doubled = graph.create_derived(move |g| g.get(count).unwrap_or(0) * 2);
//!
//! graph.set(count, 5);
//! assert_eq!(graph.get_derived(doubled), Some(10));
//! ```

pub mod reactive;

pub use reactive::{
    run_deferred, shared_graph, Derived, DerivedId, Effect, EffectId, ReactiveGraph, ReactiveStats,
    SharedGraph, Signal, SignalId, State, SubscriberId,
};
