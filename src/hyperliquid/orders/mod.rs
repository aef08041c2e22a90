//! Order lifecycle tracking.
//!
//! This module owns every in-flight order from submission intent through
//! final resolution. The [`ClientOrderTracker`] is the single authority over
//! order state; the connector mutates records only through its operations,
//! and stream handlers reconcile venue notifications against it.
//!
//! # Submodules
//!
//! - `in_flight`: the `InFlightOrder` record, its `OrderState` machine and
//!     the `OrderUpdate`/`TradeUpdate` inputs that drive it.
//! - `tracker`: the concurrent dual-index store with its deterministic
//!     transition policy.
//!

// The `InFlightOrder` record, its state machine and update inputs.
mod in_flight;
pub use in_flight::{InFlightOrder, Liquidity, OrderState, OrderUpdate, TradeUpdate};

// The concurrent dual-index store.
mod tracker;
pub use tracker::{ClientOrderTracker, TradeOutcome, TransitionOutcome};
