//! Scheduling primitives for the search widget: the debounce timer and the
//! policy deciding when a text change searches immediately. The widget
//! orchestrates execution; this crate keeps the decision logic testable and
//! self-contained.

pub mod debounce;
pub mod policy;

pub use debounce::Debouncer;
pub use policy::{ChangeContext, TriggerPlan, plan_change};
