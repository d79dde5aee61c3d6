//! Header search widget for the directory browser.
//!
//! As the user types, the widget queries organizations, investors and people
//! concurrently, debounces network calls, drops results from superseded
//! queries and closes (clearing its state) on outside interaction.

pub mod binder;
pub mod model;
pub mod orchestrator;
pub mod views;
pub mod widget;

pub use binder::{Bounds, Key, Navigator, Point, RouteHistory};
pub use model::{AggregatedResultSet, RawPayloads, WidgetState, normalize};
pub use orchestrator::{DispatchOutcome, FetchOrchestrator, SequenceToken};
pub use views::{DropdownView, render};
pub use widget::{Applied, SearchWidget, WidgetEvent};
