//! Mason Runtime - incremental re-layout for masonry grids.
//!
//! Builds on `mason-layout` to keep a layout current as the host re-renders:
//! - `Coordinator`: per-data-set state, serves every render synchronously
//! - single-flight, cancellable background re-packs on the blocking pool
//! - `ConstraintObserver`: debounces bursts of container resizes
//!
//! # Usage
//!
//! ```ignore
//! use mason_layout::{LayoutRequest, TrackingMode};
//! use mason_runtime::Coordinator;
//!
//! let mut grid = Coordinator::new(TrackingMode::Background)?;
//! grid.on_result_changed(|reason| tracing::info!(?reason, "re-render"));
//!
//! // Every render
//! let layout = grid.on_render(LayoutRequest::rows(items, measure).constraint(width));
//!
//! // On the owning task, commit background results as they land
//! while let Some(reason) = grid.next_change().await {
//!     render(grid.result());
//! }
//! ```

mod coordinator;
mod error;
mod event;
mod observer;
mod scheduler;

pub use coordinator::Coordinator;
pub use error::RuntimeError;
pub use event::ChangeReason;
pub use observer::{ConstraintObserver, ConstraintSample};
