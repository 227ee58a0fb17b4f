//! Mason Layout - packing core for masonry grids.
//!
//! This crate contains everything about a masonry layout that does not need
//! an async runtime:
//! - Measurement cache (item identity -> measured extent)
//! - Row packer (greedy width-constrained flow)
//! - Column packer (arrival-order height balancing)
//! - Layout requests and the diff policy that classifies re-renders
//! - Grid configuration loading
//!
//! # Usage
//!
//! ```ignore
//! use mason_layout::{CancelToken, LayoutRequest, MeasureCache};
//!
//! let cache = MeasureCache::shared();
//! let request = LayoutRequest::rows(vec!["a", "b", "c"], measure)
//!     .item_spacing(8.0)
//!     .constraint(120.0);
//!
//! let result = request.pack(&cache, &CancelToken::new())?;
//! ```

pub mod cache;
pub mod cancel;
pub mod config;
pub mod item;
pub mod pack;
pub mod policy;
pub mod request;

mod error;

pub use cache::{MeasureCache, SharedCache, lock_cache};
pub use cancel::{CancelToken, Cancelled};
pub use config::GridConfig;
pub use error::LayoutError;
pub use item::{ItemKey, Measure};
pub use pack::{Column, ColumnParams, LayoutResult, Row, RowItem, RowParams, pack_columns, pack_rows};
pub use policy::{RequestDiff, TrackingMode, UpdateMode, classify};
pub use request::{Arrangement, LayoutRequest};
