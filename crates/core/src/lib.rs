//! benchview-core - Controllers and chart derivation for benchview
//!
//! This crate contains WASM-compatible, I/O-free code shared by every host
//! of the dashboard. Controllers are reducers: they take [`Event`]s and
//! return [`Effect`]s for the host to carry out.
//!
//! # Features
//!
//! - Threshold coloring, sorting and navigation for the changes table
//! - Comparison bar charts derived from the results matrix
//! - Timeline charts and miniature grids with URL-synchronized selection

pub mod catalog;
pub mod changes;
pub mod chart;
pub mod comparison;
pub mod config;
pub mod error;
pub mod event;
pub mod notice;
pub mod payload;
pub mod selection;
pub mod timeline;
pub mod url_state;

pub use catalog::Catalog;
pub use changes::{ChangeInteraction, ChangeTableController, ChangeView, Status, TableParser};
pub use chart::ChartConfig;
pub use comparison::{ComparisonController, ComparisonInteraction, ComparisonView, PlotOutcome};
pub use config::{DashboardConfig, Thresholds};
pub use error::{Error, Result};
pub use event::{Controller, ControllerEvent, Effect, Endpoint, Event, Request};
pub use notice::{Notice, NoticeKind};
pub use payload::{ComparisonPayload, TimelinePayload};
pub use selection::{
    BenchmarkChoice, ChangeSelection, ChartType, ComparisonSelection, TimelineSelection, Toggle,
};
pub use timeline::{TimelineContent, TimelineController, TimelineInteraction, TimelineView};
pub use url_state::UrlHistory;
