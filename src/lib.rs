//! benchview - Changes tables, comparison charts and timelines for a
//! benchmark results server
//!
//! The controllers live in [`benchview_core`]; this crate runs them against a
//! live server and turns their output into a page.
//!
//! # Features
//!
//! - Async HTTP client for the server's table and JSON endpoints
//! - An event loop that executes controller effects until idle
//! - HTML page generation with Chart.js
//!
//! # Example
//!
//! ```no_run
//! use benchview::{client::ServerClient, session::Session};
//! use benchview_core::{Catalog, DashboardConfig, Event, TimelineController};
//!
//! # async fn run() -> benchview::Result<()> {
//! let config = DashboardConfig::default();
//! let client = ServerClient::new("http://speed.example.org/")?;
//! let controller = TimelineController::with_defaults(config.clone(), Catalog::default());
//!
//! let mut session = Session::new(controller, client, config);
//! let page = session.run(Event::RenderRequested).await;
//! println!("{}", benchview::html::render_page(page)?);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod html;
pub mod session;

pub use client::{Fetcher, ServerClient};
pub use error::{Error, Result};
pub use session::{Page, Session};
