//! Terminal dashboard rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`status`]: Latest replica status fields, lag trend and sparkline
//! - [`log`]: Scrollable log of matches, recoveries and failures
//! - [`common`]: Shared components (header, tabs, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (status/log::render)                 │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//! ```

pub mod common;
pub mod log;
pub mod status;
pub mod theme;

pub use theme::Theme;
