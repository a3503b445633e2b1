//! Terminal dashboard for Claude OAuth usage quotas.
//!
//! The polling, parsing and configuration logic lives in `quotawatch-core`;
//! this crate owns startup wiring and the ratatui front end.

pub mod startup;
pub mod ui;
