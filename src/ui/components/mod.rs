mod error_box;
mod header;
mod help_popup;
mod status_bar;
mod usage_chart;

pub use error_box::ErrorBox;
pub use header::{Header, HEADER_TITLE, MARK_ART};
pub use help_popup::HelpPopup;
pub use status_bar::{StatusBar, TEXT_STATUS_WAITING};
pub use usage_chart::{bar_cells, BarMetrics, UsageChart};
