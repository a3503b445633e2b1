mod app;
mod body;
pub mod components;
pub(crate) mod key_handler;
mod layout;
mod shutdown;
mod theme;

pub use app::{App, Chrome, SPINNER_FRAMES};
pub use body::Body;
pub use layout::{Layout, LayoutAreas};
pub use shutdown::ShutdownSignal;
pub use theme::Theme;
