//! Page navigation: the cursor state machine, its async driver and the
//! page-button window.

mod cursor;
mod navigator;
mod window;

pub use cursor::{
    Decision, NavigationTiming, Outcome, PageCursor, Phase, Rejection, DEFAULT_SETTLE_DELAY,
    DEFAULT_SPINNER_DELAY,
};
pub use navigator::{Navigation, Navigator};
pub use window::{page_window, PageBar, PageSlot, WINDOW_SIZE};
