//! Presentational state for the control surface: loader overlay, console,
//! layout, tabs, the view menu, screenshots and the drop target.
pub mod ids;

mod console;
mod dropdown;
mod dropzone;
mod layout;
mod loader;
mod screenshot;

pub use console::{Console, ConsoleLine};
pub use dropdown::{
    DropdownAction, DropdownRow, ToggleKind, ViewDropdown, DEFAULT_RESYNC_DELAY,
    FULLSCREEN_TOGGLE, VIEW_TOGGLES,
};
pub use dropzone::{Disposition, DropZone};
pub use layout::{FocusTracker, Layout, Region, TabBar, FULLSCREEN_CLASS, SPLIT_CLASS};
pub use loader::Loader;
pub use screenshot::{encode_png, screenshot_filename, Screenshot, ScreenshotError};
