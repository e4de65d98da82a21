//! Element identifiers the host page must provide.

pub const LOADER: &str = "loader";
pub const LOADER_MESSAGE: &str = "loader-message";
pub const CONSOLE: &str = "console";
pub const EDITOR: &str = "editor";
pub const CANVAS: &str = "canvas";
pub const DRAG_TARGET: &str = "drag-target";

pub const TAB_FRAGMENT: &str = "tab-frag";
pub const TAB_VERTEX: &str = "tab-vert";

pub const BUTTON_NEW: &str = "new";
pub const BUTTON_LOGIN: &str = "login";
pub const BUTTON_SAVE: &str = "save";
pub const BUTTON_OPEN: &str = "open";
pub const BUTTON_SCREENSHOT: &str = "screenshot";
pub const BUTTON_RESIZE: &str = "resize";
pub const BUTTON_VIEW: &str = "view";
pub const VIEW_MENU: &str = "view-menu";
