//! Two-buffer shader editor surface over a host text widget.
mod includes;
mod surface;
mod widget;

pub use includes::{
    include_completion, parse_manifest, HttpManifest, IncludeCompleter, ManifestError,
    ModuleManifest, INCLUDE_DIRECTIVE,
};
pub use surface::{
    error_line, BufferKind, ChangeNotice, EditorSurface, SyntaxMode, DEFAULT_DEBOUNCE,
    ERROR_LINE_CLASS,
};
pub use widget::{Completion, Cursor, MemoryWidget, TextWidget};
