//! Bridge between the control surface and the externally supplied execution
//! module. Every call is gated on module readiness; commands are echoed to a
//! log sink and geometry commands are remembered for replay.
mod assets;
mod bridge;
mod module;
mod readiness;

pub use assets::{
    data_url, extension_of, mime_for_extension, AssetError, AssetFetcher, AssetMap, AssetOutcome,
    AssetReport, AssetSource, HttpAssetFetcher,
};
pub use bridge::{
    Bridge, DropReport, DroppedFile, LogSink, ShaderDrop, ShaderStage, TracingSink,
    COMMAND_LISTEN_LIST, RETAINED_TOGGLES,
};
pub use module::{ExecutionModule, ModuleError};
pub use readiness::{ReadinessGate, WaitPolicy};
