//! Host-side wiring for the shader control surface: directory discovery,
//! persisted state, the headless execution module and the session that
//! composes editor, view, bridge and gist client.
pub mod defaults;
pub mod headless;
pub mod paths;
pub mod run;
pub mod session;
pub mod state;
