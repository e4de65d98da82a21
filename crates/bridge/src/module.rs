use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("failed to write '{path}' into the module filesystem: {message}")]
    Write { path: String, message: String },
}

/// Foreign surface of the pre-compiled execution module that compiles and
/// renders shaders. Implementations wrap the host binding; the bridge never
/// calls it before the readiness gate opens.
pub trait ExecutionModule {
    fn command(&mut self, command: &str);
    fn query(&mut self, name: &str) -> Option<String>;
    fn set_frag(&mut self, source: &str);
    fn set_vert(&mut self, source: &str);
    fn default_scene_frag(&mut self) -> Option<String>;
    fn default_scene_vert(&mut self) -> Option<String>;
    fn write_file(&mut self, path: &str, bytes: &[u8]) -> Result<(), ModuleError>;
    fn load_asset(&mut self, name: &str, extension: &str);
}
