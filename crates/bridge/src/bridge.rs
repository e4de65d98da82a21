use std::collections::HashSet;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::assets::{
    data_url, extension_of, AssetError, AssetFetcher, AssetMap, AssetOutcome, AssetReport,
    AssetSource, HttpAssetFetcher,
};
use crate::module::ExecutionModule;
use crate::readiness::{ReadinessGate, WaitPolicy};

/// Commands whose invocations are remembered so object placements can be
/// replayed after a reload.
pub const COMMAND_LISTEN_LIST: &[&str] = &[
    "box", "cone", "cube", "cylinder", "icosphere", "line", "model", "plane", "point", "quad",
    "sphere", "torus", "triangle",
];

/// Render-state toggles captured alongside the command history.
pub const RETAINED_TOGGLES: &[&str] = &[
    "axis", "bboxes", "cubemap", "culling", "floor", "grid", "sky", "textures",
];

/// Destination for console echo. The orchestrator routes it into the view's
/// console panel; `TracingSink` is used when nothing else is attached.
pub trait LogSink {
    fn log(&mut self, line: &str);
    fn error(&mut self, line: &str);
}

#[derive(Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&mut self, line: &str) {
        info!(target: "console", "{line}");
    }

    fn error(&mut self, line: &str) {
        error!(target: "console", "{line}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Fragment,
    Vertex,
}

impl ShaderStage {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "frag" | "fs" | "glsl" => Some(Self::Fragment),
            "vert" | "vs" => Some(Self::Vertex),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl DroppedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDrop {
    pub stage: ShaderStage,
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropReport {
    pub shaders: Vec<ShaderDrop>,
    pub assets: AssetReport,
}

pub struct Bridge {
    module: Option<Box<dyn ExecutionModule>>,
    gate: ReadinessGate,
    sink: Box<dyn LogSink>,
    fetcher: Box<dyn AssetFetcher>,
    wait_policy: WaitPolicy,
    history: Vec<String>,
    error_subscribers: Vec<Sender<String>>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(ReadinessGate::new())
    }
}

impl Bridge {
    pub fn new(gate: ReadinessGate) -> Self {
        Self {
            module: None,
            gate,
            sink: Box::new(TracingSink),
            fetcher: Box::new(HttpAssetFetcher::new()),
            wait_policy: WaitPolicy::default(),
            history: Vec::new(),
            error_subscribers: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn AssetFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    pub fn gate(&self) -> ReadinessGate {
        self.gate.clone()
    }

    pub fn attach(&mut self, module: Box<dyn ExecutionModule>) {
        debug!("execution module attached");
        self.module = Some(module);
    }

    /// Tears the module down and closes the readiness gate.
    pub fn detach(&mut self) -> Option<Box<dyn ExecutionModule>> {
        self.gate.reset();
        self.module.take()
    }

    pub fn is_ready(&self) -> bool {
        self.module.is_some() && self.gate.is_ready()
    }

    fn ready_module(&mut self, operation: &str) -> Option<&mut Box<dyn ExecutionModule>> {
        if !self.gate.is_ready() {
            warn!(operation, "execution module not ready");
            return None;
        }
        let module = self.module.as_mut();
        if module.is_none() {
            warn!(operation, "no execution module attached");
        }
        module
    }

    pub fn send_command(&mut self, command: &str) {
        let command = command.trim();
        if command.is_empty() {
            return;
        }
        let Some(module) = self.ready_module("command") else {
            return;
        };
        module.command(command);
        if is_listened(command) {
            self.history.push(command.to_string());
        }
        self.sink.log(command);
    }

    pub fn query(&mut self, name: &str) -> Option<String> {
        let module = self.ready_module("query")?;
        module.query(name).filter(|value| !value.is_empty())
    }

    pub fn set_frag(&mut self, source: &str) {
        if let Some(module) = self.ready_module("set_frag") {
            module.set_frag(source);
        }
    }

    pub fn set_vert(&mut self, source: &str) {
        if let Some(module) = self.ready_module("set_vert") {
            module.set_vert(source);
        }
    }

    /// Default fragment and vertex sources shipped with the module, when it
    /// provides both.
    pub fn default_scene(&mut self) -> Option<(String, String)> {
        let module = self.ready_module("default_scene")?;
        let frag = module.default_scene_frag()?;
        let vert = module.default_scene_vert()?;
        Some((frag, vert))
    }

    pub fn command_history(&self) -> &[String] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Command history followed by the current value of every known toggle,
    /// without duplicates and in first-seen order.
    pub fn retained_state(&mut self, view_toggles: &[&str]) -> Vec<String> {
        let mut combined = self.history.clone();
        if self.is_ready() {
            let mut names = HashSet::new();
            for name in view_toggles.iter().chain(RETAINED_TOGGLES.iter()) {
                if !names.insert(*name) {
                    continue;
                }
                if let Some(value) = self.query(name) {
                    combined.push(format!("{name},{value}"));
                }
            }
        } else {
            warn!("execution module not ready; retained state limited to command history");
        }

        let mut seen = HashSet::new();
        combined.retain(|entry| seen.insert(entry.clone()));
        combined
    }

    /// Registers a receiver for compile errors reported by the module.
    pub fn subscribe_errors(&mut self) -> Receiver<String> {
        let (tx, rx) = unbounded();
        self.error_subscribers.push(tx);
        rx
    }

    /// Entry point for the module's compile error text (`0:<line>:<message>`).
    pub fn report_compile_error(&mut self, text: &str) {
        self.sink.error(text);
        self.error_subscribers
            .retain(|subscriber| subscriber.send(text.to_string()).is_ok());
    }

    /// Resolves and writes every asset in `assets`. The readiness wait is
    /// paid at most once per batch; once it times out the remaining assets
    /// are skipped without waiting again.
    pub fn load_assets(&mut self, assets: &AssetMap) -> AssetReport {
        let mut report = AssetReport::default();
        let mut ready = None;
        for (name, value) in assets {
            let outcome = match self.resolve_asset(value) {
                Ok(bytes) => self.write_asset(name, &bytes, &mut ready),
                Err(err) => {
                    error!(asset = %name, error = %err, "failed to resolve asset");
                    self.sink.error(&format!("failed to load asset {name}: {err}"));
                    AssetOutcome::Failed(err.to_string())
                }
            };
            report.push(name.clone(), outcome);
        }
        report
    }

    /// Routes dropped files: shader sources come back to the caller, all
    /// other files are recorded in `assets` as data URLs and loaded.
    pub fn handle_drop(&mut self, files: Vec<DroppedFile>, assets: &mut AssetMap) -> DropReport {
        let mut report = DropReport::default();
        let mut dropped_assets = AssetMap::new();
        for file in files {
            let extension = extension_of(&file.name);
            match ShaderStage::from_extension(&extension) {
                Some(stage) => report.shaders.push(ShaderDrop {
                    stage,
                    source: String::from_utf8_lossy(&file.bytes).into_owned(),
                    name: file.name,
                }),
                None => {
                    let url = data_url(&file.name, &file.bytes);
                    assets.insert(file.name.clone(), url.clone());
                    dropped_assets.insert(file.name, url);
                }
            }
        }
        if !dropped_assets.is_empty() {
            report.assets = self.load_assets(&dropped_assets);
        }
        report
    }

    fn resolve_asset(&self, value: &str) -> Result<Vec<u8>, AssetError> {
        match AssetSource::parse(value)? {
            AssetSource::Inline { bytes, .. } => Ok(bytes),
            AssetSource::Remote(url) => self.fetcher.fetch(&url),
        }
    }

    fn write_asset(
        &mut self,
        name: &str,
        bytes: &[u8],
        ready: &mut Option<bool>,
    ) -> AssetOutcome {
        let ready = match *ready {
            Some(ready) => ready,
            None => {
                let opened = self.module.is_some() && self.gate.wait(self.wait_policy);
                if !opened {
                    error!(
                        waited_ms = u64::try_from(self.wait_policy.ceiling().as_millis())
                            .unwrap_or(u64::MAX),
                        "execution module never became ready"
                    );
                }
                *ready.insert(opened)
            }
        };
        if !ready {
            warn!(asset = name, "skipping asset; execution module not ready");
            self.sink
                .error(&format!("timed out loading asset {name}; skipped"));
            return AssetOutcome::TimedOut;
        }

        let extension = extension_of(name);
        let Some(module) = self.module.as_mut() else {
            return AssetOutcome::TimedOut;
        };
        if let Err(err) = module.write_file(name, bytes) {
            error!(asset = name, error = %err, "failed to write asset");
            self.sink.error(&err.to_string());
            return AssetOutcome::Failed(err.to_string());
        }
        module.load_asset(name, &extension);
        debug!(asset = name, bytes = bytes.len(), "asset loaded");
        if extension == "hdr" {
            self.send_command("cubemap,on");
        }
        AssetOutcome::Loaded
    }
}

fn is_listened(command: &str) -> bool {
    let name = command.split(',').next().unwrap_or(command).trim();
    COMMAND_LISTEN_LIST.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleError;
    use reqwest::Url;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Default)]
    struct Calls {
        commands: Vec<String>,
        frags: Vec<String>,
        files: Vec<(String, Vec<u8>)>,
        registered: Vec<(String, String)>,
        states: HashMap<String, String>,
    }

    #[derive(Clone, Default)]
    struct FakeModule(Rc<RefCell<Calls>>);

    impl ExecutionModule for FakeModule {
        fn command(&mut self, command: &str) {
            self.0.borrow_mut().commands.push(command.to_string());
        }

        fn query(&mut self, name: &str) -> Option<String> {
            self.0.borrow().states.get(name).cloned()
        }

        fn set_frag(&mut self, source: &str) {
            self.0.borrow_mut().frags.push(source.to_string());
        }

        fn set_vert(&mut self, _source: &str) {}

        fn default_scene_frag(&mut self) -> Option<String> {
            Some("frag".into())
        }

        fn default_scene_vert(&mut self) -> Option<String> {
            None
        }

        fn write_file(&mut self, path: &str, bytes: &[u8]) -> Result<(), ModuleError> {
            self.0
                .borrow_mut()
                .files
                .push((path.to_string(), bytes.to_vec()));
            Ok(())
        }

        fn load_asset(&mut self, name: &str, extension: &str) {
            self.0
                .borrow_mut()
                .registered
                .push((name.to_string(), extension.to_string()));
        }
    }

    #[derive(Clone, Default)]
    struct Echo(Rc<RefCell<Vec<String>>>);

    impl LogSink for Echo {
        fn log(&mut self, line: &str) {
            self.0.borrow_mut().push(line.to_string());
        }

        fn error(&mut self, line: &str) {
            self.0.borrow_mut().push(format!("error: {line}"));
        }
    }

    struct StaticFetcher;

    impl AssetFetcher for StaticFetcher {
        fn fetch(&self, url: &Url) -> Result<Vec<u8>, AssetError> {
            Ok(url.path().as_bytes().to_vec())
        }
    }

    fn quick_policy() -> WaitPolicy {
        WaitPolicy {
            poll_interval: Duration::from_millis(1),
            max_attempts: 3,
        }
    }

    fn ready_bridge() -> (Bridge, FakeModule, Echo) {
        let module = FakeModule::default();
        let echo = Echo::default();
        let mut bridge = Bridge::default()
            .with_sink(Box::new(echo.clone()))
            .with_fetcher(Box::new(StaticFetcher))
            .with_wait_policy(quick_policy());
        bridge.attach(Box::new(module.clone()));
        bridge.gate().mark_ready();
        (bridge, module, echo)
    }

    #[test]
    fn not_ready_operations_are_noops() {
        let module = FakeModule::default();
        let mut bridge = Bridge::default();
        bridge.attach(Box::new(module.clone()));
        bridge.send_command("sphere");
        bridge.set_frag("void main(){}");
        assert!(bridge.query("sky").is_none());
        assert!(module.0.borrow().commands.is_empty());
        assert!(module.0.borrow().frags.is_empty());
        assert!(bridge.command_history().is_empty());
    }

    #[test]
    fn detached_bridge_is_not_ready() {
        let (mut bridge, _module, _echo) = ready_bridge();
        assert!(bridge.is_ready());
        bridge.detach();
        assert!(!bridge.is_ready());
        assert!(!bridge.gate().is_ready());
    }

    #[test]
    fn records_only_listened_commands() {
        let (mut bridge, module, echo) = ready_bridge();
        bridge.send_command("sphere");
        bridge.send_command("sky,on");
        bridge.send_command("plane,1,2");
        assert_eq!(bridge.command_history(), &["sphere", "plane,1,2"]);
        assert_eq!(module.0.borrow().commands.len(), 3);
        assert_eq!(echo.0.borrow().len(), 3);
    }

    #[test]
    fn retained_state_dedups_and_orders_history_first() {
        let (mut bridge, module, _echo) = ready_bridge();
        {
            let mut calls = module.0.borrow_mut();
            calls.states.insert("sky".into(), "on".into());
            calls.states.insert("grid".into(), "off".into());
            calls.states.insert("floor".into(), String::new());
        }
        bridge.send_command("sphere");
        bridge.send_command("sphere");
        bridge.send_command("cube");

        let state = bridge.retained_state(&["sky", "fullscreen", "grid"]);

        assert_eq!(state, vec!["sphere", "cube", "sky,on", "grid,off"]);
    }

    #[test]
    fn default_scene_requires_both_sources() {
        let (mut bridge, _module, _echo) = ready_bridge();
        assert!(bridge.default_scene().is_none());
    }

    #[test]
    fn loads_inline_and_remote_assets() {
        let (mut bridge, module, _echo) = ready_bridge();
        let mut assets = AssetMap::new();
        assets.insert("a.png".into(), "data:image/png;base64,aGVsbG8=".into());
        assets.insert("b.jpg".into(), "https://example.com/b.jpg".into());

        let report = bridge.load_assets(&assets);

        assert_eq!(report.loaded().count(), 2);
        let calls = module.0.borrow();
        assert_eq!(calls.files[0], ("a.png".to_string(), b"hello".to_vec()));
        assert_eq!(calls.files[1], ("b.jpg".to_string(), b"/b.jpg".to_vec()));
        assert_eq!(calls.registered[0], ("a.png".to_string(), "png".to_string()));
    }

    #[test]
    fn hdr_assets_enable_cubemap() {
        let (mut bridge, module, _echo) = ready_bridge();
        let mut assets = AssetMap::new();
        assets.insert("sky.hdr".into(), "data:image/vnd.radiance;base64,aGVsbG8=".into());
        bridge.load_assets(&assets);
        assert_eq!(module.0.borrow().commands, vec!["cubemap,on"]);
    }

    #[test]
    fn timed_out_assets_are_skipped_not_fatal() {
        let module = FakeModule::default();
        let mut bridge = Bridge::default()
            .with_fetcher(Box::new(StaticFetcher))
            .with_wait_policy(quick_policy());
        bridge.attach(Box::new(module.clone()));
        let mut assets = AssetMap::new();
        assets.insert("a.png".into(), "data:image/png;base64,aGVsbG8=".into());
        assets.insert("b.png".into(), "data:image/png;base64,aGVsbG8=".into());

        let report = bridge.load_assets(&assets);

        assert_eq!(report.outcomes.len(), 2);
        assert!(report
            .outcomes
            .iter()
            .all(|(_, outcome)| *outcome == AssetOutcome::TimedOut));
        assert!(module.0.borrow().files.is_empty());
    }

    #[test]
    fn timed_out_batch_waits_once() {
        let module = FakeModule::default();
        let policy = WaitPolicy {
            poll_interval: Duration::from_millis(20),
            max_attempts: 4,
        };
        let mut bridge = Bridge::default()
            .with_fetcher(Box::new(StaticFetcher))
            .with_wait_policy(policy);
        bridge.attach(Box::new(module.clone()));
        let mut assets = AssetMap::new();
        for name in ["a.png", "b.png", "c.png", "d.png"] {
            assets.insert(name.into(), "data:image/png;base64,aGVsbG8=".into());
        }

        let started = std::time::Instant::now();
        let report = bridge.load_assets(&assets);
        let elapsed = started.elapsed();

        assert_eq!(report.outcomes.len(), 4);
        assert!(report
            .outcomes
            .iter()
            .all(|(_, outcome)| *outcome == AssetOutcome::TimedOut));
        assert!(
            elapsed < policy.ceiling() * 2,
            "batch took {elapsed:?}, ceiling {:?}",
            policy.ceiling()
        );
    }

    #[test]
    fn bad_asset_does_not_abort_batch() {
        let (mut bridge, _module, _echo) = ready_bridge();
        let mut assets = AssetMap::new();
        assets.insert("a.png".into(), "data:image/png;base64,***".into());
        assets.insert("b.png".into(), "data:image/png;base64,aGVsbG8=".into());
        let report = bridge.load_assets(&assets);
        assert!(matches!(report.outcomes[0].1, AssetOutcome::Failed(_)));
        assert_eq!(report.outcomes[1].1, AssetOutcome::Loaded);
    }

    #[test]
    fn drop_routes_shaders_and_records_assets() {
        let (mut bridge, module, _echo) = ready_bridge();
        let mut assets = AssetMap::new();
        let files = vec![
            DroppedFile::new("main.frag", "void main(){}"),
            DroppedFile::new("main.vert", "attribute vec4 a;"),
            DroppedFile::new("tex.png", b"hello".to_vec()),
        ];

        let report = bridge.handle_drop(files, &mut assets);

        assert_eq!(report.shaders.len(), 2);
        assert_eq!(report.shaders[0].stage, ShaderStage::Fragment);
        assert_eq!(report.shaders[1].stage, ShaderStage::Vertex);
        assert_eq!(report.shaders[1].source, "attribute vec4 a;");
        assert_eq!(
            assets.get("tex.png").map(String::as_str),
            Some("data:image/png;base64,aGVsbG8=")
        );
        assert_eq!(report.assets.loaded().collect::<Vec<_>>(), vec!["tex.png"]);
        assert_eq!(module.0.borrow().files.len(), 1);
    }

    #[test]
    fn compile_errors_reach_subscribers() {
        let (mut bridge, _module, echo) = ready_bridge();
        let errors = bridge.subscribe_errors();
        bridge.report_compile_error("0:12:syntax error");
        assert_eq!(errors.try_recv().unwrap(), "0:12:syntax error");
        assert_eq!(echo.0.borrow().last().unwrap(), "error: 0:12:syntax error");

        drop(errors);
        bridge.report_compile_error("0:1:again");
        assert!(bridge.error_subscribers.is_empty());
    }
}
