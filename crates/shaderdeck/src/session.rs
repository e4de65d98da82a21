//! Composes the editor, view state, execution bridge and gist client into a
//! single control surface.
//!
//! Types:
//!
//! - `Session` owns every component and exposes the user-facing actions
//!   (load, save, drop, tab and menu clicks, screenshots).
//! - `ConsoleSink` routes bridge echo into the shared console pane.
//! - `SharedGist` is the result of a save: the gist plus its share link.
//!
//! Functions:
//!
//! - `Session::tick` drives the editor debounce, compile error decorations,
//!   and the view menu resync from one timestamp.
//! - `Session::load_gist` applies a project in a fixed order: editor buffers,
//!   module shaders, assets, then replayed commands.
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result};
use bridge::{AssetMap, AssetReport, Bridge, DroppedFile, LogSink, ShaderStage, WaitPolicy};
use chrono::Local;
use crossbeam_channel::Receiver;
use deckconfig::DeckConfig;
use editor::{BufferKind, ChangeNotice, EditorSurface, TextWidget};
use gistsync::{gist_id_from_url, share_url, GistClient, LoadedGist, SavedGist, ShaderProject};
use tracing::{debug, info};
use view::{
    Console, Disposition, DropZone, DropdownAction, FocusTracker, Layout, Loader, Screenshot,
    ScreenshotError, TabBar, ViewDropdown,
};

use crate::defaults::{DEFAULT_FRAGMENT, DEFAULT_VERTEX};

#[derive(Clone)]
pub struct ConsoleSink(Rc<RefCell<Console>>);

impl LogSink for ConsoleSink {
    fn log(&mut self, line: &str) {
        self.0.borrow_mut().log(line);
    }

    fn error(&mut self, line: &str) {
        self.0.borrow_mut().error(line);
    }
}

#[derive(Debug, Clone)]
pub struct SharedGist {
    pub saved: SavedGist,
    pub url: String,
}

pub struct Session<W: TextWidget> {
    editor: EditorSurface<W>,
    bridge: Bridge,
    gists: GistClient,
    console: Rc<RefCell<Console>>,
    loader: Loader,
    layout: Layout,
    focus: FocusTracker,
    tabs: TabBar,
    dropdown: ViewDropdown,
    drop_zone: DropZone,
    assets: AssetMap,
    errors: Receiver<String>,
    share_base: String,
}

impl<W: TextWidget> Session<W> {
    pub fn new(
        mut editor: EditorSurface<W>,
        bridge: Bridge,
        gists: GistClient,
        config: &DeckConfig,
    ) -> Self {
        let console = Rc::new(RefCell::new(Console::new()));
        let mut bridge = bridge
            .with_sink(Box::new(ConsoleSink(console.clone())))
            .with_wait_policy(WaitPolicy {
                poll_interval: config.assets.poll_interval,
                max_attempts: config.assets.max_attempts,
            });
        let errors = bridge.subscribe_errors();
        editor.set_debounce(config.editor.debounce);

        Self {
            editor,
            bridge,
            gists,
            console,
            loader: Loader::new(),
            layout: Layout::new(),
            focus: FocusTracker::new(),
            tabs: TabBar::new(),
            dropdown: ViewDropdown::new(config.view.resync_delay),
            drop_zone: DropZone::new(),
            assets: AssetMap::new(),
            errors,
            share_base: config.gist.share_base.clone(),
        }
    }

    pub fn editor(&self) -> &EditorSurface<W> {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorSurface<W> {
        &mut self.editor
    }

    pub fn gists(&self) -> &GistClient {
        &self.gists
    }

    pub fn gists_mut(&mut self) -> &mut GistClient {
        &mut self.gists
    }

    pub fn console(&self) -> Ref<'_, Console> {
        self.console.borrow()
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn focus_mut(&mut self) -> &mut FocusTracker {
        &mut self.focus
    }

    pub fn dropdown(&self) -> &ViewDropdown {
        &self.dropdown
    }

    pub fn assets(&self) -> &AssetMap {
        &self.assets
    }

    /// Starts over from the module's default scene, or the bundled shaders
    /// when the module has none.
    pub fn new_project(&mut self) {
        let (frag, vert) = self
            .bridge
            .default_scene()
            .unwrap_or_else(|| (DEFAULT_FRAGMENT.to_string(), DEFAULT_VERTEX.to_string()));
        self.gists.reset();
        self.apply_project(&ShaderProject::new(frag, vert));
        self.console.borrow_mut().log("new project");
    }

    /// Raw edit notification from the widget.
    pub fn edit(&mut self, now: Instant) {
        self.editor.handle_edit(now);
    }

    pub fn tick(&mut self, now: Instant) -> Option<ChangeNotice> {
        let notice = self.editor.tick(now);
        if let Some(notice) = &notice {
            self.apply_notice(notice);
        }
        while let Ok(error) = self.errors.try_recv() {
            self.editor.apply_error_event(&error);
        }
        let bridge = &mut self.bridge;
        self.dropdown.tick(now, |name| bridge.query(name));
        notice
    }

    fn apply_notice(&mut self, notice: &ChangeNotice) {
        debug!(buffer = notice.kind.label(), "pushing edited shader");
        match notice.kind {
            BufferKind::Fragment => self.bridge.set_frag(&notice.source),
            BufferKind::Vertex => self.bridge.set_vert(&notice.source),
        }
    }

    /// Console command line input.
    pub fn send_command(&mut self, command: &str) {
        self.bridge.send_command(command);
    }

    pub fn report_compile_error(&mut self, text: &str) {
        self.bridge.report_compile_error(text);
    }

    /// Loads a gist by id or share link. Returns `Ok(None)` when that gist is
    /// already loaded.
    pub fn load_gist(&mut self, reference: &str) -> Result<Option<LoadedGist>> {
        let id = gist_id_from_url(reference)?;
        self.loader.show(&format!("Loading gist {id}"));
        let result = self.load_and_apply(&id);
        self.loader.hide();
        result
    }

    fn load_and_apply(&mut self, id: &str) -> Result<Option<LoadedGist>> {
        let loaded = match self.gists.load(id) {
            Ok(Some(loaded)) => loaded,
            Ok(None) => return Ok(None),
            Err(err) => {
                self.console
                    .borrow_mut()
                    .error(&format!("failed to load gist {id}: {err}"));
                return Err(err).with_context(|| format!("loading gist {id}"));
            }
        };

        self.loader.update("Applying project");
        let report = self.apply_project(&loaded.project);
        let mut console = self.console.borrow_mut();
        for line in loaded.attribution.lines() {
            console.log(&line);
        }
        for skipped in report.skipped() {
            console.error(&format!("asset {skipped} was not loaded"));
        }
        info!(gist = %loaded.id, assets = report.outcomes.len(), "project applied");
        drop(console);
        Ok(Some(loaded))
    }

    fn apply_project(&mut self, project: &ShaderProject) -> AssetReport {
        self.editor.set_content(BufferKind::Fragment, &project.frag);
        self.editor.set_content(BufferKind::Vertex, &project.vert);
        self.bridge.set_frag(&project.frag);
        self.bridge.set_vert(&project.vert);

        self.assets = project.assets.clone();
        let report = self.bridge.load_assets(&self.assets);

        self.bridge.clear_history();
        for command in &project.commands {
            self.bridge.send_command(command);
        }
        report
    }

    /// Snapshot of the editor buffers, replayable module state and tracked
    /// assets.
    pub fn current_project(&mut self) -> ShaderProject {
        let toggles = self.dropdown.toggle_names();
        ShaderProject {
            frag: self.editor.content(BufferKind::Fragment),
            vert: self.editor.content(BufferKind::Vertex),
            commands: self.bridge.retained_state(&toggles),
            assets: self.assets.clone(),
            history: Vec::new(),
        }
    }

    pub fn save_gist(&mut self, name: &str) -> Result<SharedGist> {
        let project = self.current_project();
        self.loader.show("Saving gist");
        let result = self.gists.save(name, &project);
        self.loader.hide();

        let saved = match result {
            Ok(saved) => saved,
            Err(err) => {
                self.console
                    .borrow_mut()
                    .error(&format!("failed to save gist: {err}"));
                return Err(err).context("saving gist");
            }
        };
        let url = share_url(&self.share_base, &saved.id)?.to_string();
        self.console
            .borrow_mut()
            .log(&format!("saved gist {} ({url})", saved.id));
        Ok(SharedGist { saved, url })
    }

    /// Dropped shader files replace the matching buffer; everything else
    /// becomes a project asset.
    pub fn drop_files(&mut self, files: Vec<DroppedFile>) -> Disposition {
        let bridge = &mut self.bridge;
        let assets = &mut self.assets;
        let mut shaders = Vec::new();
        let disposition = self.drop_zone.on_drop(files, |files| {
            shaders = bridge.handle_drop(files, assets).shaders;
        });

        for shader in shaders {
            let kind = match shader.stage {
                ShaderStage::Fragment => BufferKind::Fragment,
                ShaderStage::Vertex => BufferKind::Vertex,
            };
            self.editor.set_content(kind, &shader.source);
            match kind {
                BufferKind::Fragment => self.bridge.set_frag(&shader.source),
                BufferKind::Vertex => self.bridge.set_vert(&shader.source),
            }
            self.console
                .borrow_mut()
                .log(&format!("loaded {} into the {} buffer", shader.name, kind.label()));
        }
        disposition
    }

    pub fn drag_over(&mut self) -> Disposition {
        self.drop_zone.on_drag_over()
    }

    pub fn drag_leave(&mut self) -> Disposition {
        self.drop_zone.on_drag_leave()
    }

    pub fn drop_zone(&self) -> &DropZone {
        &self.drop_zone
    }

    pub fn click_tab(&mut self, kind: BufferKind) -> Option<ChangeNotice> {
        let notice = self.tabs.click(kind, &mut self.layout, &mut self.editor);
        self.dropdown.sync_fullscreen(self.layout.is_fullscreen());
        if let Some(notice) = &notice {
            self.apply_notice(notice);
        }
        notice
    }

    pub fn toggle_view_menu(&mut self) -> bool {
        let bridge = &mut self.bridge;
        self.dropdown.toggle_open(|name| bridge.query(name))
    }

    pub fn click_dropdown(&mut self, name: &str, now: Instant) {
        match self.dropdown.click(name, now) {
            Some(DropdownAction::Command(command)) => self.bridge.send_command(&command),
            Some(DropdownAction::ToggleFullscreen) => {
                self.layout.toggle_fullscreen();
            }
            None => debug!(toggle = name, "unknown view toggle"),
        }
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        let fullscreen = self.layout.toggle_fullscreen();
        self.dropdown.sync_fullscreen(fullscreen);
        fullscreen
    }

    /// Encodes a frame read back from the canvas (bottom-up RGBA rows).
    pub fn screenshot(
        &mut self,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<Screenshot, ScreenshotError> {
        let shot = Screenshot::capture(width, height, rgba, true, &Local::now())?;
        self.console
            .borrow_mut()
            .log(&format!("screenshot saved as {}", shot.filename));
        Ok(shot)
    }
}
