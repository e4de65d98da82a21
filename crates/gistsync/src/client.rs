//! Gist-backed persistence: credential lifecycle, load/save of shader
//! projects, and the derivation history that travels with every save.
//!
//! Types:
//!
//! - `GistClient` owns the access token, the in-memory `History`, and the
//!   load state used to ignore repeated loads of the same gist.
//! - `LoadedGist` / `SavedGist` are the results handed back to the
//!   orchestrator.
//! - `Attribution` describes the author links shown next to a loaded gist.
//!
//! Functions:
//!
//! - `GistClient::load` fetches, parses and adopts a gist's history.
//! - `GistClient::save` prunes history, embeds it, and publishes a new gist.
//! - `GistClient::login`, `validate`, and `logout` manage the credential.
use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, GistApi, GistDocument, Identity, NewGist, NewGistFile};
use crate::model::{History, HistoryEntry, ShaderProject};
use crate::store::{LocalStore, HISTORY_KEY, TOKEN_KEY};

pub const PREFERRED_FILENAME: &str = "shader.json";

#[derive(Debug, Error)]
pub enum GistError {
    #[error("gist identifier must not be empty")]
    EmptyId,
    #[error("gist '{0}' does not contain a shader payload (.json file)")]
    MissingPayload(String),
    #[error("gist '{id}' payload is not a valid shader project: {source}")]
    Parse {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize shader project: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("not logged in; an access token is required to save gists")]
    NotLoggedIn,
    #[error("access token was rejected; logged out")]
    Unauthorized,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading(String),
    Loaded(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorLink {
    pub login: String,
    pub avatar_url: String,
    pub profile_url: String,
}

impl AuthorLink {
    fn from_identity(identity: &Identity) -> Self {
        Self {
            login: identity.login.clone(),
            avatar_url: identity.avatar_url.clone(),
            profile_url: identity.html_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginLink {
    pub gist_id: String,
    pub gist_url: String,
    pub author: Option<AuthorLink>,
}

/// Author panel for a loaded gist: the most recent author always, plus a
/// "based on" link when the chain started at a different gist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribution {
    pub latest: Option<AuthorLink>,
    pub original: Option<OriginLink>,
}

impl Attribution {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(latest) = &self.latest {
            lines.push(format!("by {} ({})", latest.login, latest.profile_url));
        }
        if let Some(original) = &self.original {
            match &original.author {
                Some(author) => lines.push(format!(
                    "based on {} by {}",
                    original.gist_url, author.login
                )),
                None => lines.push(format!("based on {}", original.gist_url)),
            }
        }
        lines
    }
}

#[derive(Debug, Clone)]
pub struct LoadedGist {
    pub id: String,
    pub project: ShaderProject,
    pub attribution: Attribution,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedGist {
    pub id: String,
    pub filename: String,
    pub html_url: Option<String>,
}

pub struct GistClient {
    api: Box<dyn GistApi>,
    store: Box<dyn LocalStore>,
    token: Option<String>,
    username: Option<String>,
    history: History,
    state: LoadState,
    description: String,
}

impl GistClient {
    pub fn new(api: Box<dyn GistApi>, store: Box<dyn LocalStore>) -> Self {
        let token = store.get(TOKEN_KEY).filter(|token| !token.trim().is_empty());
        let history = store
            .get(HISTORY_KEY)
            .and_then(|raw| match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(entries) => Some(History::from_entries(entries)),
                Err(err) => {
                    warn!(error = %err, "discarding unreadable stored gist history");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            api,
            store,
            token,
            username: None,
            history,
            state: LoadState::Idle,
            description: "shaderdeck project".to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Author links for the current history; looks identities up again.
    pub fn attribution(&self) -> Attribution {
        self.resolve_attribution()
    }

    pub fn login(&mut self, token: &str) -> Result<Identity, GistError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(GistError::NotLoggedIn);
        }
        match self.api.current_user(token) {
            Ok(identity) => {
                self.token = Some(token.to_string());
                self.username = Some(identity.login.clone());
                if let Err(err) = self.store.set(TOKEN_KEY, token) {
                    warn!(error = %err, "failed to persist access token");
                }
                info!(user = %identity.login, "logged in");
                Ok(identity)
            }
            Err(err) if err.is_unauthorized() => {
                self.logout();
                Err(GistError::Unauthorized)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Re-checks the stored token. Returns `Ok(None)` when logged out.
    pub fn validate(&mut self) -> Result<Option<Identity>, GistError> {
        let Some(token) = self.token.clone() else {
            return Ok(None);
        };
        match self.api.current_user(&token) {
            Ok(identity) => {
                self.username = Some(identity.login.clone());
                Ok(Some(identity))
            }
            Err(err) if err.is_unauthorized() => {
                warn!("stored access token is no longer valid");
                self.logout();
                Err(GistError::Unauthorized)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.username = None;
        if let Err(err) = self.store.remove(TOKEN_KEY) {
            warn!(error = %err, "failed to clear stored access token");
        }
        info!("logged out");
    }

    /// Loads a gist. Returns `Ok(None)` without touching the network when the
    /// same gist is already loading or loaded.
    pub fn load(&mut self, id: &str) -> Result<Option<LoadedGist>, GistError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(GistError::EmptyId);
        }
        if let LoadState::Loading(current) | LoadState::Loaded(current) = &self.state {
            if current == id {
                debug!(gist = id, "gist already loaded; ignoring request");
                return Ok(None);
            }
        }

        self.state = LoadState::Loading(id.to_string());
        let (document, project) = match self.fetch_project(id) {
            Ok(result) => result,
            Err(err) => {
                warn!(gist = id, error = %err, "failed to load gist");
                self.state = LoadState::Failed(id.to_string());
                return Err(err);
            }
        };

        let mut history = History::from_entries(project.history.iter().cloned());
        history.record(HistoryEntry::new(id, document.owner.clone()));
        self.history = history;
        self.persist_history();

        let attribution = self.resolve_attribution();
        self.state = LoadState::Loaded(id.to_string());
        info!(gist = id, history = self.history.len(), "loaded gist");

        let mut project = project;
        project.history = self.history.entries().to_vec();
        Ok(Some(LoadedGist {
            id: id.to_string(),
            project,
            attribution,
        }))
    }

    /// Forgets the loaded gist so the next `load` of it fetches again.
    pub fn reset(&mut self) {
        self.state = LoadState::Idle;
    }

    pub fn save(&mut self, name: &str, project: &ShaderProject) -> Result<SavedGist, GistError> {
        let Some(token) = self.token.clone() else {
            return Err(GistError::NotLoggedIn);
        };
        let filename = json_filename(name);

        let mut history = self.pruned_history(&token);
        let mut payload = project.clone();
        payload.history = history.entries().to_vec();
        let content = serde_json::to_string_pretty(&payload).map_err(GistError::Serialize)?;

        let mut files = BTreeMap::new();
        files.insert(filename.clone(), NewGistFile { content });
        let request = NewGist {
            description: self.description.clone(),
            public: true,
            files,
        };

        let document = match self.api.create_gist(&request, &token) {
            Ok(document) => document,
            Err(err) => {
                warn!(file = %filename, error = %err, "failed to save gist");
                if err.is_unauthorized() {
                    self.logout();
                    return Err(GistError::Unauthorized);
                }
                return Err(err.into());
            }
        };

        history.record(HistoryEntry::new(document.id.clone(), document.owner.clone()));
        self.history = history;
        self.persist_history();
        info!(gist = %document.id, file = %filename, "saved gist");

        Ok(SavedGist {
            id: document.id,
            filename,
            html_url: document.html_url,
        })
    }

    fn fetch_project(&self, id: &str) -> Result<(GistDocument, ShaderProject), GistError> {
        let token = self.token.as_deref();
        let document = self.api.get_gist(id, token)?;
        let file = select_payload(&document)
            .ok_or_else(|| GistError::MissingPayload(id.to_string()))?;

        let content = match (&file.content, &file.raw_url) {
            (Some(content), _) if !file.truncated => content.clone(),
            (_, Some(raw_url)) => {
                debug!(gist = id, file = %file.filename, "gist content truncated; fetching raw file");
                self.api.get_raw(raw_url, token)?
            }
            (Some(content), None) => content.clone(),
            (None, None) => return Err(GistError::MissingPayload(id.to_string())),
        };

        let project = serde_json::from_str::<ShaderProject>(&content).map_err(|source| {
            GistError::Parse {
                id: id.to_string(),
                source,
            }
        })?;
        Ok((document, project))
    }

    fn pruned_history(&self, token: &str) -> History {
        let mut history = self.history.clone();
        history.retain(|entry| match self.api.get_gist(&entry.gist_id, Some(token)) {
            Ok(_) => true,
            Err(err) if err.is_not_found() => {
                debug!(gist = %entry.gist_id, "dropping history entry for deleted gist");
                false
            }
            Err(err) => {
                debug!(gist = %entry.gist_id, error = %err, "keeping history entry after failed check");
                true
            }
        });
        history
    }

    fn resolve_attribution(&self) -> Attribution {
        let (Some(first), Some(last)) = (self.history.first(), self.history.last()) else {
            return Attribution::default();
        };
        let latest = self.resolve_identity(last).map(|id| AuthorLink::from_identity(&id));
        let original = (first.gist_id != last.gist_id).then(|| OriginLink {
            gist_id: first.gist_id.clone(),
            gist_url: format!("https://gist.github.com/{}", first.gist_id),
            author: self
                .resolve_identity(first)
                .as_ref()
                .map(AuthorLink::from_identity),
        });
        Attribution { latest, original }
    }

    fn resolve_identity(&self, entry: &HistoryEntry) -> Option<Identity> {
        let owner = entry.owner.as_ref()?;
        match self.api.user(&owner.login, self.token.as_deref()) {
            Ok(identity) => Some(identity),
            Err(err) => {
                debug!(user = %owner.login, error = %err, "could not resolve author identity");
                None
            }
        }
    }

    fn persist_history(&mut self) {
        let encoded = match serde_json::to_string(self.history.entries()) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(error = %err, "failed to encode gist history");
                return;
            }
        };
        if let Err(err) = self.store.set(HISTORY_KEY, &encoded) {
            warn!(error = %err, "failed to persist gist history");
        }
    }
}

fn select_payload(document: &GistDocument) -> Option<&crate::api::GistFile> {
    document.files.get(PREFERRED_FILENAME).or_else(|| {
        document
            .files
            .iter()
            .find(|(name, _)| name.ends_with(".json"))
            .map(|(_, file)| file)
    })
}

const REPLACED_EXTENSIONS: &[&str] = &[".json", ".frag", ".vert", ".glsl"];

/// Swaps a trailing shader or json extension for `.json`, otherwise appends
/// it. An empty name falls back to `shader.json`.
pub fn json_filename(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return PREFERRED_FILENAME.to_string();
    }
    let stem = REPLACED_EXTENSIONS
        .iter()
        .find_map(|extension| trimmed.strip_suffix(extension))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(trimmed);
    format!("{stem}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GistFile;
    use crate::model::Owner;
    use crate::store::MemoryStore;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeState {
        gists: HashMap<String, GistDocument>,
        raw: HashMap<String, String>,
        users: HashMap<String, Identity>,
        valid_tokens: Vec<String>,
        gist_fetches: Vec<String>,
        user_fetches: Vec<String>,
        created: Vec<NewGist>,
        next_id: u32,
        fail_create: bool,
        offline_ids: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct FakeApi(Rc<RefCell<FakeState>>);

    fn status(status: u16) -> ApiError {
        ApiError::Status {
            url: "fake".into(),
            status,
        }
    }

    impl GistApi for FakeApi {
        fn get_gist(&self, id: &str, _token: Option<&str>) -> Result<GistDocument, ApiError> {
            let mut state = self.0.borrow_mut();
            state.gist_fetches.push(id.to_string());
            if state.offline_ids.iter().any(|offline| offline == id) {
                return Err(ApiError::Transport {
                    url: "fake".into(),
                    message: "offline".into(),
                });
            }
            state.gists.get(id).cloned().ok_or_else(|| status(404))
        }

        fn get_raw(&self, url: &str, _token: Option<&str>) -> Result<String, ApiError> {
            self.0.borrow().raw.get(url).cloned().ok_or_else(|| status(404))
        }

        fn create_gist(&self, gist: &NewGist, token: &str) -> Result<GistDocument, ApiError> {
            let mut state = self.0.borrow_mut();
            if !state.valid_tokens.iter().any(|valid| valid == token) {
                return Err(status(401));
            }
            if state.fail_create {
                return Err(status(500));
            }
            state.next_id += 1;
            let id = format!("new{}", state.next_id);
            let files = gist
                .files
                .iter()
                .map(|(name, file)| {
                    (
                        name.clone(),
                        GistFile {
                            filename: name.clone(),
                            content: Some(file.content.clone()),
                            truncated: false,
                            raw_url: None,
                        },
                    )
                })
                .collect();
            let document = GistDocument {
                id: id.clone(),
                files,
                owner: Some(owner("me")),
                html_url: Some(format!("https://gist.github.com/{id}")),
                description: Some(gist.description.clone()),
            };
            state.gists.insert(id, document.clone());
            state.created.push(gist.clone());
            Ok(document)
        }

        fn current_user(&self, token: &str) -> Result<Identity, ApiError> {
            let state = self.0.borrow();
            if state.valid_tokens.iter().any(|valid| valid == token) {
                Ok(identity("me"))
            } else {
                Err(status(401))
            }
        }

        fn user(&self, login: &str, _token: Option<&str>) -> Result<Identity, ApiError> {
            let mut state = self.0.borrow_mut();
            state.user_fetches.push(login.to_string());
            state.users.get(login).cloned().ok_or_else(|| status(404))
        }
    }

    fn owner(login: &str) -> Owner {
        Owner {
            login: login.into(),
            id: 1,
            avatar_url: format!("https://avatars/{login}.png"),
        }
    }

    fn identity(login: &str) -> Identity {
        Identity {
            login: login.into(),
            id: 1,
            avatar_url: format!("https://avatars/{login}.png"),
            html_url: format!("https://github.com/{login}"),
            name: None,
        }
    }

    fn gist(id: &str, login: &str, filename: &str, project: &ShaderProject) -> GistDocument {
        let mut files = BTreeMap::new();
        files.insert(
            filename.to_string(),
            GistFile {
                filename: filename.to_string(),
                content: Some(serde_json::to_string(project).unwrap()),
                truncated: false,
                raw_url: None,
            },
        );
        GistDocument {
            id: id.into(),
            files,
            owner: Some(owner(login)),
            html_url: None,
            description: None,
        }
    }

    fn client(api: &FakeApi) -> GistClient {
        GistClient::new(Box::new(api.clone()), Box::new(MemoryStore::new()))
    }

    fn sample_project() -> ShaderProject {
        let mut project = ShaderProject::new("void main() {}", "attribute vec4 a;");
        project.commands = vec!["sphere".into(), "sky,on".into()];
        project
            .assets
            .insert("tex.png".into(), "https://example.com/tex.png".into());
        project
    }

    #[test]
    fn repeated_load_fetches_once() {
        let api = FakeApi::default();
        api.0
            .borrow_mut()
            .gists
            .insert("abc".into(), gist("abc", "ann", "shader.json", &sample_project()));
        let mut client = client(&api);

        let first = client.load("abc").unwrap();
        let second = client.load("abc").unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        let fetches = api.0.borrow().gist_fetches.clone();
        assert_eq!(fetches, vec!["abc".to_string()]);
        assert_eq!(client.state(), &LoadState::Loaded("abc".into()));
    }

    #[test]
    fn load_replaces_existing_entry_in_history() {
        let api = FakeApi::default();
        let mut project = sample_project();
        project.history = vec![
            HistoryEntry::new("root", Some(owner("ann"))),
            HistoryEntry::new("abc", Some(owner("old"))),
            HistoryEntry::new("tail", Some(owner("bob"))),
        ];
        api.0
            .borrow_mut()
            .gists
            .insert("abc".into(), gist("abc", "carol", "shader.json", &project));
        let mut client = client(&api);

        let loaded = client.load("abc").unwrap().unwrap();

        assert_eq!(client.history().len(), 3);
        assert_eq!(client.history().entries()[1].gist_id, "abc");
        assert_eq!(
            client.history().entries()[1].owner.as_ref().unwrap().login,
            "carol"
        );
        assert_eq!(loaded.project.history.len(), 3);
    }

    #[test]
    fn load_appends_own_entry_and_builds_attribution() {
        let api = FakeApi::default();
        let mut project = sample_project();
        project.history = vec![HistoryEntry::new("root", Some(owner("ann")))];
        {
            let mut state = api.0.borrow_mut();
            state
                .gists
                .insert("abc".into(), gist("abc", "bob", "shader.json", &project));
            state.users.insert("ann".into(), identity("ann"));
            state.users.insert("bob".into(), identity("bob"));
        }
        let mut client = client(&api);

        let loaded = client.load("abc").unwrap().unwrap();

        assert_eq!(client.history().first().unwrap().gist_id, "root");
        assert_eq!(client.history().last().unwrap().gist_id, "abc");
        assert_eq!(loaded.attribution.latest.as_ref().unwrap().login, "bob");
        let original = loaded.attribution.original.as_ref().unwrap();
        assert_eq!(original.gist_id, "root");
        assert_eq!(original.author.as_ref().unwrap().login, "ann");
        assert_eq!(loaded.attribution.lines().len(), 2);
    }

    #[test]
    fn attribution_omits_origin_for_single_entry() {
        let api = FakeApi::default();
        {
            let mut state = api.0.borrow_mut();
            state
                .gists
                .insert("abc".into(), gist("abc", "bob", "shader.json", &sample_project()));
            state.users.insert("bob".into(), identity("bob"));
        }
        let mut client = client(&api);
        let loaded = client.load("abc").unwrap().unwrap();
        assert!(loaded.attribution.original.is_none());
        assert_eq!(api.0.borrow().user_fetches, vec!["bob"]);
        assert_eq!(client.attribution(), loaded.attribution);
        assert_eq!(loaded.attribution.latest.unwrap().login, "bob");
    }

    #[test]
    fn identity_failures_leave_author_empty() {
        let api = FakeApi::default();
        api.0
            .borrow_mut()
            .gists
            .insert("abc".into(), gist("abc", "ghost", "shader.json", &sample_project()));
        let mut client = client(&api);
        let loaded = client.load("abc").unwrap().unwrap();
        assert!(loaded.attribution.latest.is_none());
    }

    #[test]
    fn falls_back_to_first_json_file() {
        let api = FakeApi::default();
        api.0
            .borrow_mut()
            .gists
            .insert("abc".into(), gist("abc", "ann", "scene.json", &sample_project()));
        let mut client = client(&api);
        let loaded = client.load("abc").unwrap().unwrap();
        assert_eq!(loaded.project.frag, "void main() {}");
    }

    #[test]
    fn refetches_truncated_content() {
        let api = FakeApi::default();
        let project = sample_project();
        let mut document = gist("abc", "ann", "shader.json", &project);
        if let Some(file) = document.files.get_mut("shader.json") {
            file.truncated = true;
            file.content = Some("{\"frag\": \"cut".into());
            file.raw_url = Some("https://raw/abc".into());
        }
        {
            let mut state = api.0.borrow_mut();
            state.gists.insert("abc".into(), document);
            state
                .raw
                .insert("https://raw/abc".into(), serde_json::to_string(&project).unwrap());
        }
        let mut client = client(&api);
        let loaded = client.load("abc").unwrap().unwrap();
        assert!(loaded.project.same_content(&project));
    }

    #[test]
    fn missing_payload_fails_and_allows_retry() {
        let api = FakeApi::default();
        let mut document = gist("abc", "ann", "shader.json", &sample_project());
        document.files.clear();
        api.0.borrow_mut().gists.insert("abc".into(), document);
        let mut client = client(&api);

        let err = client.load("abc").unwrap_err();
        assert!(matches!(err, GistError::MissingPayload(_)));
        assert_eq!(client.state(), &LoadState::Failed("abc".into()));

        let _ = client.load("abc");
        assert_eq!(api.0.borrow().gist_fetches.len(), 2);
    }

    #[test]
    fn malformed_payload_is_reported() {
        let api = FakeApi::default();
        let mut document = gist("abc", "ann", "shader.json", &sample_project());
        if let Some(file) = document.files.get_mut("shader.json") {
            file.content = Some("not json".into());
        }
        api.0.borrow_mut().gists.insert("abc".into(), document);
        let mut client = client(&api);
        let err = client.load("abc").unwrap_err();
        assert!(matches!(err, GistError::Parse { .. }));
        assert!(client.history().is_empty());
    }

    #[test]
    fn save_requires_login() {
        let api = FakeApi::default();
        let mut client = client(&api);
        let err = client.save("demo", &sample_project()).unwrap_err();
        assert!(matches!(err, GistError::NotLoggedIn));
        assert!(api.0.borrow().created.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let api = FakeApi::default();
        api.0.borrow_mut().valid_tokens.push("tok".into());
        let mut saver = client(&api);
        saver.login("tok").unwrap();

        let project = sample_project();
        let saved = saver.save("demo.frag", &project).unwrap();
        assert_eq!(saved.filename, "demo.json");
        assert_eq!(saver.history().last().unwrap().gist_id, saved.id);

        let mut loader = client(&api);
        let loaded = loader.load(&saved.id).unwrap().unwrap();
        assert!(loaded.project.same_content(&project));
        assert_eq!(loaded.project.history.last().unwrap().gist_id, saved.id);
    }

    #[test]
    fn save_prunes_deleted_gists_but_keeps_unreachable_ones() {
        let api = FakeApi::default();
        let mut project = sample_project();
        project.history = vec![
            HistoryEntry::new("gone", Some(owner("ann"))),
            HistoryEntry::new("flaky", Some(owner("bob"))),
        ];
        {
            let mut state = api.0.borrow_mut();
            state.valid_tokens.push("tok".into());
            state
                .gists
                .insert("abc".into(), gist("abc", "carol", "shader.json", &project));
            state.offline_ids.push("flaky".into());
        }
        let mut client = client(&api);
        client.login("tok").unwrap();
        client.load("abc").unwrap();
        assert_eq!(client.history().len(), 3);

        let saved = client.save("fork", &sample_project()).unwrap();

        let ids: Vec<_> = client
            .history()
            .entries()
            .iter()
            .map(|entry| entry.gist_id.clone())
            .collect();
        assert_eq!(ids, vec!["flaky".to_string(), "abc".to_string(), saved.id.clone()]);

        let created = api.0.borrow().created[0].clone();
        let payload: ShaderProject =
            serde_json::from_str(&created.files["fork.json"].content).unwrap();
        assert_eq!(payload.history.len(), 2);
        assert!(created.public);
    }

    #[test]
    fn failed_save_leaves_history_untouched() {
        let api = FakeApi::default();
        {
            let mut state = api.0.borrow_mut();
            state.valid_tokens.push("tok".into());
            state.fail_create = true;
        }
        let mut client = client(&api);
        client.login("tok").unwrap();
        let before = client.history().clone();
        assert!(client.save("demo", &sample_project()).is_err());
        assert_eq!(client.history(), &before);
        assert!(client.is_logged_in());
    }

    #[test]
    fn rejected_token_forces_logout() {
        let api = FakeApi::default();
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "stale").unwrap();
        let mut client = GistClient::new(Box::new(api.clone()), Box::new(store));
        assert!(client.is_logged_in());

        let err = client.validate().unwrap_err();
        assert!(matches!(err, GistError::Unauthorized));
        assert!(!client.is_logged_in());
        assert!(client.username().is_none());
    }

    #[test]
    fn restores_history_from_store() {
        let api = FakeApi::default();
        let mut store = MemoryStore::new();
        let entries = vec![HistoryEntry::new("a", None), HistoryEntry::new("b", None)];
        store
            .set(HISTORY_KEY, &serde_json::to_string(&entries).unwrap())
            .unwrap();
        let client = GistClient::new(Box::new(api), Box::new(store));
        assert_eq!(client.history().len(), 2);
    }

    #[test]
    fn json_filename_replaces_extension() {
        assert_eq!(json_filename("demo"), "demo.json");
        assert_eq!(json_filename("demo.frag"), "demo.json");
        assert_eq!(json_filename("demo.json"), "demo.json");
        assert_eq!(json_filename(""), "shader.json");
        assert_eq!(json_filename(".hidden"), ".hidden.json");
        assert_eq!(json_filename(".json"), ".json.json");
        assert_eq!(json_filename("v1.2 demo"), "v1.2 demo.json");
        assert_eq!(json_filename("demo.glsl"), "demo.json");
    }
}
