mod api;
mod client;
mod link;
mod model;
mod store;

pub use api::{
    ApiError, GistApi, GistDocument, GistFile, HttpGistApi, Identity, NewGist, NewGistFile,
};
pub use client::{
    json_filename, Attribution, AuthorLink, GistClient, GistError, LoadState, LoadedGist,
    OriginLink, SavedGist, PREFERRED_FILENAME,
};
pub use link::{gist_id_from_url, share_url, GIST_QUERY_PARAM};
pub use model::{AssetMap, History, HistoryEntry, Owner, ShaderProject};
pub use store::{LocalStore, MemoryStore, StoreError, HISTORY_KEY, TOKEN_KEY};
