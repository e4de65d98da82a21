use std::collections::BTreeMap;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Owner;

const USER_AGENT: &str = concat!("shaderdeck/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("invalid api url: {0}")]
    Url(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GistDocument {
    pub id: String,
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GistFile {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub raw_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGist {
    pub description: String,
    pub public: bool,
    pub files: BTreeMap<String, NewGistFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGistFile {
    pub content: String,
}

/// Public profile of an account, as returned by `/user` and `/users/{login}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    pub login: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Remote gist service. `HttpGistApi` talks to GitHub; tests supply fakes.
pub trait GistApi {
    fn get_gist(&self, id: &str, token: Option<&str>) -> Result<GistDocument, ApiError>;
    fn get_raw(&self, url: &str, token: Option<&str>) -> Result<String, ApiError>;
    fn create_gist(&self, gist: &NewGist, token: &str) -> Result<GistDocument, ApiError>;
    fn current_user(&self, token: &str) -> Result<Identity, ApiError>;
    fn user(&self, login: &str, token: Option<&str>) -> Result<Identity, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpGistApi {
    http: Client,
    api_base: Url,
}

impl HttpGistApi {
    pub fn new(api_base: &str) -> Result<Self, ApiError> {
        let api_base = Url::parse(api_base).map_err(|err| ApiError::Url(err.to_string()))?;
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ApiError::Transport {
                url: api_base.to_string(),
                message: err.to_string(),
            })?;
        Ok(Self { http, api_base })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.api_base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::Url(format!("{} cannot be a base", self.api_base)))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, ACCEPT);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(url: &Url, request: RequestBuilder) -> Result<Response, ApiError> {
        debug!(%url, "gist api request");
        let response = request.send().map_err(|err| ApiError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, ApiError> {
        response.json::<T>().map_err(|err| ApiError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

impl GistApi for HttpGistApi {
    fn get_gist(&self, id: &str, token: Option<&str>) -> Result<GistDocument, ApiError> {
        let url = self.endpoint(&["gists", id])?;
        let response = Self::send(&url, Self::authorize(self.http.get(url.clone()), token))?;
        Self::decode(&url, response)
    }

    fn get_raw(&self, raw_url: &str, token: Option<&str>) -> Result<String, ApiError> {
        let url = Url::parse(raw_url).map_err(|err| ApiError::Url(err.to_string()))?;
        let response = Self::send(&url, Self::authorize(self.http.get(url.clone()), token))?;
        response.text().map_err(|err| ApiError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        })
    }

    fn create_gist(&self, gist: &NewGist, token: &str) -> Result<GistDocument, ApiError> {
        let url = self.endpoint(&["gists"])?;
        let request = Self::authorize(self.http.post(url.clone()), Some(token)).json(gist);
        let response = Self::send(&url, request)?;
        Self::decode(&url, response)
    }

    fn current_user(&self, token: &str) -> Result<Identity, ApiError> {
        let url = self.endpoint(&["user"])?;
        let response = Self::send(&url, Self::authorize(self.http.get(url.clone()), Some(token)))?;
        Self::decode(&url, response)
    }

    fn user(&self, login: &str, token: Option<&str>) -> Result<Identity, ApiError> {
        let url = self.endpoint(&["users", login])?;
        let response = Self::send(&url, Self::authorize(self.http.get(url.clone()), token))?;
        Self::decode(&url, response)
    }
}
