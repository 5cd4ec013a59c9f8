//! Remote blob container.
//!
//! The sync engine talks to an authenticated container of named text blobs
//! through the [`RemoteStore`] trait: `create`, `get`, `update`. The
//! concrete binding is a GitHub gist ([`GistStore`]), but nothing above
//! this module depends on the wire format.

use std::collections::BTreeMap;

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RemoteError, Result};

/// A fetched container with all file contents materialized.
#[derive(Debug, Clone)]
pub struct RemoteContainer {
    pub id: String,
    pub owner: Option<String>,
    pub files: BTreeMap<String, String>,
}

/// The blob container contract.
pub trait RemoteStore {
    /// Create a new container holding `files`; returns it with its id.
    fn create(&self, files: &BTreeMap<String, String>) -> Result<RemoteContainer>;

    /// Fetch a container by id.
    fn get(&self, id: &str) -> Result<RemoteContainer>;

    /// Replace the given files in an existing container.
    fn update(&self, id: &str, files: &BTreeMap<String, String>) -> Result<()>;
}

const API_BASE: &str = "https://api.github.com/gists";
const DESCRIPTION: &str = "Cloak encrypted secrets";

#[derive(Deserialize)]
struct GistFile {
    #[serde(default)]
    content: String,
    #[serde(default)]
    raw_url: Option<String>,
}

#[derive(Deserialize)]
struct GistOwner {
    login: String,
}

#[derive(Deserialize)]
struct GistResponse {
    id: String,
    #[serde(default)]
    files: BTreeMap<String, GistFile>,
    owner: Option<GistOwner>,
}

#[derive(Serialize)]
struct FilePayload<'a> {
    content: &'a str,
}

/// GitHub gist binding for the blob container contract.
pub struct GistStore {
    client: Client,
    token: String,
}

impl GistStore {
    pub fn new(token: &str) -> Self {
        Self {
            client: Client::new(),
            token: token.trim().to_string(),
        }
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", "cloak")
            .bearer_auth(&self.token)
    }

    fn check(
        operation: &'static str,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response> {
        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::Api {
                operation,
                status: status.as_u16(),
                body: body.trim().to_string(),
            }
            .into());
        }
        Ok(response)
    }

    /// Materialize a gist response, fetching raw URLs for files whose
    /// inline content was elided or truncated by the API.
    fn into_container(&self, gist: GistResponse) -> RemoteContainer {
        let mut files = BTreeMap::new();
        for (name, file) in gist.files {
            let content = if file.content.is_empty() {
                file.raw_url
                    .as_deref()
                    .and_then(|url| self.fetch_raw(url).ok())
                    .unwrap_or_default()
            } else {
                file.content
            };
            files.insert(name, content);
        }
        RemoteContainer {
            id: gist.id,
            owner: gist.owner.map(|o| o.login),
            files,
        }
    }

    fn fetch_raw(&self, url: &str) -> Result<String> {
        debug!(url, "fetching raw blob content");
        let response = self
            .client
            .get(url)
            .header("User-Agent", "cloak")
            .send()
            .map_err(RemoteError::Http)?;
        let response = Self::check("raw fetch", response)?;
        Ok(response.text().map_err(RemoteError::Http)?)
    }

    fn file_payloads<'a>(
        files: &'a BTreeMap<String, String>,
    ) -> BTreeMap<&'a str, FilePayload<'a>> {
        files
            .iter()
            .map(|(name, content)| (name.as_str(), FilePayload { content }))
            .collect()
    }
}

impl RemoteStore for GistStore {
    fn create(&self, files: &BTreeMap<String, String>) -> Result<RemoteContainer> {
        #[derive(Serialize)]
        struct CreatePayload<'a> {
            description: &'a str,
            public: bool,
            files: BTreeMap<&'a str, FilePayload<'a>>,
        }

        debug!(files = files.len(), "creating remote container");
        let response = self
            .request(self.client.post(API_BASE))
            .json(&CreatePayload {
                description: DESCRIPTION,
                public: false,
                files: Self::file_payloads(files),
            })
            .send()
            .map_err(RemoteError::Http)?;
        let response = Self::check("create", response)?;

        let gist: GistResponse = response.json().map_err(RemoteError::Http)?;
        Ok(self.into_container(gist))
    }

    fn get(&self, id: &str) -> Result<RemoteContainer> {
        debug!(id, "fetching remote container");
        let response = self
            .request(self.client.get(format!("{API_BASE}/{id}")))
            .send()
            .map_err(RemoteError::Http)?;
        let response = Self::check("get", response)?;

        let gist: GistResponse = response.json().map_err(RemoteError::Http)?;
        Ok(self.into_container(gist))
    }

    fn update(&self, id: &str, files: &BTreeMap<String, String>) -> Result<()> {
        #[derive(Serialize)]
        struct UpdatePayload<'a> {
            files: BTreeMap<&'a str, FilePayload<'a>>,
        }

        debug!(id, files = files.len(), "updating remote container");
        let response = self
            .request(self.client.patch(format!("{API_BASE}/{id}")))
            .json(&UpdatePayload {
                files: Self::file_payloads(files),
            })
            .send()
            .map_err(RemoteError::Http)?;
        Self::check("update", response)?;
        Ok(())
    }
}
