//! GitHub REST API client.
//!
//! Provides a sync HTTP client for the GitHub contents and git data APIs
//! with bearer-token authentication. Every client is bound to a single
//! `owner/repo` and branch.

mod contents;
mod git;

use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::de::DeserializeOwned;
use tracing::debug;
use ureq::Agent;

use crate::error::GithubError;

pub(crate) use contents::Contents;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT: u64 = 30;

/// API version pinned in every request.
const API_VERSION: &str = "2022-11-28";

/// Characters escaped inside a single URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped inside a query parameter value.
const QUERY_VALUE: &AsciiSet = &SEGMENT.add(b'&').add(b'=').add(b'+');

/// HTTP methods that carry a JSON body.
#[derive(Clone, Copy, Debug)]
enum Method {
    Put,
    Post,
    Patch,
    Delete,
}

/// GitHub REST API client for one repository branch.
pub struct GithubClient {
    agent: Agent,
    api_url: String,
    owner: String,
    repo: String,
    branch: String,
    token: String,
}

impl GithubClient {
    /// Create a client.
    ///
    /// # Arguments
    /// * `api_url` - API root, e.g. `https://api.github.com`
    /// * `owner` / `repo` - repository coordinates
    /// * `branch` - branch every read and write targets
    /// * `token` - personal access or OAuth token
    /// * `timeout` - global per-request timeout
    #[must_use]
    pub fn new(
        api_url: &str,
        owner: &str,
        repo: &str,
        branch: &str,
        token: &str,
        timeout: Duration,
    ) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            api_url: api_url.trim_end_matches('/').to_owned(),
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            branch: branch.to_owned(),
            token: token.to_owned(),
        }
    }

    /// Branch this client reads and writes.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Base URL of the repository endpoints.
    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_url,
            utf8_percent_encode(&self.owner, SEGMENT),
            utf8_percent_encode(&self.repo, SEGMENT)
        )
    }

    /// URL of a repository-relative path under `/contents`.
    fn contents_url(&self, path: &str) -> String {
        let encoded = encode_path(path);
        if encoded.is_empty() {
            format!("{}/contents", self.repo_url())
        } else {
            format!("{}/contents/{encoded}", self.repo_url())
        }
    }

    /// `ref=` query value for the branch.
    fn branch_query(&self) -> String {
        utf8_percent_encode(&self.branch, QUERY_VALUE).to_string()
    }

    /// Add authentication and API headers.
    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        request
            .header("Authorization", &format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", concat!("quire/", env!("CARGO_PKG_VERSION")))
    }

    /// GET a JSON resource.
    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GithubError> {
        debug!("GET {url}");
        let response = self.authorize(self.agent.get(url)).call()?;
        Ok(check_status(response)?.read_json()?)
    }

    /// Send a JSON body and decode the JSON response.
    fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<T, GithubError> {
        debug!("{method:?} {url}");
        let body = serde_json::to_vec(payload)?;
        let request = match method {
            Method::Put => self.agent.put(url),
            Method::Post => self.agent.post(url),
            Method::Patch => self.agent.patch(url),
            Method::Delete => self.agent.delete(url).force_send_body(),
        };
        let response = self
            .authorize(request)
            .header("Content-Type", "application/json")
            .send(&body[..])?;
        Ok(check_status(response)?.read_json()?)
    }
}

/// Turn error statuses into [`GithubError::HttpResponse`].
fn check_status(response: ureq::http::Response<ureq::Body>) -> Result<ureq::Body, GithubError> {
    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(GithubError::HttpResponse {
            status,
            body: error_body,
        });
    }

    Ok(body)
}

/// Percent-encode each segment of a repository-relative path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
