use std::time::Duration;

use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::cancel::{CancellationToken, run_cancellable};
use crate::error::{Result, Tf2d2Error};

pub const DEFAULT_HOSTNAME: &str = "app.terraform.io";
pub const TOKEN_ENV: &str = "TF_API_TOKEN";

const CONTENT_TYPE: &str = "application/vnd.api+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Current state version of a workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateVersion {
    pub id: String,
    pub resources_processed: bool,
    pub download_url: Option<String>,
}

/// Terraform API operations needed to fetch remote state
pub trait StateVersionApi {
    /// Resolve a workspace id from organization and workspace names
    fn read_workspace(&self, organization: &str, workspace: &str) -> Result<String>;

    /// Read the current state version descriptor of a workspace
    fn read_current_state_version(&self, workspace_id: &str) -> Result<StateVersion>;

    /// Download raw state JSON from a state version's download URL
    fn download(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Deserialize)]
struct Document<T> {
    data: T,
}

#[derive(Deserialize)]
struct WorkspaceData {
    id: String,
}

#[derive(Deserialize)]
struct StateVersionData {
    id: String,
    #[serde(default)]
    attributes: StateVersionAttributes,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct StateVersionAttributes {
    #[serde(default)]
    resources_processed: bool,
    hosted_state_download_url: Option<String>,
}

/// Blocking client for the Terraform Cloud / Enterprise API.
///
/// Requests run on a worker thread so an in-flight call stops as soon as the
/// cancellation token fires.
pub struct TfeClient {
    http: reqwest::blocking::Client,
    base: Url,
    token: String,
    cancel: CancellationToken,
}

impl TfeClient {
    /// Client for `https://<hostname>`; the token falls back to `TF_API_TOKEN`
    pub fn new(hostname: Option<&str>, token: Option<&str>) -> Result<Self> {
        let hostname = hostname
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_HOSTNAME);
        let base = Url::parse(&format!("https://{}", hostname))
            .map_err(|e| Tf2d2Error::Config(format!("invalid hostname '{}': {}", hostname, e)))?;

        let token = match token.filter(|t| !t.is_empty()) {
            Some(token) => token.to_string(),
            None => std::env::var(TOKEN_ENV).unwrap_or_default(),
        };

        Self::with_base_url(base, token)
    }

    pub fn with_base_url(base: Url, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Tf2d2Error::Config(
                "Terraform API token is not set".to_string(),
            ));
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("tf2d2/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Tf2d2Error::Network(format!("error creating http client: {}", e)))?;

        Ok(Self {
            http,
            base,
            token,
            cancel: CancellationToken::new(),
        })
    }

    /// Abort in-flight requests with `Cancelled` once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Tf2d2Error::Config(format!("invalid API address: {}", self.base)))?
            .pop_if_empty()
            .extend(["api", "v2"])
            .extend(segments);
        Ok(url)
    }

    /// Send a request and read the whole body, mapping transport failures with `fail`
    fn send<F>(&self, request: RequestBuilder, fail: F) -> Result<(StatusCode, Vec<u8>)>
    where
        F: Fn(reqwest::Error) -> Tf2d2Error + Send + 'static,
    {
        run_cancellable(&self.cancel, move || {
            let response = request.send().map_err(&fail)?;
            let status = response.status();
            let body = response.bytes().map_err(&fail)?;
            Ok((status, body.to_vec()))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = url.as_str(); "terraform API request");

        let request = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE);
        let target = url.to_string();
        let (status, body) = self.send(request, move |e| {
            Tf2d2Error::Upstream(format!("request to {} failed: {}", target, e))
        })?;

        if !status.is_success() {
            return Err(Tf2d2Error::Upstream(format!(
                "request to {} failed with status {}",
                url, status
            )));
        }

        serde_json::from_slice(&body)
            .map_err(|e| Tf2d2Error::Upstream(format!("invalid response from {}: {}", url, e)))
    }
}

impl StateVersionApi for TfeClient {
    fn read_workspace(&self, organization: &str, workspace: &str) -> Result<String> {
        let url = self.endpoint(&["organizations", organization, "workspaces", workspace])?;
        let document: Document<WorkspaceData> = self.get_json(url)?;
        Ok(document.data.id)
    }

    fn read_current_state_version(&self, workspace_id: &str) -> Result<StateVersion> {
        let url = self.endpoint(&["workspaces", workspace_id, "current-state-version"])?;
        let document: Document<StateVersionData> = self.get_json(url)?;
        let data = document.data;

        Ok(StateVersion {
            id: data.id,
            resources_processed: data.attributes.resources_processed,
            download_url: data.attributes.hosted_state_download_url,
        })
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(url).map_err(|e| {
            Tf2d2Error::Network(format!(
                "error making http request to download json state: {}",
                e
            ))
        })?;

        let request = self.http.get(url).bearer_auth(&self.token);
        let (status, body) = self.send(request, |e| {
            Tf2d2Error::Network(format!("error downloading json state: {}", e))
        })?;

        if !status.is_success() {
            return Err(Tf2d2Error::Network(format!(
                "error downloading json state: status {}",
                status
            )));
        }

        debug!(bytes = body.len(); "downloaded json terraform state");
        Ok(body)
    }
}
