//! Template archive retrieval from a remote repository or local directory
//!
//! Every source produces the same thing: a gzip tarball whose template files
//! live under `<root>/templates/<name>/`.
//! - Remote: downloads the repository tarball from the hosting API
//! - Local: packs a local templates folder in memory
//! - Archive: reads a prebuilt tarball from disk

use super::packer;
use crate::error::{GenerateError, Result};
use crate::product::ProductConfig;
use crate::progress::ProgressReporter;
use anyhow::Context;
use reqwest::header::{HeaderValue, ACCEPT, LOCATION};
use reqwest::{Response, StatusCode};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use url::Url;

/// Timeout for the whole download, redirect included
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const ACCEPT_HEADER: &str = "application/vnd.github+json";

/// Repository coordinates for a remote tarball
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    api_base: Url,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RemoteRepo {
    pub fn new(api_base: Url, owner: &str, repo: &str, branch: &str) -> anyhow::Result<Self> {
        if api_base.cannot_be_a_base() {
            anyhow::bail!("API URL cannot have path segments: {}", api_base);
        }
        if owner.is_empty() || repo.is_empty() || branch.is_empty() {
            anyhow::bail!("Repository owner, name and branch must not be empty");
        }
        Ok(Self {
            api_base,
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
        })
    }

    /// Parse `owner/repo` or `owner/repo@branch`
    pub fn parse(api_base: Url, spec: &str, default_branch: &str) -> anyhow::Result<Self> {
        let (name, branch) = match spec.split_once('@') {
            Some((name, branch)) => (name, branch),
            None => (spec, default_branch),
        };
        let (owner, repo) = name
            .split_once('/')
            .with_context(|| format!("Invalid repository '{}', expected owner/repo", spec))?;
        Self::new(api_base, owner, repo, branch)
    }

    /// `<api>/repos/<owner>/<repo>/tarball/<branch>`
    pub fn tarball_url(&self) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "repos",
                self.owner.as_str(),
                self.repo.as_str(),
                "tarball",
                self.branch.as_str(),
            ]);
        }
        url
    }
}

/// Template source - remote repository, local directory or tarball file
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Remote(RemoteRepo),
    Local(PathBuf),
    Archive(PathBuf),
}

impl TemplateSource {
    /// Create a remote template source from a product config and env overrides
    pub fn from_config<C: ProductConfig>(config: &C) -> anyhow::Result<Self> {
        let api_str = std::env::var(config.api_url_env())
            .unwrap_or_else(|_| config.api_base_url().to_string());
        let api_base =
            Url::parse(&api_str).with_context(|| format!("Invalid API URL: {}", api_str))?;

        let repo = match std::env::var(config.template_repo_env()) {
            Ok(spec) => RemoteRepo::parse(api_base, &spec, config.template_branch())
                .with_context(|| format!("Invalid {}", config.template_repo_env()))?,
            Err(_) => RemoteRepo::new(
                api_base,
                config.template_owner(),
                config.template_repo(),
                config.template_branch(),
            )?,
        };
        Ok(Self::Remote(repo))
    }

    /// Create a local template source from a templates directory
    pub fn local(path: PathBuf) -> Self {
        Self::Local(path)
    }

    /// Create a source reading a prebuilt tarball
    pub fn archive(path: PathBuf) -> Self {
        Self::Archive(path)
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
}

/// Resolve the `Location` of a redirect against the URL that produced it
fn redirect_target(url: &Url, response: &Response) -> Result<Url> {
    let location = location(response).ok_or_else(|| GenerateError::MissingLocation {
        url: url.to_string(),
    })?;
    url.join(location)
        .map_err(|source| GenerateError::InvalidLocation {
            location: location.to_string(),
            source,
        })
}

fn request_error(url: &Url, err: reqwest::Error) -> GenerateError {
    if err.is_timeout() {
        GenerateError::Timeout {
            url: url.to_string(),
        }
    } else {
        GenerateError::Transport {
            url: url.to_string(),
            source: err,
        }
    }
}

/// Template fetcher - produces the template archive from its source
pub struct TemplateFetcher {
    source: TemplateSource,
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl TemplateFetcher {
    /// Create a new fetcher with a custom user agent
    pub fn new(source: TemplateSource, user_agent: &str) -> Result<Self> {
        let client = Self::client_builder(user_agent, DEFAULT_TIMEOUT)
            .build()
            .map_err(GenerateError::Client)?;
        Ok(Self::with_client(source, client))
    }

    /// Client settings the fetcher relies on: redirects are handled by hand
    pub fn client_builder(user_agent: &str, timeout: Duration) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
    }

    /// Create a fetcher around a preconfigured client
    pub fn with_client(source: TemplateSource, client: reqwest::Client) -> Self {
        Self {
            source,
            client,
            auth_token: None,
        }
    }

    /// Send a bearer token with the first remote request
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    /// Create a fetcher from a product config
    pub fn from_config<C: ProductConfig>(config: &C) -> anyhow::Result<Self> {
        let source = TemplateSource::from_config(config)?;
        let token = std::env::var(config.token_env())
            .ok()
            .filter(|token| !token.is_empty());
        Ok(Self::new(source, config.user_agent())?.with_auth_token(token))
    }

    /// Create a fetcher for local templates
    pub fn from_local(path: PathBuf, user_agent: &str) -> Result<Self> {
        Self::new(TemplateSource::local(path), user_agent)
    }

    /// Get the template source
    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Produce the complete template archive as gzip tarball bytes
    pub async fn fetch_archive(&self, reporter: &dyn ProgressReporter) -> Result<Vec<u8>> {
        match &self.source {
            TemplateSource::Remote(repo) => self.fetch_remote(repo, reporter).await,
            TemplateSource::Local(path) => {
                tracing::info!(path = %path.display(), "packing local templates");
                let bytes =
                    packer::pack_templates_dir(path).map_err(|source| GenerateError::Local {
                        path: path.clone(),
                        source,
                    })?;
                reporter.downloaded(bytes.len() as u64);
                Ok(bytes)
            }
            TemplateSource::Archive(path) => {
                tracing::info!(path = %path.display(), "reading template archive");
                let bytes = fs::read(path)
                    .await
                    .map_err(|source| GenerateError::Local {
                        path: path.clone(),
                        source,
                    })?;
                reporter.downloaded(bytes.len() as u64);
                Ok(bytes)
            }
        }
    }

    async fn fetch_remote(
        &self,
        repo: &RemoteRepo,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<u8>> {
        let url = repo.tarball_url();
        tracing::info!(%url, "downloading template archive");

        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| request_error(&url, e))?;

        let (url, mut response) = if is_redirect(response.status()) {
            let target = redirect_target(&url, &response)?;
            tracing::debug!(from = %url, to = %target, "following redirect");

            // Only the client's own user agent goes along on the second hop
            let redirected = self
                .client
                .get(target.clone())
                .send()
                .await
                .map_err(|e| request_error(&target, e))?;

            if is_redirect(redirected.status()) {
                return Err(GenerateError::TooManyRedirects {
                    url: target.to_string(),
                    location: location(&redirected).unwrap_or_default().to_string(),
                });
            }
            (target, redirected)
        } else {
            (url, response)
        };

        if response.status() != StatusCode::OK {
            return Err(GenerateError::Http {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| request_error(&url, e))? {
            body.extend_from_slice(&chunk);
            reporter.downloaded(body.len() as u64);
        }

        tracing::info!(bytes = body.len(), "template archive downloaded");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CountingProgress, SilentProgress};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    enum Reply {
        Respond(Vec<u8>),
        Hang,
    }

    fn reply(status: &str, headers: &[(&str, String)], body: &[u8]) -> Reply {
        let mut raw = format!(
            "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n",
            status,
            body.len()
        );
        for (name, value) in headers {
            raw.push_str(&format!("{}: {}\r\n", name, value));
        }
        raw.push_str("\r\n");
        let mut raw = raw.into_bytes();
        raw.extend_from_slice(body);
        Reply::Respond(raw)
    }

    /// Minimal HTTP server answering one connection per scripted reply
    struct StubServer {
        base: Url,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl StubServer {
        async fn start(script: impl FnOnce(&Url) -> Vec<Reply>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();
            let replies = script(&base);
            let requests = Arc::new(Mutex::new(Vec::new()));

            let log = Arc::clone(&requests);
            tokio::spawn(async move {
                for reply in replies {
                    let Ok((mut socket, _)) = listener.accept().await else {
                        return;
                    };
                    let mut head = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => head.extend_from_slice(&buf[..n]),
                        }
                    }
                    log.lock()
                        .unwrap()
                        .push(String::from_utf8_lossy(&head).to_lowercase());

                    match reply {
                        Reply::Respond(raw) => {
                            let _ = socket.write_all(&raw).await;
                            let _ = socket.shutdown().await;
                        }
                        Reply::Hang => {
                            tokio::time::sleep(Duration::from_secs(30)).await;
                        }
                    }
                }
            });

            Self { base, requests }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn fetcher(&self, timeout: Duration) -> TemplateFetcher {
            let repo = RemoteRepo::new(self.base.clone(), "acme", "starters", "main").unwrap();
            let client = TemplateFetcher::client_builder("starter-test", timeout)
                .no_proxy()
                .build()
                .unwrap();
            TemplateFetcher::with_client(TemplateSource::Remote(repo), client)
        }
    }

    #[test]
    fn test_tarball_url() {
        let api = Url::parse("https://api.github.com").unwrap();
        let repo = RemoteRepo::new(api, "acme", "starters", "main").unwrap();
        assert_eq!(
            repo.tarball_url().as_str(),
            "https://api.github.com/repos/acme/starters/tarball/main"
        );
    }

    #[test]
    fn test_parse_repo_spec() {
        let api = Url::parse("https://api.github.com").unwrap();

        let repo = RemoteRepo::parse(api.clone(), "acme/starters@dev", "main").unwrap();
        assert_eq!((repo.owner.as_str(), repo.branch.as_str()), ("acme", "dev"));

        let repo = RemoteRepo::parse(api.clone(), "acme/starters", "main").unwrap();
        assert_eq!(repo.branch, "main");

        assert!(RemoteRepo::parse(api, "starters", "main").is_err());
    }

    #[tokio::test]
    async fn test_fetches_body_and_reports_progress() {
        let body = vec![7u8; 4096];
        let served = body.clone();
        let server =
            StubServer::start(move |_| vec![reply("200 OK", &[], &served)]).await;

        let progress = CountingProgress::new();
        let fetcher = server
            .fetcher(DEFAULT_TIMEOUT)
            .with_auth_token(Some("secret".to_string()));
        let bytes = fetcher.fetch_archive(&progress).await.unwrap();

        assert_eq!(bytes, body);
        assert_eq!(progress.bytes(), 4096);

        let requests = server.requests();
        assert!(requests[0].starts_with("get /repos/acme/starters/tarball/main "));
        assert!(requests[0].contains("user-agent: starter-test"));
        assert!(requests[0].contains("accept: application/vnd.github+json"));
        assert!(requests[0].contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn test_follows_one_redirect_without_auth() {
        let server = StubServer::start(|base| {
            vec![
                reply("302 Found", &[("location", format!("{}codeload/tar", base))], b""),
                reply("200 OK", &[], b"archive"),
            ]
        })
        .await;

        let fetcher = server
            .fetcher(DEFAULT_TIMEOUT)
            .with_auth_token(Some("secret".to_string()));
        let bytes = fetcher.fetch_archive(&SilentProgress).await.unwrap();

        assert_eq!(bytes, b"archive");
        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].starts_with("get /codeload/tar "));
        assert!(requests[1].contains("user-agent: starter-test"));
        assert!(!requests[1].contains("authorization"));
        assert!(!requests[1].contains("application/vnd.github+json"));
    }

    #[tokio::test]
    async fn test_relative_redirect_is_resolved() {
        let server = StubServer::start(|_| {
            vec![
                reply("301 Moved Permanently", &[("location", "/mirror".to_string())], b""),
                reply("200 OK", &[], b"mirrored"),
            ]
        })
        .await;

        let bytes = server
            .fetcher(DEFAULT_TIMEOUT)
            .fetch_archive(&SilentProgress)
            .await
            .unwrap();
        assert_eq!(bytes, b"mirrored");
        assert!(server.requests()[1].starts_with("get /mirror "));
    }

    #[tokio::test]
    async fn test_second_redirect_fails() {
        let server = StubServer::start(|base| {
            vec![
                reply("302 Found", &[("location", format!("{}one", base))], b""),
                reply("302 Found", &[("location", format!("{}two", base))], b""),
            ]
        })
        .await;

        let err = server
            .fetcher(DEFAULT_TIMEOUT)
            .fetch_archive(&SilentProgress)
            .await
            .unwrap_err();
        match err {
            GenerateError::TooManyRedirects { url, location } => {
                assert!(url.ends_with("/one"));
                assert!(location.ends_with("/two"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_redirect_without_location_fails() {
        let server = StubServer::start(|_| vec![reply("302 Found", &[], b"")]).await;

        let err = server
            .fetcher(DEFAULT_TIMEOUT)
            .fetch_archive(&SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::MissingLocation { .. }));
    }

    #[tokio::test]
    async fn test_non_ok_status_fails_with_status() {
        let server = StubServer::start(|_| vec![reply("404 Not Found", &[], b"missing")]).await;

        let err = server
            .fetcher(DEFAULT_TIMEOUT)
            .fetch_archive(&SilentProgress)
            .await
            .unwrap_err();
        match err {
            GenerateError::Http { status, .. } => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = StubServer::start(|_| vec![Reply::Hang]).await;

        let err = server
            .fetcher(Duration::from_millis(200))
            .fetch_archive(&SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_local_source_packs_templates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("basic/src")).unwrap();
        std::fs::write(dir.path().join("basic/src/index.js"), "hi").unwrap();

        let fetcher =
            TemplateFetcher::from_local(dir.path().to_path_buf(), "starter-test").unwrap();
        let bytes = fetcher.fetch_archive(&SilentProgress).await.unwrap();

        let files = crate::templates::select_template(&bytes, "basic").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "src/index.js");
    }

    #[tokio::test]
    async fn test_default_client_leaves_redirects_to_the_fetcher() {
        // The default client picks up system proxies, which would intercept loopback
        let proxied = ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]
            .iter()
            .any(|var| std::env::var_os(var).is_some());
        if proxied {
            return;
        }

        let server = StubServer::start(|base| {
            vec![
                reply("302 Found", &[("location", format!("{}one", base))], b""),
                reply("302 Found", &[("location", format!("{}two", base))], b""),
                reply("200 OK", &[], b"too far"),
            ]
        })
        .await;
        let repo = RemoteRepo::new(server.base.clone(), "acme", "starters", "main").unwrap();
        let fetcher = TemplateFetcher::new(TemplateSource::Remote(repo), "starter-test").unwrap();

        let err = fetcher.fetch_archive(&SilentProgress).await.unwrap_err();
        assert!(matches!(err, GenerateError::TooManyRedirects { .. }));
        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_archive_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = TemplateSource::archive(dir.path().join("nope.tar.gz"));
        let fetcher = TemplateFetcher::new(source, "starter-test").unwrap();

        let err = fetcher.fetch_archive(&SilentProgress).await.unwrap_err();
        assert!(matches!(err, GenerateError::Local { .. }));
    }
}
