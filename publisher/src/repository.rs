//! Git remote URL parsing

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// `git@host:owner/repo`
static SCP: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^:@/]+@[^:]+:/?([^/]+)/(.+[^/])/?$").ok());
static SCP_SLASHES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^:@/]+@[^:]+:/?(.+)/([^/]+)/?$").ok());

/// `ssh://git@host[:port]/owner/repo`
static SSH: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^ssh://(?:[^:@/]+@)?[^:]+(?::[0-9]+)?[:/]([^/:]+)/(.+[^/])/?$").ok()
});
static SSH_SLASHES: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^ssh://(?:[^:@/]+@)?[^:/]+(?::[0-9]+)?[:/]([^:]+)/([^/]+)/?$").ok()
});

/// Owner and name of a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn strip_git_suffix(repo: &str) -> &str {
    repo.strip_suffix(".git").unwrap_or(repo)
}

/// Parse a git remote URL into owner and repository name
///
/// `path_prefix` is set for servers hosting repositories below a path
/// (e.g. `/gitlab`), in which case the owner may itself contain slashes.
pub fn parse_repository(uri: &str, path_prefix: Option<&str>) -> Option<Repository> {
    let (scp, ssh) = match path_prefix {
        None => (&*SCP, &*SSH),
        Some(_) => (&*SCP_SLASHES, &*SSH_SLASHES),
    };

    for pattern in [scp, ssh].into_iter().flatten() {
        if let Some(caps) = pattern.captures(uri) {
            let owner = caps.get(1)?.as_str();
            let repo = caps.get(2)?.as_str();
            return Some(Repository::new(owner, strip_git_suffix(repo)));
        }
    }

    let url = match url::Url::parse(uri) {
        Ok(url) => url,
        Err(e) => {
            warn!("Cannot parse Git repository url {}: {}", uri, e);
            return None;
        }
    };

    let path = url.path();
    let path = path.strip_suffix('/').unwrap_or(path);
    if let Some(last_slash) = path.rfind('/').filter(|i| *i > 0) {
        let repo = strip_git_suffix(&path[last_slash + 1..]);
        let owner_start = match path_prefix {
            Some(prefix) => Some(prefix.len()),
            None => path[..last_slash].rfind('/'),
        };
        if let Some(owner) = owner_start.and_then(|start| path.get(start..last_slash)) {
            let owner = owner.strip_prefix('/').unwrap_or(owner);
            return Some(Repository::new(owner, repo));
        }
    }

    warn!("Cannot parse Git repository url {}", uri);
    None
}
