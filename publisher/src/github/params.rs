//! GitHub feature parameters

use std::collections::HashMap;

use crate::constants::{
    GITHUB_AUTH_TYPE, GITHUB_CONTEXT, GITHUB_CUSTOM_CONTEXT_BUILD_PARAM, GITHUB_SERVER, GITHUB_TOKEN,
};
use crate::github::updater::AuthenticationType;
use crate::host::{Build, BuildConfiguration};
use crate::http::client::DEFAULT_API_URL;
use crate::publisher::settings::InvalidProperty;

/// Parameters pre-filled for a new GitHub feature
pub fn default_parameters() -> HashMap<String, String> {
    HashMap::from([(GITHUB_SERVER.to_string(), DEFAULT_API_URL.to_string())])
}

/// `true` when the value contains a `%param%` reference resolved later
fn may_contain_reference(value: &str) -> bool {
    value.contains('%')
}

/// Check server URL and credentials
pub fn validate(params: &HashMap<String, String>) -> Vec<InvalidProperty> {
    let mut errors = Vec::new();

    match AuthenticationType::parse(params.get(GITHUB_AUTH_TYPE).map(String::as_str)) {
        Ok(AuthenticationType::Token) => {
            if params.get(GITHUB_TOKEN).is_none_or(|t| t.trim().is_empty()) {
                errors.push(InvalidProperty::new(
                    GITHUB_TOKEN,
                    "Personal Access Token must be specified",
                ));
            }
        }
        Ok(AuthenticationType::Password) => {
            errors.push(InvalidProperty::new(
                GITHUB_AUTH_TYPE,
                "Password authentication is no longer supported by GitHub, use a Personal Access Token",
            ));
        }
        Err(e) => errors.push(InvalidProperty::new(GITHUB_AUTH_TYPE, e.to_string())),
    }

    match params.get(GITHUB_SERVER).map(|s| s.trim()) {
        None | Some("") => {
            errors.push(InvalidProperty::new(GITHUB_SERVER, "GitHub API URL must be specified"));
        }
        Some(url) if may_contain_reference(url) => {}
        Some(url) => {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(InvalidProperty::new(
                    GITHUB_SERVER,
                    "GitHub API URL should start with http:// or https://",
                ));
            }
        }
    }

    errors
}

/// Human-readable summary of the configured target
pub fn describe(prefix: &str, params: &HashMap<String, String>) -> String {
    match params.get(GITHUB_SERVER).map(|s| s.trim()) {
        Some(url) if !url.is_empty() && url != DEFAULT_API_URL => format!("{}: {}", prefix, url),
        _ => prefix.to_string(),
    }
}

/// Status context label for a build
pub fn context(build_type: &BuildConfiguration, build: &Build, params: &HashMap<String, String>) -> String {
    build
        .parameter(GITHUB_CUSTOM_CONTEXT_BUILD_PARAM)
        .or_else(|| build_type.parameter(GITHUB_CUSTOM_CONTEXT_BUILD_PARAM))
        .or_else(|| params.get(GITHUB_CONTEXT))
        .filter(|c| !c.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| format!("{} ({})", build_type.name, build_type.project_name))
}

/// Feature parameters with the status context filled in
pub fn for_build(
    build_type: &BuildConfiguration,
    build: &Build,
    params: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut result = params.clone();
    result.insert(GITHUB_CONTEXT.to_string(), context(build_type, build, params));
    result
}
