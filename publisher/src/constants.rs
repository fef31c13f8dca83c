//! Parameter names and fixed values shared with the CI server

/// Build feature type of the publisher feature
pub const BUILD_FEATURE_NAME: &str = "deployments-status-publisher";

// Build feature parameters
pub const PUBLISHER_ID_PARAM: &str = "publisherId";
pub const VCS_ROOT_ID_PARAM: &str = "vcsRootId";
pub const CREATE_DEPLOYMENT_PARAM: &str = "createDeployment";
pub const TARGET_ENVIRONMENT_PARAM: &str = "targetEnvironment";
pub const TARGET_ENVIRONMENT_DEFAULT: &str = "production";

/// Shared build parameter carrying the created deployment id
pub const DEPLOYMENT_ID_PARAM_KEY: &str = "deployments-status-publisher.deploymentId";

/// Key of the build id inside a deployment payload
pub const BUILD_ID_KEY: &str = "buildIdAsString";

// Build configuration parameters
pub const PUBLISHING_ENABLED_PROPERTY_NAME: &str = "teamcity.deploymentsStatusPublisher.enabled";
pub const FAIL_BUILD_ON_PUBLISH_ERROR_PARAM: &str =
    "teamcity.deploymentsStatusPublisher.failBuildOnPublishError";
pub const GITHUB_CUSTOM_CONTEXT_BUILD_PARAM: &str =
    "teamcity.deploymentsStatusPublisher.githubContext";

// Problems
pub const DEPLOYMENTS_STATUS_PUBLISHER_PROBLEM_TYPE: &str = "DEPLOYMENTS_STATUS_PUBLISHER_PROBLEM";
pub const BUILD_PROBLEM_TYPE: &str = "deploymentsStatusPublisherProblem";
pub const BUILD_PROBLEM_ID_PREFIX: &str = "deploymentsStatusPublisher";

// GitHub feature parameters
pub const GITHUB_PUBLISHER_ID: &str = "githubDeploymentsStatusPublisher";
pub const GITHUB_STATUS_PUBLISHER_ID: &str = "githubStatusPublisher";
pub const GITHUB_SERVER: &str = "github_host";
pub const GITHUB_AUTH_TYPE: &str = "github_authentication_type";
pub const GITHUB_TOKEN: &str = "secure:github_access_token";
pub const GITHUB_CONTEXT: &str = "github_context";
pub const GITHUB_DEFAULT_CONTEXT: &str = "continuous-integration/teamcity";

/// Publisher id of the "choose a publisher" placeholder
pub const DUMMY_PUBLISHER_ID: &str = "--";

/// VCS plugin name of git roots
pub const GIT_VCS_NAME: &str = "jetbrains.git";
