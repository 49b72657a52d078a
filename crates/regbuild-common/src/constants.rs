//! System-wide constants: exported variable names, formats and defaults.

/// Build number assigned by the caller.
pub const EXPORT_BUILD_NUMBER: &str = "REGBUILD_BUILD_NUMBER";
/// UTC timestamp captured once when a workflow is compiled.
pub const EXPORT_BUILD_TIMESTAMP: &str = "REGBUILD_BUILD_TIMESTAMP";
/// Target registry of the build request.
pub const EXPORT_DOCKER_REGISTRY: &str = "REGBUILD_DOCKER_REGISTRY";
/// Whether images are pushed once a source's builds succeed.
pub const EXPORT_PUSH_ON_SUCCESS: &str = "REGBUILD_PUSH_ON_SUCCESS";
/// Working directory of the current source.
pub const EXPORT_WORKING_DIR: &str = "REGBUILD_WORKING_DIR";
/// Git repository URL of a git source.
pub const EXPORT_GIT_URL: &str = "REGBUILD_GIT_URL";
/// Git branch of a git source.
pub const EXPORT_GIT_BRANCH: &str = "REGBUILD_GIT_BRANCH";
/// Git revision of a git source.
pub const EXPORT_GIT_REVISION: &str = "REGBUILD_GIT_REVISION";
/// Archive URL of an archive source.
pub const EXPORT_ARCHIVE_URL: &str = "REGBUILD_ARCHIVE_URL";
/// Recipe path of a single-recipe build.
pub const EXPORT_DOCKERFILE_PATH: &str = "REGBUILD_DOCKERFILE_PATH";
/// Build context directory of a single-recipe build.
pub const EXPORT_DOCKER_BUILD_CONTEXT: &str = "REGBUILD_DOCKER_BUILD_CONTEXT";
/// Manifest path of a multi-service build.
pub const EXPORT_DOCKER_COMPOSE_FILE: &str = "REGBUILD_DOCKER_COMPOSE_FILE";
/// Project directory of a multi-service build.
pub const EXPORT_DOCKER_COMPOSE_PROJECT_DIR: &str = "REGBUILD_DOCKER_COMPOSE_PROJECT_DIR";

/// `chrono` format of [`EXPORT_BUILD_TIMESTAMP`].
pub const BUILD_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%Sz";

/// Recipe filename used when a manifest service does not name one.
pub const DEFAULT_RECIPE_FILE: &str = "Dockerfile";

/// Manifest filename used when none is given on the command line.
pub const DEFAULT_MANIFEST_FILE: &str = "docker-compose.yml";

/// Maximum number of rewriting passes the reduction engine performs.
pub const MAX_NESTING_DEPTH: usize = 16;

/// Text substituted for sensitive values in logs.
pub const REDACTED: &str = "*****";

/// Registry assumed for image references without one.
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Tag assumed for image references without one.
pub const DEFAULT_TAG: &str = "latest";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "regbuild";
