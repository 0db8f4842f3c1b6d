//! API constants.

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

pub const API_VERSION: &str = "v1";

/// Versioned prefix every resource route is mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Where the file-read endpoint is mounted. Local storage resolves keys to URLs under it.
pub const FILES_PREFIX: &str = "/api/v1/files";

pub const OPENAPI_PATH: &str = "/api/openapi.json";
