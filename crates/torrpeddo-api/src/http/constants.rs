//! Shared HTTP constants (headers, problem URIs, limits).

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

pub(crate) const PROBLEM_INTERNAL: &str = "https://torrpeddo.dev/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://torrpeddo.dev/problems/bad-request";
pub(crate) const PROBLEM_CONFLICT: &str = "https://torrpeddo.dev/problems/conflict";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://torrpeddo.dev/problems/not-found";
pub(crate) const PROBLEM_SERVICE_UNAVAILABLE: &str =
    "https://torrpeddo.dev/problems/service-unavailable";

pub(crate) const MAX_METAINFO_BYTES: usize = 5 * 1024 * 1024;
