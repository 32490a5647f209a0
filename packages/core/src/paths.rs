//! Object names and path helpers shared with the CI system that writes the layout.
//!
//! All paths are blob-store keys: forward-slash separated, no leading slash.

/// Object under a job prefix holding the latest build number.
pub const LATEST_BUILD: &str = "latest-build.txt";
/// Object under a build prefix holding the build log.
pub const BUILD_LOG: &str = "build-log.txt";
/// Marker written when a build starts.
pub const STARTED_JSON: &str = "started.json";
/// Marker written when a build finishes.
pub const FINISHED_JSON: &str = "finished.json";
/// Directory under a build prefix holding uploaded artifacts.
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Root for periodic and postsubmit job prefixes.
pub const LOGS_ROOT: &str = "logs";
/// Root for presubmit and batch job prefixes.
pub const PR_LOGS_ROOT: &str = "pr-logs/pull";
/// Segment under [`PR_LOGS_ROOT`] for batch jobs.
pub const BATCH_SEGMENT: &str = "batch";

/// Join path segments with `/`, collapsing repeated separators anywhere in
/// the result.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .flat_map(|s| s.as_ref().split('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Last segment of a path, ignoring trailing spaces and slashes.
pub fn last_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches([' ', '/']);
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}
