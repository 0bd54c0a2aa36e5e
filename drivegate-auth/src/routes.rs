// Protected route matching.

use drivegate_core::ResolvedPath;

/// Path prefixes whose content requires a credential.
///
/// Matching is case-insensitive (the drive ignores case) and component-wise:
/// `/private` protects `/private/a.txt` but not `/private-notes.txt`.
#[derive(Debug, Clone, Default)]
pub struct ProtectedRoutes {
    /// Lower-cased, each with exactly one trailing `/`
    routes: Vec<String>,
}

impl ProtectedRoutes {
    pub fn new<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let routes = routes
            .into_iter()
            .map(|r| r.as_ref().trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .map(|r| format!("{}/", r.trim_end_matches('/')))
            .collect();
        Self { routes }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The first configured route containing `path`, with trailing `/`.
    pub fn matching_route(&self, path: &ResolvedPath) -> Option<&str> {
        let candidate = format!("{}/", path.as_str().to_lowercase());
        self.routes
            .iter()
            .find(|route| candidate.starts_with(route.as_str()))
            .map(String::as_str)
    }
}
