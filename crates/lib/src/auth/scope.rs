//! Which request paths the gate applies to.

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Exact(String),
    /// The prefix itself or anything below it.
    Subtree(String),
}

impl PathPattern {
    /// `/prefix/*` and `/prefix/:name*` are subtrees; anything else is an exact path.
    fn parse(pattern: &str) -> Self {
        let p = pattern.trim();
        if let Some(prefix) = p.strip_suffix("/*") {
            return Self::Subtree(prefix.to_string());
        }
        if let Some((prefix, last)) = p.rsplit_once('/') {
            if last.starts_with(':') && last.ends_with('*') {
                return Self::Subtree(prefix.to_string());
            }
        }
        Self::Exact(p.to_string())
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == p,
            Self::Subtree(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

/// Allow-list and deny-list of path patterns. Exclusions win.
#[derive(Debug, Clone)]
pub struct RouteScope {
    include: Vec<PathPattern>,
    exclude: Vec<PathPattern>,
}

impl RouteScope {
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            include: include
                .into_iter()
                .map(|p| PathPattern::parse(p.as_ref()))
                .collect(),
            exclude: exclude
                .into_iter()
                .map(|p| PathPattern::parse(p.as_ref()))
                .collect(),
        }
    }

    pub fn applies_to(&self, path: &str) -> bool {
        if self.exclude.iter().any(|p| p.matches(path)) {
            return false;
        }
        self.include.iter().any(|p| p.matches(path))
    }
}
