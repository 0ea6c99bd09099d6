/// Turns project-relative asset paths into fetchable absolute URLs.
///
/// Pure string transform, no network access. Malformed input degrades to a
/// best-effort joined string rather than an error; this permissiveness is
/// intentional.
#[derive(Clone, Debug)]
pub struct UrlResolver {
    origin: String,
}

impl UrlResolver {
    pub fn new(origin: impl Into<String>) -> Self {
        let mut origin = origin.into();
        while origin.ends_with('/') {
            origin.pop();
        }
        Self { origin }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns `raw` unchanged when it already carries a scheme, otherwise
    /// prefixes it with the serving origin, stripping leading separators.
    pub fn resolve(&self, raw: &str) -> String {
        if has_scheme(raw) {
            return raw.to_string();
        }
        let relative = raw.trim_start_matches(['/', '\\']);
        format!("{}/{relative}", self.origin)
    }
}

fn has_scheme(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once(':') else {
        return false;
    };
    if scheme.is_empty() || !scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    scheme
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        // Windows drive letters ("C:\...") are paths, not schemes.
        && !(scheme.len() == 1 && (rest.starts_with('\\') || !rest.starts_with('/')))
}
