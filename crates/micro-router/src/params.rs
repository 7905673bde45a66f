//! Captured path segments.

use std::str::FromStr;

use smallvec::SmallVec;

/// Routes rarely capture more than this many segments.
const INLINE_CAPTURES: usize = 4;

/// One captured segment: the `{name}` or `*name` in the pattern and the text
/// it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Capture {
    name: String,
    value: String,
}

/// Segments captured while matching a request path.
///
/// [`HandlerRouter`](crate::HandlerRouter) stores them in the request
/// extensions, so an endpoint reads them with
/// `request.extensions().get::<Params>()`.
///
/// ```rust
/// use micro_router::Params;
///
/// let mut params = Params::new();
/// params.push("userId", "123");
///
/// assert_eq!(params.get("userId"), Some("123"));
/// assert_eq!(params.parse::<u64>("userId"), Some(Ok(123)));
/// assert!(!params.contains("orderId"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    captures: SmallVec<[Capture; INLINE_CAPTURES]>,
}

impl Params {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a captured segment.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.captures.push(Capture {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Text captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.captures
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Parses the text captured for `name`; `None` if nothing was captured.
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<Result<T, T::Err>> {
        self.get(name).map(str::parse)
    }

    /// Whether `name` was captured.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// True when the route had no captures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    /// `(name, value)` pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.captures
            .iter()
            .map(|c| (c.name.as_str(), c.value.as_str()))
    }

    /// Backtracking support for the tree walk.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.captures.truncate(len);
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let mut params = Params::new();
        assert!(params.is_empty());

        params.push("id", "123");
        params.push("action", "view");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("action"), Some("view"));
        assert!(params.contains("id"));
        assert!(!params.contains("missing"));
    }

    #[test]
    fn test_parse() {
        let mut params = Params::new();
        params.push("id", "42");
        params.push("slug", "hello-world");

        assert_eq!(params.parse::<u32>("id"), Some(Ok(42)));
        assert!(matches!(params.parse::<u32>("slug"), Some(Err(_))));
        assert!(params.parse::<u32>("missing").is_none());
    }

    #[test]
    fn test_iteration_keeps_pattern_order() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");

        let collected: Vec<_> = (&params).into_iter().collect();
        assert_eq!(collected, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_truncate_drops_later_captures() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");
        params.truncate(1);

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("b"), None);
    }
}
