//! Radix tree node implementation.

use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::params::Params;

/// Type of path segment in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    /// Static path segment (e.g., "users")
    Static,
    /// Named parameter (e.g., "{id}")
    Param(String),
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// A node in the radix tree.
///
/// Nodes at route boundaries carry a [`MethodRouter`].
#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    segment: String,
    kind: SegmentKind,
    methods: Option<MethodRouter<T>>,
    /// Sorted by segment for binary search.
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
    wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn new(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a root node for the tree.
    pub(crate) fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    /// Inserts `target` for `method` at `pattern`.
    pub(crate) fn insert(
        &mut self,
        pattern: &str,
        method: Method,
        target: T,
    ) -> Result<(), RouteError> {
        let segments = parse_pattern(pattern)?;
        let node = self.descend(pattern, &segments)?;
        let methods = node.methods.get_or_insert_with(MethodRouter::new);
        methods
            .insert(method.clone(), target)
            .map_err(|_| RouteError::Duplicate {
                method,
                pattern: pattern.to_string(),
            })
    }

    /// Walks to the node for `segments`, creating nodes as needed.
    fn descend(
        &mut self,
        pattern: &str,
        segments: &[(String, SegmentKind)],
    ) -> Result<&mut Self, RouteError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return Ok(self);
        };

        let child = match kind {
            SegmentKind::Static => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children
                            .insert(index, Node::new(segment.clone(), SegmentKind::Static));
                        index
                    }
                };
                &mut self.static_children[index]
            }
            SegmentKind::Param(name) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::new(segment.clone(), kind.clone())));
                if let SegmentKind::Param(existing) = &child.kind {
                    if existing != name {
                        return Err(RouteError::ParamConflict {
                            pattern: pattern.to_string(),
                            name: name.clone(),
                            existing: existing.clone(),
                        });
                    }
                }
                child.as_mut()
            }
            SegmentKind::Wildcard(name) => {
                let child = self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new(segment.clone(), kind.clone())));
                if let SegmentKind::Wildcard(existing) = &child.kind {
                    if existing != name {
                        return Err(RouteError::ParamConflict {
                            pattern: pattern.to_string(),
                            name: name.clone(),
                            existing: existing.clone(),
                        });
                    }
                }
                child.as_mut()
            }
        };
        child.descend(pattern, remaining)
    }

    /// Matches a request path against the tree.
    pub(crate) fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), *segment);
                if let Some(found) = child.match_segments(remaining, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                if let Some(methods) = &child.methods {
                    params.push(name.clone(), segments.join("/"));
                    return Some(methods);
                }
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Self> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

/// Splits a pattern into typed segments, validating its shape.
fn parse_pattern(pattern: &str) -> Result<Vec<(String, SegmentKind)>, RouteError> {
    if !pattern.starts_with('/') {
        return Err(RouteError::MissingLeadingSlash {
            pattern: pattern.to_string(),
        });
    }

    let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(raw.len());
    for (index, s) in raw.iter().enumerate() {
        let kind = if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if name.is_empty() {
                return Err(RouteError::UnnamedParam {
                    pattern: pattern.to_string(),
                });
            }
            SegmentKind::Param(name.to_string())
        } else if let Some(name) = s.strip_prefix('*') {
            if name.is_empty() {
                return Err(RouteError::UnnamedParam {
                    pattern: pattern.to_string(),
                });
            }
            if index + 1 != raw.len() {
                return Err(RouteError::WildcardNotLast {
                    pattern: pattern.to_string(),
                });
            }
            SegmentKind::Wildcard(name.to_string())
        } else {
            SegmentKind::Static
        };
        segments.push(((*s).to_string(), kind));
    }
    Ok(segments)
}
