//! Generic route table.

use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::RouteMatch;

/// A radix tree route table mapping (method, pattern) to targets.
///
/// # Route Priority
///
/// When several patterns could match a path:
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/{id}`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
///
/// ```rust
/// use micro_router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.route(Method::GET, "/users/{id}", "getUser").unwrap();
/// router.route(Method::GET, "/users/me", "getMe").unwrap();
///
/// let found = router.match_route(&Method::GET, "/users/me").unwrap();
/// assert_eq!(*found.target, "getMe");
///
/// let found = router.match_route(&Method::GET, "/users/42").unwrap();
/// assert_eq!(found.params.get("id"), Some("42"));
/// ```
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers `target` for `method` at `pattern`.
    pub fn route(&mut self, method: Method, pattern: &str, target: T) -> Result<(), RouteError> {
        self.root.insert(pattern, method, target)?;
        self.route_count += 1;
        Ok(())
    }

    /// Matches a method and path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let (methods, params) = self.root.match_path(path)?;
        let target = methods.get(method)?;
        Some(RouteMatch { target, params })
    }

    /// Matches a path regardless of method.
    ///
    /// Used to tell "no such path" (404) apart from "wrong method" (405).
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of registered (method, pattern) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_new() {
        let router: Router<&str> = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_router_match_static() {
        let mut router = Router::new();
        router.route(Method::GET, "/", "root").unwrap();
        router.route(Method::GET, "/users", "listUsers").unwrap();

        assert_eq!(*router.match_route(&Method::GET, "/").unwrap().target, "root");
        assert_eq!(
            *router.match_route(&Method::GET, "/users").unwrap().target,
            "listUsers"
        );
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_router_match_param() {
        let mut router = Router::new();
        router
            .route(Method::GET, "/users/{userId}/posts/{postId}", "getPost")
            .unwrap();

        let found = router
            .match_route(&Method::GET, "/users/7/posts/99")
            .unwrap();
        assert_eq!(*found.target, "getPost");
        assert_eq!(found.params.get("userId"), Some("7"));
        assert_eq!(found.params.get("postId"), Some("99"));
    }

    #[test]
    fn test_router_match_wildcard() {
        let mut router = Router::new();
        router.route(Method::GET, "/files/*path", "serveFile").unwrap();

        let found = router
            .match_route(&Method::GET, "/files/docs/readme.md")
            .unwrap();
        assert_eq!(found.params.get("path"), Some("docs/readme.md"));
    }

    #[test]
    fn test_router_trailing_slash_is_ignored() {
        let mut router = Router::new();
        router.route(Method::GET, "/users", "listUsers").unwrap();

        assert!(router.match_route(&Method::GET, "/users/").is_some());
    }

    #[test]
    fn test_router_method_mismatch() {
        let mut router = Router::new();
        router.route(Method::GET, "/users", "listUsers").unwrap();

        assert!(router.match_route(&Method::POST, "/users").is_none());
        let (methods, _) = router.match_path("/users").unwrap();
        assert_eq!(methods.allowed(), vec![Method::GET]);
    }

    #[test]
    fn test_router_duplicate_route() {
        let mut router = Router::new();
        router.route(Method::GET, "/users", 1).unwrap();

        let err = router.route(Method::GET, "/users/", 2).unwrap_err();
        assert_eq!(
            err,
            RouteError::Duplicate {
                method: Method::GET,
                pattern: "/users/".to_string(),
            }
        );
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_router_no_match() {
        let mut router = Router::new();
        router.route(Method::GET, "/users", "listUsers").unwrap();

        assert!(router.match_path("/orders").is_none());
    }
}
