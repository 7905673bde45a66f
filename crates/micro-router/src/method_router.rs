//! Per-path method dispatch.

use http::Method;

/// Maps HTTP methods to route targets for a single path.
///
/// Methods keep their registration order, which is also the order they are
/// reported in an `Allow` header.
///
/// ```rust
/// use micro_router::MethodRouter;
/// use http::Method;
///
/// let mut methods = MethodRouter::new();
/// methods.insert(Method::GET, "getUser").unwrap();
/// methods.insert(Method::DELETE, "deleteUser").unwrap();
///
/// assert_eq!(methods.get(&Method::GET), Some(&"getUser"));
/// assert_eq!(methods.allowed(), vec![Method::GET, Method::DELETE]);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    routes: Vec<(Method, T)>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target for `method`.
    ///
    /// Gives the target back if the method is already taken.
    pub fn insert(&mut self, method: Method, target: T) -> Result<(), T> {
        if self.contains(&method) {
            return Err(target);
        }
        self.routes.push((method, target));
        Ok(())
    }

    /// Returns the target registered for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&T> {
        self.routes
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, target)| target)
    }

    /// Returns true if `method` has a target.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.routes.iter().any(|(m, _)| m == method)
    }

    /// Returns the registered methods.
    #[must_use]
    pub fn allowed(&self) -> Vec<Method> {
        self.routes.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Returns true if no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_router_insert_and_get() {
        let mut router = MethodRouter::new();
        router.insert(Method::GET, 1).unwrap();
        router.insert(Method::POST, 2).unwrap();

        assert_eq!(router.get(&Method::GET), Some(&1));
        assert_eq!(router.get(&Method::POST), Some(&2));
        assert_eq!(router.get(&Method::PUT), None);
    }

    #[test]
    fn test_method_router_rejects_duplicate() {
        let mut router = MethodRouter::new();
        router.insert(Method::GET, 1).unwrap();

        assert_eq!(router.insert(Method::GET, 2), Err(2));
        assert_eq!(router.get(&Method::GET), Some(&1));
    }

    #[test]
    fn test_method_router_custom_method() {
        let purge = Method::from_bytes(b"PURGE").unwrap();
        let mut router = MethodRouter::new();
        router.insert(purge.clone(), "purge").unwrap();

        assert!(router.contains(&purge));
        assert_eq!(router.allowed(), vec![purge]);
    }

    #[test]
    fn test_method_router_empty() {
        let router: MethodRouter<()> = MethodRouter::new();
        assert!(router.is_empty());
        assert!(router.allowed().is_empty());
    }
}
