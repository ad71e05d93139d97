//! Request routing and path matching.
//!
//! The router maps a method and path to a caller-defined route value and
//! extracts `{name}` parameters from the path. Routes are checked in
//! registration order; the first match wins. Query strings are not part of
//! the match.
//!
//! # Example
//!
//! ```rust
//! use stepform_server::Router;
//! use http::Method;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Route {
//!     GetForm,
//!     GetStep,
//! }
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/form/{formId}", Route::GetForm);
//! router.add_route(Method::GET, "/form/{formId}/steps/{stepId}", Route::GetStep);
//!
//! let m = router.match_route(&Method::GET, "/form/7/steps/9").unwrap();
//! assert_eq!(*m.route(), Route::GetStep);
//! assert_eq!(m.param("formId"), Some("7"));
//! assert_eq!(m.param("stepId"), Some("9"));
//! ```

use std::collections::HashMap;

use http::Method;

/// A matched route with extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'r, T> {
    route: &'r T,
    params: HashMap<String, String>,
}

impl<'r, T> RouteMatch<'r, T> {
    /// Returns the value registered for the matched route.
    #[must_use]
    pub fn route(&self) -> &'r T {
        self.route
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns a specific path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route<T> {
    method: Method,
    segments: Vec<PathSegment>,
    pattern: String,
    value: T,
}

impl<T> Route<T> {
    fn new(method: Method, pattern: &str, value: T) -> Self {
        Self {
            method,
            segments: parse_segments(pattern),
            pattern: pattern.to_string(),
            value,
        }
    }

    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();

        for (pattern, actual) in self.segments.iter().zip(path_segments) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }

        Some(params)
    }
}

fn parse_segments(pattern: &str) -> Vec<PathSegment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => PathSegment::Param(name.to_string()),
            None => PathSegment::Literal(s.to_string()),
        })
        .collect()
}

/// HTTP request router.
#[derive(Debug, Clone)]
pub struct Router<T> {
    routes: Vec<Route<T>>,
}

impl<T> Router<T> {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Adds a route. `pattern` may contain `{name}` segments.
    pub fn add_route(&mut self, method: Method, pattern: impl AsRef<str>, value: T) {
        self.routes.push(Route::new(method, pattern.as_ref(), value));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Matches a request, returning `None` when no route fits both the
    /// method and the path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        self.routes.iter().find_map(|route| {
            if route.method != *method {
                return None;
            }
            route.match_path(path).map(|params| RouteMatch {
                route: &route.value,
                params,
            })
        })
    }

    /// Returns `(method, pattern)` for every registered route, in order.
    pub fn patterns(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes.iter().map(|r| (&r.method, r.pattern.as_str()))
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router<&'static str> {
        let mut router = Router::new();
        router.add_route(Method::POST, "/api/v1/login", "login");
        router.add_route(Method::POST, "/api/v1/form", "createForm");
        router.add_route(Method::GET, "/api/v1/form/{formId}", "getForm");
        router.add_route(Method::PATCH, "/api/v1/form/{formId}", "updateForm");
        router.add_route(Method::GET, "/api/v1/form/{formId}/steps/{stepId}", "getStep");
        router.add_route(Method::DELETE, "/api/v1/form/{formId}/steps/{stepId}", "deleteStep");
        router
    }

    #[test]
    fn test_literal_match() {
        let router = router();
        let m = router.match_route(&Method::POST, "/api/v1/login").unwrap();
        assert_eq!(*m.route(), "login");
        assert!(m.params().is_empty());
    }

    #[test]
    fn test_param_extraction() {
        let router = router();
        let m = router
            .match_route(&Method::DELETE, "/api/v1/form/abc/steps/def")
            .unwrap();
        assert_eq!(*m.route(), "deleteStep");
        assert_eq!(m.param("formId"), Some("abc"));
        assert_eq!(m.param("stepId"), Some("def"));
        assert_eq!(m.param("missing"), None);
    }

    #[test]
    fn test_method_must_match() {
        let router = router();
        assert!(router.match_route(&Method::PUT, "/api/v1/form/abc").is_none());
        assert_eq!(
            *router.match_route(&Method::PATCH, "/api/v1/form/abc").unwrap().route(),
            "updateForm"
        );
    }

    #[test]
    fn test_segment_count_must_match() {
        let router = router();
        assert!(router.match_route(&Method::GET, "/api/v1/form").is_none());
        assert!(router.match_route(&Method::GET, "/api/v1/form/a/steps").is_none());
        assert!(router.match_route(&Method::GET, "/api/v1/form/a/steps/b/c").is_none());
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let router = router();
        assert!(router.match_route(&Method::POST, "/api/v1/form/").is_some());
    }

    #[test]
    fn test_first_match_wins() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/form/{id}", 1);
        router.add_route(Method::GET, "/form/special", 2);

        assert_eq!(*router.match_route(&Method::GET, "/form/special").unwrap().route(), 1);
    }

    #[test]
    fn test_patterns_listed_in_order() {
        let router = router();
        let patterns: Vec<_> = router.patterns().map(|(_, p)| p).collect();
        assert_eq!(patterns.len(), router.route_count());
        assert_eq!(patterns[0], "/api/v1/login");
        assert_eq!(patterns[5], "/api/v1/form/{formId}/steps/{stepId}");
    }

    #[test]
    fn test_empty_router() {
        let router: Router<()> = Router::default();
        assert_eq!(router.route_count(), 0);
        assert!(router.match_route(&Method::GET, "/").is_none());
    }
}
