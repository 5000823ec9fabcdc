use http::{Method, Request};
use tracing::debug;

use super::RouteDescriptor;
use crate::error::{Result, StaticError};
use crate::handler::{AssetRequest, Outcome};

/// Minimal dispatcher over [`RouteDescriptor`]s.
///
/// Exact paths win over wildcards; among wildcards the longest prefix wins.
/// Registering the same `(method, path)` twice is an error, which also
/// guarantees at most one wildcard route per prefix.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route.
    ///
    /// # Errors
    ///
    /// [`StaticError::DuplicateRoute`] if the method and path are taken.
    pub fn push(&mut self, route: RouteDescriptor) -> Result<()> {
        if self
            .routes
            .iter()
            .any(|r| r.method == route.method && r.path == route.path)
        {
            return Err(StaticError::DuplicateRoute {
                method: route.method,
                path: route.path,
            });
        }
        debug!(method = %route.method, path = %route.path, "Route registered");
        self.routes.push(route);
        Ok(())
    }

    /// Register every route, stopping at the first duplicate.
    ///
    /// # Errors
    ///
    /// [`StaticError::DuplicateRoute`] as for [`RouteTable::push`].
    pub fn extend(&mut self, routes: impl IntoIterator<Item = RouteDescriptor>) -> Result<()> {
        for route in routes {
            self.push(route)?;
        }
        Ok(())
    }

    /// Registered routes, in registration order.
    #[must_use]
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the route for a request.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<&RouteDescriptor> {
        let exact = self
            .routes
            .iter()
            .find(|r| r.method == *method && !r.is_wildcard() && r.path == path);
        if exact.is_some() {
            return exact;
        }
        self.routes
            .iter()
            .filter(|r| r.method == *method)
            .filter_map(|r| r.wildcard_prefix().map(|prefix| (prefix.len(), r)))
            .filter(|(len, r)| covers(&r.path[..*len], path))
            .max_by_key(|(len, _)| *len)
            .map(|(_, r)| r)
    }

    /// Serve a request, or [`Outcome::NotFound`] when no route matches.
    pub async fn dispatch<B>(&self, req: &Request<B>) -> Outcome {
        let path = req.uri().path();
        match self.find(req.method(), path) {
            Some(route) => route.call(AssetRequest::from(req)).await,
            None => {
                debug!(method = %req.method(), path = %path, "No route matched");
                Outcome::NotFound
            }
        }
    }
}

/// Whether a wildcard `prefix` covers `path`: the prefix itself or anything
/// below it, never a sibling that merely shares the leading characters.
fn covers(prefix: &str, path: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
