//! Ordered mount table.

use axum::routing::MethodRouter;
use axum::Router;
use thiserror::Error;

use crate::routing::groups::ApiGroups;

/// Storefront API prefixes, in registration order.
pub const API_MOUNTS: [&str; 6] = [
    "/api/auth",
    "/api/products",
    "/api/cart",
    "/api/coupons",
    "/api/payments",
    "/api/analytics",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("mount path `{0}` must start with `/`")]
    NotAbsolute(String),

    #[error("cannot mount a handler group at the root")]
    Root,

    #[error("mount path `{0}` must not end with `/`")]
    TrailingSlash(String),

    #[error("mount path `{0}` contains an empty segment")]
    EmptySegment(String),

    #[error("mount path `{0}` must not contain parameters or wildcards")]
    Wildcard(String),

    #[error("mount path `{new}` overlaps `{existing}`")]
    Overlap { new: String, existing: String },
}

/// A literal path prefix such as `/api/cart`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPath(String);

impl MountPath {
    pub fn parse(path: &str) -> Result<Self, RoutingError> {
        if !path.starts_with('/') {
            return Err(RoutingError::NotAbsolute(path.to_string()));
        }
        if path == "/" {
            return Err(RoutingError::Root);
        }
        if path.ends_with('/') {
            return Err(RoutingError::TrailingSlash(path.to_string()));
        }
        if path[1..].split('/').any(str::is_empty) {
            return Err(RoutingError::EmptySegment(path.to_string()));
        }
        if path.contains(['{', '}', '*', ':']) {
            return Err(RoutingError::Wildcard(path.to_string()));
        }
        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when one path is a segment-wise prefix of the other.
    pub fn overlaps(&self, other: &MountPath) -> bool {
        let owns = |outer: &str, inner: &str| {
            inner == outer
                || (inner.starts_with(outer) && inner.as_bytes().get(outer.len()) == Some(&b'/'))
        };
        owns(&self.0, &other.0) || owns(&other.0, &self.0)
    }
}

struct Mount {
    path: MountPath,
    group: Router,
}

/// Handler groups keyed by disjoint prefixes, applied in insertion order.
#[derive(Default)]
pub struct RouteTable {
    mounts: Vec<Mount>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The six storefront groups at their fixed prefixes.
    pub fn storefront(groups: ApiGroups) -> Result<Self, RoutingError> {
        groups
            .into_entries()
            .into_iter()
            .try_fold(Self::new(), |table, (path, group)| table.mount(path, group))
    }

    pub fn mount(mut self, path: &str, group: Router) -> Result<Self, RoutingError> {
        let path = MountPath::parse(path)?;
        if let Some(existing) = self.mounts.iter().find(|m| m.path.overlaps(&path)) {
            return Err(RoutingError::Overlap {
                new: path.0,
                existing: existing.path.0.clone(),
            });
        }
        self.mounts.push(Mount { path, group });
        Ok(self)
    }

    pub fn paths(&self) -> Vec<&str> {
        self.mounts.iter().map(|m| m.path.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Nest every group onto `base`, then install `fallback` for everything else.
    pub fn into_router(self, base: Router, fallback: MethodRouter) -> Router {
        let router = self.mounts.into_iter().fold(base, |router, mount| {
            tracing::debug!(prefix = mount.path.as_str(), "Mounting handler group");
            router.nest(mount.path.as_str(), mount.group)
        });
        router.fallback_service(fallback)
    }
}
