//! Handler groups mounted under the storefront prefixes.
//!
//! The groups themselves live outside this crate. Each one is a plain
//! `axum::Router` that already carries whatever state it needs.

use axum::routing::any;
use axum::Router;

use crate::http::error::AppError;
use crate::routing::table::API_MOUNTS;

/// One router per storefront prefix.
pub struct ApiGroups {
    pub auth: Router,
    pub products: Router,
    pub cart: Router,
    pub coupons: Router,
    pub payments: Router,
    pub analytics: Router,
}

impl ApiGroups {
    /// Placeholder groups answering `501 Not Implemented`.
    pub fn pending() -> Self {
        Self {
            auth: pending_group("auth"),
            products: pending_group("products"),
            cart: pending_group("cart"),
            coupons: pending_group("coupons"),
            payments: pending_group("payments"),
            analytics: pending_group("analytics"),
        }
    }

    /// Prefix and router pairs in registration order.
    pub fn into_entries(self) -> Vec<(&'static str, Router)> {
        let [auth, products, cart, coupons, payments, analytics] = API_MOUNTS;
        vec![
            (auth, self.auth),
            (products, self.products),
            (cart, self.cart),
            (coupons, self.coupons),
            (payments, self.payments),
            (analytics, self.analytics),
        ]
    }
}

/// A group that owns its whole prefix and answers `501` for every request.
pub fn pending_group(name: &'static str) -> Router {
    let handler = move || async move { AppError::NotImplemented { group: name } };
    Router::new()
        .route("/", any(handler))
        .route("/{*rest}", any(handler))
}
