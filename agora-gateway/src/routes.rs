use http::Method;

use crate::settings::Settings;

/// One public prefix and where it lands downstream.
#[derive(Debug, Clone)]
struct Route {
    /// Public path prefix, e.g. `/api/cart`.
    prefix: String,
    /// Downstream base URL.
    target: String,
    /// Path the prefix maps to on the downstream service. Empty for the
    /// auth service, whose endpoints live at its root.
    mount: String,
}

/// Static prefix-to-service table. No entry is a prefix of another, so
/// first match wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(settings: &Settings) -> Self {
        let route = |prefix: &str, target: &str, mount: &str| Route {
            prefix: prefix.to_string(),
            target: target.to_string(),
            mount: mount.to_string(),
        };
        Self {
            routes: vec![
                route("/api/auth", &settings.auth_url, ""),
                route("/api/products", &settings.catalog_url, "/products"),
                route("/api/cart", &settings.orders_url, "/cart"),
                route("/api/orders", &settings.orders_url, "/orders"),
                route("/api/payments", &settings.payments_url, "/payments"),
            ],
        }
    }

    /// Resolve a public path to a full downstream URL, or `None` when no
    /// prefix matches.
    pub fn resolve(&self, path: &str) -> Option<String> {
        for route in &self.routes {
            if let Some(rest) = match_prefix(path, &route.prefix) {
                return Some(format!("{}{}{}", route.target, route.mount, rest));
            }
        }
        None
    }
}

/// Prefix match on segment boundaries: `/api/cart` matches `/api/cart` and
/// `/api/cart/items` but not `/api/cartel`.
fn match_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Whether a request may pass without a token. Registration, login, and
/// refresh have to be open, and catalog reads are public like the rest of
/// the storefront.
pub fn is_public(method: &Method, path: &str) -> bool {
    if *method == Method::POST {
        return matches!(
            path,
            "/api/auth/login" | "/api/auth/register" | "/api/auth/refresh"
        );
    }
    if *method == Method::GET {
        return path == "/docs"
            || path == "/openapi.json"
            || path == "/api/products"
            || path.starts_with("/api/products/");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::new(&Settings {
            bind_addr: "127.0.0.1:0".into(),
            auth_url: "http://auth".into(),
            catalog_url: "http://catalog".into(),
            orders_url: "http://orders".into(),
            payments_url: "http://payments".into(),
            upstream_timeout_secs: 1,
            probe_timeout_secs: 1,
        })
    }

    #[test]
    fn auth_prefix_is_stripped_entirely() {
        assert_eq!(
            table().resolve("/api/auth/login").as_deref(),
            Some("http://auth/login")
        );
    }

    #[test]
    fn resource_prefixes_keep_their_mount() {
        let table = table();
        assert_eq!(table.resolve("/api/cart").as_deref(), Some("http://orders/cart"));
        assert_eq!(
            table.resolve("/api/cart/items/p-1").as_deref(),
            Some("http://orders/cart/items/p-1")
        );
        assert_eq!(
            table.resolve("/api/orders/o-1/cancel").as_deref(),
            Some("http://orders/orders/o-1/cancel")
        );
        assert_eq!(
            table.resolve("/api/products/p-1").as_deref(),
            Some("http://catalog/products/p-1")
        );
        assert_eq!(
            table.resolve("/api/payments/process").as_deref(),
            Some("http://payments/payments/process")
        );
    }

    #[test]
    fn near_miss_prefixes_do_not_match() {
        let table = table();
        assert_eq!(table.resolve("/api/cartel"), None);
        assert_eq!(table.resolve("/api/nope"), None);
        assert_eq!(table.resolve("/cart"), None);
    }

    #[test]
    fn allow_list_is_method_aware() {
        assert!(is_public(&Method::POST, "/api/auth/login"));
        assert!(is_public(&Method::POST, "/api/auth/register"));
        assert!(is_public(&Method::POST, "/api/auth/refresh"));
        assert!(is_public(&Method::GET, "/api/products"));
        assert!(is_public(&Method::GET, "/api/products/p-1"));

        assert!(!is_public(&Method::POST, "/api/auth/logout"));
        assert!(!is_public(&Method::GET, "/api/auth/verify"));
        assert!(!is_public(&Method::POST, "/api/products"));
        assert!(!is_public(&Method::GET, "/api/cart"));
        assert!(!is_public(&Method::GET, "/api/productsx"));
    }
}
