use axum::{
    Router,
    handler::Handler,
    http::{Method, StatusCode, header::ALLOW},
    routing::{MethodRouter, get, post},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared state handed to every handler
pub type AppState = Arc<RouteTable>;

/// Map of every registered path to the methods it accepts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RouteTable(BTreeMap<String, Vec<String>>);

impl RouteTable {
    /// All registered paths in sorted order
    pub fn paths(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    fn insert(&mut self, path: &str, methods: &[Method]) {
        let mut names: Vec<String> = methods.iter().map(|m| m.to_string()).collect();
        names.sort();
        self.0.insert(path.to_string(), names);
    }
}

/// Router builder that records each route it registers
///
/// Every route also answers plain `OPTIONS` requests with an `Allow`
/// header, so the recorded methods match what the router serves.
pub struct ApiRouter {
    router: Router<AppState>,
    routes: RouteTable,
}

impl ApiRouter {
    /// Create an empty route builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            routes: RouteTable::default(),
        }
    }

    /// Register a GET route, which also serves HEAD
    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.add(path, &[Method::GET, Method::HEAD], get(handler))
    }

    /// Register a POST route
    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.add(path, &[Method::POST], post(handler))
    }

    fn add(mut self, path: &str, methods: &[Method], route: MethodRouter<AppState>) -> Self {
        let mut methods = methods.to_vec();
        methods.push(Method::OPTIONS);
        let allow = methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let route = route.options(move || {
            let allow = allow.clone();
            async move { (StatusCode::OK, [(ALLOW, allow)]) }
        });
        self.routes.insert(path, &methods);
        self.router = self.router.route(path, route);
        self
    }

    /// The routes registered so far
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Finish the router, handing the route table to handlers as state
    pub fn into_router(self) -> Router {
        let Self { router, routes } = self;
        router.with_state(Arc::new(routes))
    }
}

impl Default for ApiRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn sample() -> ApiRouter {
        ApiRouter::new()
            .get("/ping", || async { "pong" })
            .post("/echo", |body: String| async move { body })
    }

    #[test]
    fn test_route_table_records_methods() {
        let api = sample();
        let routes = api.routes();
        assert_eq!(routes.paths(), vec!["/echo", "/ping"]);
        assert_eq!(routes.0["/ping"], ["GET", "HEAD", "OPTIONS"]);
        assert_eq!(routes.0["/echo"], ["OPTIONS", "POST"]);
        assert!(!routes.0.contains_key("/missing"));
    }

    #[test]
    fn test_route_table_serializes_as_map() {
        let value = serde_json::to_value(sample().routes()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "/echo": ["OPTIONS", "POST"],
                "/ping": ["GET", "HEAD", "OPTIONS"],
            })
        );
    }

    #[tokio::test]
    async fn test_options_lists_allowed_methods() {
        let app = sample().into_router();

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/echo")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ALLOW], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_head_is_served_for_get_routes() {
        let app = sample().into_router();

        let request = Request::builder()
            .method(Method::HEAD)
            .uri("/ping")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
