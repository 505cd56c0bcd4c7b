use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::resolver::NamespaceResolver;

/// Paths that carry no tenant context.
const EXCLUDED_PATHS: &[&str] = &["/health", "/health/live", "/health/ready"];

/// Axum middleware that resolves the request's namespace.
///
/// Inserts a [`RequestContext`](super::RequestContext) into the request
/// extensions. A namespace claim or header naming an unknown namespace is
/// answered with 404 before the handler runs.
pub async fn namespace_middleware(
    State(resolver): State<NamespaceResolver>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if EXCLUDED_PATHS.contains(&req.uri().path()) {
        return next.run(req).await;
    }

    match resolver.resolve_headers(req.headers()).await {
        Ok(ctx) => {
            tracing::debug!(
                namespace_id = %ctx.namespace.id,
                namespace = %ctx.namespace.name,
                "Resolved request namespace"
            );
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}
