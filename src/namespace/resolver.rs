use crate::config::IdentityConfig;
use crate::error::{AppError, Result};
use crate::namespace::store::{find_by_urn, NamespaceDirectory};
use crate::namespace::Namespace;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64ct::{Base64Url, Base64UrlUnpadded, Encoding};
use std::collections::HashMap;
use std::sync::Arc;

const SUBJECT_CLAIM: &str = "sub";

/// Tenant and caller identity resolved for one inbound request.
///
/// Produced once by [`NamespaceResolver`] and threaded through handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub namespace: Namespace,
    /// Caller identity: the token subject if present, else the identity header
    pub user_id: Option<String>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            namespace: Namespace::default_namespace(),
            user_id: None,
        }
    }
}

/// Raw identity inputs of a request
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityInput<'a> {
    /// `Authorization` header value, with or without the `Bearer ` prefix
    pub authorization: Option<&'a str>,
    /// Namespace UUID or name
    pub namespace: Option<&'a str>,
    /// User identity header
    pub user: Option<&'a str>,
}

/// String-valued claims of a bearer token, read WITHOUT signature verification.
///
/// Only sound because the token arrives over a channel that has already
/// authenticated the caller (gateway/mesh). Never use these claims for
/// authentication decisions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrustedClaims(HashMap<String, String>);

impl TrustedClaims {
    /// Decode the payload segment of a compact JWS. Returns `None` for anything
    /// that is not a three-segment token with a JSON object payload.
    pub fn decode_unverified(token: &str) -> Option<Self> {
        let token = token.trim();
        let token = token
            .strip_prefix("Bearer ")
            .or_else(|| token.strip_prefix("bearer "))
            .unwrap_or(token);

        let mut segments = token.split('.');
        let (_header, payload, _signature) =
            (segments.next()?, segments.next()?, segments.next()?);
        if segments.next().is_some() {
            return None;
        }

        let bytes = Base64UrlUnpadded::decode_vec(payload)
            .or_else(|_| Base64Url::decode_vec(payload))
            .ok()?;
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(&bytes).ok()?;

        Some(Self(
            object
                .into_iter()
                .filter_map(|(key, value)| match value {
                    serde_json::Value::String(s) => Some((key, s)),
                    _ => None,
                })
                .collect(),
        ))
    }

    pub fn get(&self, claim: &str) -> Option<&str> {
        self.0.get(claim).map(String::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get(SUBJECT_CLAIM).filter(|s| !s.is_empty())
    }
}

/// Decides which namespace a request acts on.
///
/// Precedence: token namespace claim, then namespace header, then the default
/// namespace. An explicitly supplied identifier that matches nothing fails
/// with `NotFound`; it never falls back to the default.
#[derive(Clone)]
pub struct NamespaceResolver {
    directory: Arc<dyn NamespaceDirectory>,
    identity: IdentityConfig,
}

impl NamespaceResolver {
    pub fn new(directory: Arc<dyn NamespaceDirectory>, identity: IdentityConfig) -> Self {
        Self {
            directory,
            identity,
        }
    }

    pub fn identity(&self) -> &IdentityConfig {
        &self.identity
    }

    pub async fn resolve(&self, input: IdentityInput<'_>) -> Result<RequestContext> {
        let mut context = RequestContext {
            user_id: input
                .user
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            ..Default::default()
        };

        let claims = input.authorization.and_then(TrustedClaims::decode_unverified);
        if let Some(claims) = &claims {
            if let Some(subject) = claims.subject() {
                context.user_id = Some(subject.to_string());
            }
            if let Some(urn) = claims.get(&self.identity.namespace_claim) {
                context.namespace = self.lookup(urn.trim(), "claim").await?;
                return Ok(context);
            }
        }

        if let Some(urn) = input.namespace.map(str::trim).filter(|v| !v.is_empty()) {
            context.namespace = self.lookup(urn, "header").await?;
        }

        Ok(context)
    }

    /// Resolve straight from HTTP headers using the configured header keys.
    ///
    /// An identity header that is present but not visible ASCII is rejected
    /// rather than treated as absent.
    pub async fn resolve_headers(&self, headers: &HeaderMap) -> Result<RequestContext> {
        self.resolve(IdentityInput {
            authorization: header_value(headers, AUTHORIZATION.as_str())?,
            namespace: header_value(headers, &self.identity.namespace_header_key)?,
            user: header_value(headers, &self.identity.uuid_header_key)?,
        })
        .await
    }

    async fn lookup(&self, urn: &str, source: &'static str) -> Result<Namespace> {
        find_by_urn(self.directory.as_ref(), urn)
            .await
            .map_err(|err| {
                tracing::warn!(namespace = %urn, source, error = %err, "Namespace resolution failed");
                err
            })
    }
}

fn header_value<'a>(headers: &'a HeaderMap, key: &str) -> Result<Option<&'a str>> {
    match headers.get(key) {
        None => Ok(None),
        Some(value) => value.to_str().map(Some).map_err(|_| {
            tracing::warn!(header = %key, "Rejected unreadable identity header");
            AppError::Validation(format!("header {:?} must be visible ASCII", key))
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::namespace::{InMemoryNamespaceStore, NamespaceState, NamespaceStore};
    use serde_json::json;

    /// Build an unsigned token whose payload is `claims`
    pub(crate) fn token_with(claims: serde_json::Value) -> String {
        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
        format!("Bearer {}.{}.c2lnbmF0dXJl", header, payload)
    }

    async fn resolver_with(namespaces: &[Namespace]) -> NamespaceResolver {
        let store = InMemoryNamespaceStore::new();
        for ns in namespaces {
            store.create(ns).await.unwrap();
        }
        NamespaceResolver::new(Arc::new(store), IdentityConfig::default())
    }

    #[test]
    fn test_decode_unverified_claims() {
        let token = token_with(json!({"namespace_id": "acme", "sub": "user-1", "exp": 1700000000}));
        let claims = TrustedClaims::decode_unverified(&token).unwrap();
        assert_eq!(claims.get("namespace_id"), Some("acme"));
        assert_eq!(claims.subject(), Some("user-1"));
        assert_eq!(claims.get("exp"), None);

        assert!(TrustedClaims::decode_unverified("Bearer not-a-token").is_none());
        assert!(TrustedClaims::decode_unverified("a.%%%.c").is_none());
    }

    #[tokio::test]
    async fn test_no_identity_uses_default() {
        let resolver = resolver_with(&[]).await;
        let ctx = resolver.resolve(IdentityInput::default()).await.unwrap();
        assert!(ctx.namespace.is_default());
        assert_eq!(ctx.user_id, None);
    }

    #[tokio::test]
    async fn test_header_by_id_and_name() {
        let acme = Namespace::new("acme", NamespaceState::Shared);
        let resolver = resolver_with(&[acme.clone()]).await;

        let id = acme.id.to_string();
        let by_id = resolver
            .resolve(IdentityInput {
                namespace: Some(&id),
                ..Default::default()
            })
            .await
            .unwrap();
        let by_name = resolver
            .resolve(IdentityInput {
                namespace: Some("acme"),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_id.namespace, acme);
        assert_eq!(by_name.namespace, acme);
    }

    #[tokio::test]
    async fn test_claim_wins_over_header() {
        let acme = Namespace::new("acme", NamespaceState::Shared);
        let globex = Namespace::new("globex", NamespaceState::Dedicated);
        let resolver = resolver_with(&[acme.clone(), globex.clone()]).await;

        let token = token_with(json!({"namespace_id": acme.id.to_string()}));
        let ctx = resolver
            .resolve(IdentityInput {
                authorization: Some(&token),
                namespace: Some("globex"),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ctx.namespace, acme);
    }

    #[tokio::test]
    async fn test_subject_overrides_identity_header() {
        let resolver = resolver_with(&[Namespace::new("acme", NamespaceState::Shared)]).await;
        let token = token_with(json!({"sub": "token-user"}));
        let ctx = resolver
            .resolve(IdentityInput {
                authorization: Some(&token),
                namespace: Some("acme"),
                user: Some("header-user"),
            })
            .await
            .unwrap();
        assert_eq!(ctx.user_id.as_deref(), Some("token-user"));
        // no namespace claim, so the header still decides the tenant
        assert_eq!(ctx.namespace.name, "acme");
    }

    #[tokio::test]
    async fn test_unknown_namespace_fails_closed() {
        let resolver = resolver_with(&[]).await;

        let token = token_with(json!({"namespace_id": uuid::Uuid::new_v4().to_string()}));
        let from_claim = resolver
            .resolve(IdentityInput {
                authorization: Some(&token),
                ..Default::default()
            })
            .await;
        assert!(matches!(from_claim, Err(AppError::NotFound(_))));

        let from_header = resolver
            .resolve(IdentityInput {
                namespace: Some("globex"),
                ..Default::default()
            })
            .await;
        assert!(matches!(from_header, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_malformed_token_falls_through_to_header() {
        let acme = Namespace::new("acme", NamespaceState::Shared);
        let resolver = resolver_with(&[acme.clone()]).await;
        let ctx = resolver
            .resolve(IdentityInput {
                authorization: Some("Bearer garbage"),
                namespace: Some("acme"),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ctx.namespace, acme);
    }

    #[tokio::test]
    async fn test_resolve_headers() {
        let acme = Namespace::new("acme", NamespaceState::Shared);
        let resolver = resolver_with(&[acme.clone()]).await;

        let mut headers = HeaderMap::new();
        headers.insert("x-namespace", "acme".parse().unwrap());
        headers.insert("compass-user-uuid", "u-42".parse().unwrap());
        let ctx = resolver.resolve_headers(&headers).await.unwrap();
        assert_eq!(ctx.namespace, acme);
        assert_eq!(ctx.user_id.as_deref(), Some("u-42"));
    }

    #[tokio::test]
    async fn test_unreadable_identity_header_fails_closed() {
        let resolver = resolver_with(&[Namespace::new("acme", NamespaceState::Shared)]).await;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-namespace",
            axum::http::HeaderValue::from_bytes("acmé".as_bytes()).unwrap(),
        );
        let err = resolver.resolve_headers(&headers).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            axum::http::HeaderValue::from_bytes(b"Bearer \xff.\xfe.sig").unwrap(),
        );
        headers.insert("x-namespace", "acme".parse().unwrap());
        let err = resolver.resolve_headers(&headers).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
