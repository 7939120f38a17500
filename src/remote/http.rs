//! HTTP client for a REST cart service.
//!
//! Every endpoint answers with the same JSON envelope:
//!
//! ```text
//! { "success": true, "message": "...", "cart": { "items": [ { "productId": ... } ] } }
//! ```
//!
//! A `"success": false` envelope is surfaced as [`RemoteError::Rejected`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{RemoteCartService, RemoteError};
use crate::model::CartLine;

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    cart: Option<CartPayload>,
}

#[derive(Debug, Deserialize)]
struct CartPayload {
    #[serde(default)]
    items: Vec<CartLine>,
}

impl Envelope {
    fn into_items(self) -> Vec<CartLine> {
        self.cart.map(|cart| cart.items).unwrap_or_default()
    }
}

#[derive(Serialize)]
struct QuantityBody {
    quantity: u32,
}

#[derive(Serialize)]
struct SyncBody<'a> {
    items: &'a [CartLine],
}

/// Client for the cart REST API of an authenticated session.
///
/// Use [`HttpCartService::new`] with the service base URL; the bearer token,
/// if any, identifies the session.
#[derive(Clone)]
pub struct HttpCartService {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl std::fmt::Debug for HttpCartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCartService")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl HttpCartService {
    /// Creates a client for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`RemoteError::Unavailable`] if `base_url`
    /// is not a valid URL.
    pub fn new(
        base_url: &str,
        token: Option<SecretString>,
        timeout_secs: u64,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("cart-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Keep exactly one trailing slash so joined segments append to the base path.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            RemoteError::Unavailable(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Unavailable(format!("base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, RemoteError> {
        let url = self.endpoint(segments)?;
        let builder = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder, context: &str) -> Result<Envelope, RemoteError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|source| RemoteError::Decode {
                context: context.to_owned(),
                source,
            })?;

        if !envelope.success {
            return Err(RemoteError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| format!("{context} was not accepted")),
            ));
        }
        debug!(context, "Cart service ok");
        Ok(envelope)
    }
}

#[async_trait]
impl RemoteCartService for HttpCartService {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Vec<CartLine>, RemoteError> {
        let builder = self.request(Method::GET, &["cart"])?;
        Ok(self.send(builder, "fetch_cart").await?.into_items())
    }

    #[instrument(skip(self, line), fields(product_id = %line.product_id))]
    async fn add_line(&self, line: CartLine) -> Result<(), RemoteError> {
        let builder = self.request(Method::POST, &["cart", "items"])?.json(&line);
        self.send(builder, "add_line").await.map(drop)
    }

    #[instrument(skip(self))]
    async fn update_line_quantity(&self, product_id: &str, quantity: u32) -> Result<(), RemoteError> {
        let builder = self
            .request(Method::PUT, &["cart", "items", product_id])?
            .json(&QuantityBody { quantity });
        self.send(builder, "update_line_quantity").await.map(drop)
    }

    #[instrument(skip(self))]
    async fn remove_line(&self, product_id: &str) -> Result<(), RemoteError> {
        let builder = self.request(Method::DELETE, &["cart", "items", product_id])?;
        self.send(builder, "remove_line").await.map(drop)
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), RemoteError> {
        let builder = self.request(Method::DELETE, &["cart"])?;
        self.send(builder, "clear_cart").await.map(drop)
    }

    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn merge_guest_cart(&self, lines: Vec<CartLine>) -> Result<Vec<CartLine>, RemoteError> {
        let builder = self
            .request(Method::POST, &["cart", "sync"])?
            .json(&SyncBody { items: &lines });
        Ok(self.send(builder, "merge_guest_cart").await?.into_items())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base: &str) -> HttpCartService {
        HttpCartService::new(base, None, 5).unwrap()
    }

    #[test]
    fn test_endpoint_appends_to_base_path() {
        let svc = service("https://shop.example.com/api/");
        let url = svc.endpoint(&["cart", "items", "p1"]).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/api/cart/items/p1");
    }

    #[test]
    fn test_endpoint_encodes_product_id() {
        let svc = service("https://shop.example.com");
        let url = svc.endpoint(&["cart", "items", "tee/blue"]).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/cart/items/tee%2Fblue");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = HttpCartService::new("not a url", None, 5).unwrap_err();
        assert!(matches!(err, RemoteError::Unavailable(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let svc = HttpCartService::new(
            "https://shop.example.com",
            Some(SecretString::from("tok-123".to_string())),
            5,
        )
        .unwrap();
        let rendered = format!("{svc:?}");
        assert!(!rendered.contains("tok-123"));
        assert!(rendered.contains("REDACTED"));
    }
}
