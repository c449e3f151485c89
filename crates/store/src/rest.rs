use crate::error::{Result, StoreError};
use crate::query::{Filter, Order, RowRange};
use crate::{DataStore, Row};
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request};
use kalem_model::Collection;

/// Row-store client speaking the hosted backend's REST dialect: filters and
/// sort order as query parameters, row ranges via the `Range` header.
///
/// TLS termination is expected in front of this client (local dev proxy or
/// sidecar); the base URL is plain HTTP.
pub struct RestStore {
    client: Client<HttpConnector>,
    base_url: String,
    api_key: Option<String>,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        RestStore {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn request(&self, method: Method, uri: &str) -> hyper::http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder
                .header("apikey", key.clone())
                .header("Authorization", format!("Bearer {key}"));
        }
        builder
    }

    async fn send(&self, request: Request<Body>) -> Result<Vec<u8>> {
        let response = self.client.request(request).await?;
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DataStore for RestStore {
    async fn select(
        &self,
        collection: Collection,
        filters: &[Filter],
        order: &Order,
        range: RowRange,
    ) -> Result<Vec<Row>> {
        let uri = format!(
            "{}/{}?{}",
            self.base_url,
            collection.table(),
            select_query(filters, order)
        );
        log::debug!(
            "GET {} rows {}-{} ({} filters)",
            collection,
            range.from,
            range.to,
            filters.len()
        );

        let request = self
            .request(Method::GET, &uri)
            .header("Range-Unit", "items")
            .header("Range", format!("{}-{}", range.from, range.to))
            .body(Body::empty())
            .map_err(|e| StoreError::InvalidRequest(e.to_string()))?;

        let bytes = self.send(request).await?;
        let rows: Vec<Row> = serde_json::from_slice(&bytes)?;
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, row: Row) -> Result<Row> {
        let uri = format!("{}/{}", self.base_url, collection.table());
        let request = self
            .request(Method::POST, &uri)
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .body(Body::from(serde_json::to_vec(&row)?))
            .map_err(|e| StoreError::InvalidRequest(e.to_string()))?;

        let bytes = self.send(request).await?;
        // The backend echoes inserted rows as a one-element array.
        let mut rows: Vec<Row> = serde_json::from_slice(&bytes)?;
        rows.pop()
            .ok_or_else(|| StoreError::Other("insert returned no representation".into()))
    }

    async fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<()> {
        let uri = format!(
            "{}/{}?id=eq.{}",
            self.base_url,
            collection.table(),
            encode_component(id)
        );
        let request = self
            .request(Method::PATCH, &uri)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&patch)?))
            .map_err(|e| StoreError::InvalidRequest(e.to_string()))?;

        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let uri = format!(
            "{}/{}?id=eq.{}",
            self.base_url,
            collection.table(),
            encode_component(id)
        );
        let request = self
            .request(Method::DELETE, &uri)
            .body(Body::empty())
            .map_err(|e| StoreError::InvalidRequest(e.to_string()))?;

        self.send(request).await?;
        Ok(())
    }
}

/// Build the filter/order query string for a selection.
fn select_query(filters: &[Filter], order: &Order) -> String {
    let mut params: Vec<String> = Vec::with_capacity(filters.len() + 2);
    params.push("select=*".to_string());
    for filter in filters {
        match filter {
            Filter::Eq { field, value } => {
                params.push(format!(
                    "{}=eq.{}",
                    encode_component(field),
                    encode_component(value)
                ));
            }
            Filter::Ilike { field, pattern } => {
                // The wire dialect uses `*` where SQL uses `%`.
                let pattern = pattern.replace('%', "*");
                params.push(format!(
                    "{}=ilike.{}",
                    encode_component(field),
                    encode_component(&pattern)
                ));
            }
        }
    }
    let direction = if order.ascending { "asc" } else { "desc" };
    params.push(format!(
        "order={}.{direction}",
        encode_component(&order.field)
    ));
    params.join("&")
}

/// Percent-encode a query component. Only unreserved characters and `*`
/// (wildcard in the filter dialect) pass through.
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'*' => {
                out.push(byte as char);
            }
            other => {
                out.push_str(&format!("%{other:02X}"));
            }
        }
    }
    out
}
