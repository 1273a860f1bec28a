//! Order command API
//!
//! REST client for the `/pedido` resource. Every mutating call returns the
//! full updated order representation, which callers feed straight into
//! `OrderStore::upsert` - command responses and push events share one
//! reconciliation path.

use crate::config::ClientConfig;
use crate::error::{ClientResult, handle_response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::order::{AddLines, CreateOrder, LineSelection, NewOrderLine, Order, OrderFilter};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the order command API
#[derive(Debug, Clone)]
pub struct OrderApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl OrderApi {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .request(reqwest::Method::PUT, path)
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.request(reqwest::Method::PUT, path).send().await?;
        handle_response(response).await
    }

    // ==================== /pedido operations ====================

    /// Create an order with its initial lines (all start PENDIENTE)
    pub async fn create(&self, order: &CreateOrder) -> ClientResult<Order> {
        self.post("/pedido", order).await
    }

    /// Fetch one order by id
    pub async fn fetch(&self, order_id: &str) -> ClientResult<Order> {
        self.get(&format!("/pedido/{order_id}")).await
    }

    /// List orders matching the filter
    pub async fn list(&self, filter: &OrderFilter) -> ClientResult<Vec<Order>> {
        let response = self
            .request(reqwest::Method::GET, "/pedido")
            .query(filter)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Add lines to an existing order
    pub async fn add_lines(&self, order_id: &str, lines: Vec<NewOrderLine>) -> ClientResult<Order> {
        self.put(&format!("/pedido/{order_id}"), &AddLines { lines })
            .await
    }

    /// Cancel the whole order
    pub async fn cancel(&self, order_id: &str) -> ClientResult<Order> {
        self.put_empty(&format!("/pedido/{order_id}/cancelar")).await
    }

    /// Cancel a single line
    pub async fn cancel_line(&self, order_id: &str, line_id: &str) -> ClientResult<Order> {
        self.put_empty(&format!("/pedido/{order_id}/linea/{line_id}/cancelar"))
            .await
    }

    /// Kitchen picked the order up (→ EN_PROCESO)
    pub async fn start(&self, order_id: &str) -> ClientResult<Order> {
        self.put_empty(&format!("/pedido/{order_id}/iniciar")).await
    }

    /// Mark lines ready for pickup; empty selection means the whole order
    pub async fn mark_ready(&self, order_id: &str, line_ids: &[String]) -> ClientResult<Order> {
        self.put(
            &format!("/pedido/{order_id}/listo"),
            &LineSelection {
                line_ids: line_ids.to_vec(),
            },
        )
        .await
    }

    /// Deliver lines to the table; empty selection means the whole order
    pub async fn deliver(&self, order_id: &str, line_ids: &[String]) -> ClientResult<Order> {
        self.put(
            &format!("/pedido/{order_id}/entregar-detalles"),
            &LineSelection {
                line_ids: line_ids.to_vec(),
            },
        )
        .await
    }

    /// Close the order (→ FINALIZADO)
    pub async fn finalize(&self, order_id: &str) -> ClientResult<Order> {
        self.put_empty(&format!("/pedido/{order_id}/finalizar")).await
    }
}
