//! Order endpoints.

use std::future::Future;

use serde::Deserialize;
use tracing::{info, instrument};

use preciosa_core::{OrderId, OrderStatus, PaymentMethod, Price, UserId};

use super::{ApiClient, ApiError};
use crate::order::{OrderLine, OrderRequest};

/// Creation time as the backend reports it: epoch milliseconds or an
/// ISO-8601 string, depending on the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OrderTimestamp {
    Millis(i64),
    Text(String),
}

impl std::fmt::Display for OrderTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Millis(ms) => match chrono::DateTime::from_timestamp_millis(*ms) {
                Some(at) => write!(f, "{}", at.format("%d/%m/%Y %H:%M")),
                None => write!(f, "{ms}"),
            },
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// An order as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteOrder {
    pub id: OrderId,
    pub total: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, alias = "metodo_pagamento")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub created_at: Option<OrderTimestamp>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default, alias = "produtos")]
    pub items: Vec<OrderLine>,
}

/// Remote order persistence.
pub trait OrderApi: Send + Sync {
    /// Submit an order. `bearer` is attached when the buyer has a remote
    /// session.
    fn create_order(
        &self,
        order: &OrderRequest,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<RemoteOrder, ApiError>> + Send;
}

impl OrderApi for ApiClient {
    #[instrument(skip(self, order, bearer), fields(order_id = %order.id))]
    async fn create_order(
        &self,
        order: &OrderRequest,
        bearer: Option<&str>,
    ) -> Result<RemoteOrder, ApiError> {
        let created: RemoteOrder = self.post_json("orders", order, bearer).await?;
        info!(remote_id = %created.id, "Order created remotely");
        Ok(created)
    }
}

impl ApiClient {
    /// Orders the backend holds for `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, bearer), fields(user_id = %user))]
    pub async fn orders_for_user(
        &self,
        user: &UserId,
        bearer: &str,
    ) -> Result<Vec<RemoteOrder>, ApiError> {
        let path = format!("orders/user/{}", urlencoding::encode(user.as_str()));
        self.get_json(&path, &[], Some(bearer)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_order_auth_api_shape() {
        let json = r#"{
            "id": 12,
            "total": 120.0,
            "created_at": "2025-03-01T12:00:00",
            "channel": "whatsapp",
            "items": [{"product_id": "P001", "sku": "PM-1", "name": "Blusa", "qty": 2, "price": 40.0}]
        }"#;
        let order: RemoteOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, OrderId::new("12"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 1);
        assert_eq!(
            order.created_at,
            Some(OrderTimestamp::Text("2025-03-01T12:00:00".into()))
        );
    }

    #[test]
    fn test_remote_order_backend_shape() {
        let json = r#"{
            "id": "a1b2",
            "user_id": "u1",
            "user_nome": "Ana",
            "produtos": [{"product_id": "P1", "nome": "Saia", "quantidade": 1, "preco_unitario": 95.0}],
            "total": 95.0,
            "status": "enviado",
            "metodo_pagamento": "boleto",
            "created_at": 1700000000000
        }"#;
        let order: RemoteOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.payment_method, Some(PaymentMethod::Boleto));
        assert_eq!(order.items[0].name, "Saia");
        assert_eq!(order.items[0].sku, "");
        assert_eq!(order.created_at.unwrap().to_string(), "14/11/2023 22:13");
    }
}
