use reqwest::Method;
use tracing::{info, instrument};

use super::ApiClient;
use crate::api::ApiError;
use crate::api::conversions::{convert_order, convert_orders, unwrap_envelope};
use crate::api::types::{NewOrder, Order};

impl ApiClient {
    /// Place a QR pickup order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a zero quantity, or an error from
    /// the backend such as an out-of-stock rejection.
    #[instrument(skip(self, order), fields(product_id = %order.product_id, quantity = order.quantity))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        if order.quantity < 1 {
            return Err(ApiError::validation("Quantity must be greater than zero"));
        }
        let body = self.send_json(Method::POST, "/orders", order).await?;
        let order = convert_order(&unwrap_envelope(body, &["order"]))?;
        info!(order_id = %order.id, order_number = ?order.order_number, "Order placed");
        Ok(order)
    }

    /// The customer's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        convert_orders(self.get("/orders").await?)
    }
}
