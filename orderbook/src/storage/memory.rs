use super::OrderStoring;
use anyhow::{bail, Result};
use model::{Order, OrderNumber};
use std::collections::{hash_map::Entry, HashMap};
use tokio::sync::RwLock;

/// In-memory order store used by tests and local runs without a database.
#[derive(Debug, Default)]
pub struct InMemoryOrders {
    orders: RwLock<HashMap<OrderNumber, Order>>,
}

impl InMemoryOrders {
    pub async fn count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait::async_trait]
impl OrderStoring for InMemoryOrders {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        match orders.entry(order.order_number.clone()) {
            Entry::Occupied(_) => bail!("order {} already exists", order.order_number),
            Entry::Vacant(entry) => {
                entry.insert(order.clone());
            }
        }
        Ok(())
    }

    async fn single_order(
        &self,
        order_number: &OrderNumber,
        customer_email: &str,
    ) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .get(order_number)
            .filter(|order| order.customer_email.eq_ignore_ascii_case(customer_email))
            .cloned())
    }
}
