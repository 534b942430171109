pub mod memory;
pub mod postgresql;

use anyhow::Result;
use model::{Order, OrderNumber};

/// Persistence of order records. The store is expected to enforce uniqueness
/// of the order number.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait OrderStoring: Send + Sync {
    /// Inserts a new record. Records are written exactly once and never
    /// mutated afterwards by this service; inserting an existing order
    /// number is an error.
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Returns the record matching the order number whose stored customer
    /// email equals the given one case-insensitively. A correct order number
    /// with the wrong email is indistinguishable from no record.
    async fn single_order(
        &self,
        order_number: &OrderNumber,
        customer_email: &str,
    ) -> Result<Option<Order>>;
}
