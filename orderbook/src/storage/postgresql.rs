use super::OrderStoring;
use anyhow::{Context, Result};
use model::{order::OrderStatus, LineItem, Order, OrderNumber, PaymentMethod};
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};

// Expected schema:
//
// CREATE TABLE orders (
//     order_number text PRIMARY KEY,
//     customer_name text NOT NULL,
//     customer_email text NOT NULL,
//     customer_phone text NOT NULL,
//     delivery_address text NOT NULL,
//     items jsonb NOT NULL,
//     subtotal double precision NOT NULL,
//     delivery_fee double precision NOT NULL,
//     total_amount double precision NOT NULL,
//     payment_method text NOT NULL,
//     status text NOT NULL,
//     estimated_delivery text NOT NULL,
//     created_at timestamptz NOT NULL
// );

// The pool uses an Arc internally.
#[derive(Clone)]
pub struct Postgres {
    pool: PgPool,
}

impl Postgres {
    pub fn new(uri: &str) -> Result<Self> {
        Ok(Self {
            pool: PgPool::connect_lazy(uri)?,
        })
    }
}

#[async_trait::async_trait]
impl OrderStoring for Postgres {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        const QUERY: &str = "\
            INSERT INTO orders (\
                order_number, customer_name, customer_email, customer_phone, \
                delivery_address, items, subtotal, delivery_fee, total_amount, \
                payment_method, status, estimated_delivery, created_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13);";
        sqlx::query(QUERY)
            .bind(order.order_number.as_str())
            .bind(&order.customer_name)
            .bind(&order.customer_email)
            .bind(&order.customer_phone)
            .bind(&order.delivery_address)
            .bind(Json(&order.items))
            .bind(order.subtotal)
            .bind(order.delivery_fee)
            .bind(order.total_amount)
            .bind(order.payment_method.label())
            .bind(order.status.as_str())
            .bind(&order.estimated_delivery)
            .bind(order.created_at)
            .execute(&self.pool)
            .await
            .context("insert_order failed")?;
        Ok(())
    }

    async fn single_order(
        &self,
        order_number: &OrderNumber,
        customer_email: &str,
    ) -> Result<Option<Order>> {
        const QUERY: &str = "\
            SELECT order_number, customer_name, customer_email, customer_phone, \
                   delivery_address, items, subtotal, delivery_fee, total_amount, \
                   payment_method, status, estimated_delivery, created_at \
            FROM orders \
            WHERE order_number = $1 AND lower(customer_email) = lower($2);";
        let row = sqlx::query(QUERY)
            .bind(order_number.as_str())
            .bind(customer_email)
            .fetch_optional(&self.pool)
            .await
            .context("single_order failed")?;
        row.map(order_from_row).transpose()
    }
}

fn order_from_row(row: PgRow) -> Result<Order> {
    let order_number: String = row.try_get("order_number")?;
    let items: Json<Vec<LineItem>> = row.try_get("items")?;
    let payment_method: String = row.try_get("payment_method")?;
    let status: String = row.try_get("status")?;
    Ok(Order {
        order_number: order_number
            .parse::<OrderNumber>()
            .context("malformed order number in database")?,
        customer_name: row.try_get("customer_name")?,
        customer_email: row.try_get("customer_email")?,
        customer_phone: row.try_get("customer_phone")?,
        delivery_address: row.try_get("delivery_address")?,
        items: items.0,
        subtotal: row.try_get("subtotal")?,
        delivery_fee: row.try_get("delivery_fee")?,
        total_amount: row.try_get("total_amount")?,
        payment_method: payment_method
            .parse::<PaymentMethod>()
            .context("unknown payment method in database")?,
        status: OrderStatus::from_db_str(&status),
        estimated_delivery: row.try_get("estimated_delivery")?,
        created_at: row.try_get("created_at")?,
    })
}
