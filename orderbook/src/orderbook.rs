use crate::{
    order_validation::{self, ValidationErrors},
    pricing::{self, PriceMismatch},
    redaction,
    storage::OrderStoring,
};
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use model::{Order, OrderCreation, OrderNumber, OrderStatus, RedactedOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub struct Orderbook {
    storage: Arc<dyn OrderStoring>,
}

/// What intake tells the customer about a freshly placed order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderConfirmation {
    pub order_number: OrderNumber,
    pub estimated_delivery: String,
    pub total_amount: f64,
}

#[derive(Debug, PartialEq)]
pub enum AddOrderResult {
    Placed(OrderConfirmation),
    /// Honeypot tripped: the caller gets a syntactically valid order number
    /// but nothing is persisted.
    Decoyed(OrderNumber),
    Invalid(ValidationErrors),
    PriceMismatch,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TrackingRequest {
    pub order_number: String,
    pub customer_email: String,
}

#[derive(Debug, PartialEq)]
pub enum TrackOrderResult {
    Found(RedactedOrder),
    Malformed,
    NotFound,
}

impl Orderbook {
    pub fn new(storage: Arc<dyn OrderStoring>) -> Self {
        Self { storage }
    }

    pub async fn add_order(&self, order: OrderCreation) -> Result<AddOrderResult> {
        if order.honeypot.as_deref().map_or(false, |v| !v.is_empty()) {
            tracing::debug!("honeypot field set, returning decoy confirmation");
            return Ok(AddOrderResult::Decoyed(OrderNumber::generate()));
        }
        let order = match order_validation::validate(order) {
            Ok(order) => order,
            Err(errors) => return Ok(AddOrderResult::Invalid(errors)),
        };
        let quote = match pricing::quote(&order.items, order.subtotal) {
            Ok(quote) => quote,
            Err(PriceMismatch { declared, computed }) => {
                // The computed value stays out of the response so a prober
                // cannot use the endpoint as a price oracle.
                tracing::warn!(
                    declared,
                    computed,
                    "subtotal mismatch, possible price tampering"
                );
                return Ok(AddOrderResult::PriceMismatch);
            }
        };
        let order_number = OrderNumber::generate();
        let estimated_delivery = pricing::delivery_window(Local::now());
        let record = Order {
            order_number: order_number.clone(),
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            delivery_address: order.delivery_address,
            items: order.items,
            subtotal: quote.subtotal,
            delivery_fee: quote.delivery_fee,
            total_amount: quote.total_amount,
            payment_method: order.payment_method,
            status: OrderStatus::Accepted,
            estimated_delivery: estimated_delivery.clone(),
            created_at: Utc::now(),
        };
        // A failed write is reported, not retried; retrying a price
        // sensitive write risks duplicate orders.
        self.storage
            .insert_order(&record)
            .await
            .context("insert_order failed")?;
        tracing::info!(%order_number, total_amount = record.total_amount, "order placed");
        Ok(AddOrderResult::Placed(OrderConfirmation {
            order_number,
            estimated_delivery,
            total_amount: record.total_amount,
        }))
    }

    pub async fn track_order(&self, request: &TrackingRequest) -> Result<TrackOrderResult> {
        let order_number: OrderNumber = match request.order_number.parse() {
            Ok(number) => number,
            Err(err) => {
                tracing::debug!(?err, "rejecting malformed order number");
                return Ok(TrackOrderResult::Malformed);
            }
        };
        let customer_email = request.customer_email.trim();
        if !order_validation::is_valid_email(customer_email) {
            return Ok(TrackOrderResult::Malformed);
        }
        let order = self
            .storage
            .single_order(&order_number, customer_email)
            .await
            .context("single_order failed")?;
        Ok(match order {
            Some(order) => TrackOrderResult::Found(redaction::redact(order)),
            None => TrackOrderResult::NotFound,
        })
    }
}
