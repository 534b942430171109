//! Server side price recomputation. The client declared subtotal is
//! untrusted; this module is the sole source of truth for what an order
//! costs.

use chrono::{DateTime, Duration, Local};
use model::LineItem;

/// Orders at or above this subtotal are delivered for free.
pub const FREE_DELIVERY_THRESHOLD: f64 = 300.0;
pub const DELIVERY_FEE: f64 = 30.0;
/// Absorbs floating point noise in the declared subtotal. Any larger
/// discrepancy is treated as tampering.
pub const SUBTOTAL_TOLERANCE: f64 = 0.01;

const DELIVERY_MIN_MINUTES: i64 = 30;
const DELIVERY_MAX_MINUTES: i64 = 45;

/// The authoritative amounts persisted with an order.
#[derive(Clone, Debug, PartialEq)]
pub struct Quote {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("declared subtotal {declared} does not match recomputed subtotal {computed}")]
pub struct PriceMismatch {
    pub declared: f64,
    pub computed: f64,
}

/// Recomputes the subtotal from the validated line items and derives the
/// delivery fee and total. The declared subtotal is only used for the
/// tampering check and discarded afterwards.
pub fn quote(items: &[LineItem], declared_subtotal: f64) -> Result<Quote, PriceMismatch> {
    let subtotal: f64 = items
        .iter()
        .map(|item| item.price * item.quantity as f64)
        .sum();
    if (subtotal - declared_subtotal).abs() > SUBTOTAL_TOLERANCE {
        return Err(PriceMismatch {
            declared: declared_subtotal,
            computed: subtotal,
        });
    }
    let delivery_fee = if subtotal >= FREE_DELIVERY_THRESHOLD {
        0.0
    } else {
        DELIVERY_FEE
    };
    Ok(Quote {
        subtotal,
        delivery_fee,
        total_amount: subtotal + delivery_fee,
    })
}

/// The delivery window shown to the customer, for example
/// "07:42 PM - 07:57 PM".
pub fn delivery_window(now: DateTime<Local>) -> String {
    let from = now + Duration::minutes(DELIVERY_MIN_MINUTES);
    let to = now + Duration::minutes(DELIVERY_MAX_MINUTES);
    format!("{} - {}", from.format("%I:%M %p"), to.format("%I:%M %p"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(price: f64, quantity: u32) -> LineItem {
        LineItem {
            id: "item".to_string(),
            name: "Item".to_string(),
            price,
            quantity,
            is_veg: false,
        }
    }

    #[test]
    fn small_order_pays_the_delivery_fee() {
        let quote = quote(&[item(100.0, 2)], 200.0).unwrap();
        assert_eq!(quote.subtotal, 200.0);
        assert_eq!(quote.delivery_fee, 30.0);
        assert_eq!(quote.total_amount, 230.0);
    }

    #[test]
    fn large_order_is_delivered_for_free() {
        let quote = quote(&[item(150.0, 2)], 300.0).unwrap();
        assert_eq!(quote.subtotal, 300.0);
        assert_eq!(quote.delivery_fee, 0.0);
        assert_eq!(quote.total_amount, 300.0);
    }

    #[test]
    fn subtotal_is_the_sum_over_all_items() {
        let items = [item(42.5, 2), item(10.0, 3), item(99.0, 1)];
        let quote = quote(&items, 214.0).unwrap();
        assert_eq!(quote.subtotal, 214.0);
    }

    #[test]
    fn tampered_subtotal_is_rejected() {
        let result = quote(&[item(100.0, 2)], 150.0);
        assert_eq!(
            result,
            Err(PriceMismatch {
                declared: 150.0,
                computed: 200.0,
            })
        );
    }

    #[test]
    fn floating_point_noise_is_tolerated() {
        assert!(quote(&[item(100.0, 2)], 200.005).is_ok());
        assert!(quote(&[item(100.0, 2)], 200.02).is_err());
    }

    #[test]
    fn delivery_window_formats_local_clock_times() {
        let now = Local.with_ymd_and_hms(2024, 5, 1, 19, 12, 0).unwrap();
        assert_eq!(delivery_window(now), "07:42 PM - 07:57 PM");
    }
}
