//! One-way masking of personal fields before a record is returned to a
//! caller whose only credential is knowing the order number and email.

use model::{Order, RedactedOrder};

const MASK: &str = "***";

/// Projects an order onto its redacted view. Deterministic and lossy; only
/// the documented fragments of each field survive.
pub fn redact(order: Order) -> RedactedOrder {
    RedactedOrder {
        order_number: order.order_number,
        customer_name: mask_name(&order.customer_name),
        customer_email: mask_email(&order.customer_email),
        customer_phone: mask_phone(&order.customer_phone),
        delivery_address: mask_address(&order.delivery_address),
        items: order.items,
        subtotal: order.subtotal,
        delivery_fee: order.delivery_fee,
        total_amount: order.total_amount,
        payment_method: order.payment_method,
        status: order.status,
        estimated_delivery: order.estimated_delivery,
        created_at: order.created_at,
    }
}

// First name only.
fn mask_name(name: &str) -> String {
    let mut tokens = name.split_whitespace();
    let first = tokens.next().unwrap_or_default();
    if tokens.next().is_some() {
        format!("{} {}", first, MASK)
    } else {
        first.to_string()
    }
}

// First two characters of the local part plus the domain.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let keep: String = local.chars().take(2).collect();
            format!("{}{}@{}", keep, MASK, domain)
        }
        None => MASK.to_string(),
    }
}

// Everything but the trailing four characters.
fn mask_phone(phone: &str) -> String {
    let total = phone.chars().count();
    if total <= 4 {
        return phone.to_string();
    }
    let tail: String = phone.chars().skip(total - 4).collect();
    format!("{}{}", "*".repeat(total - 4), tail)
}

// Only the last comma-delimited segment, intended to leave a city or pin
// code fragment.
fn mask_address(address: &str) -> String {
    match address.rsplit_once(',') {
        Some((_, last)) => format!("{},{}", MASK, last.trim()),
        None => MASK.to_string(),
    }
}
