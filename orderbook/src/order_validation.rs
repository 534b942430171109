//! Validation of untrusted order submissions. Pure; all rules run before any
//! persistence side effect so the caller gets every problem in one response.

use lazy_static::lazy_static;
use model::OrderCreation;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE: Regex = Regex::new(r"^[0-9+\-()\s]+$").unwrap();
}

// Literal markup signatures that are never legitimate in a name or address.
// A minimal denylist, not a sanitizer; rendering clients still have to
// encode output.
const MARKUP_SIGNATURES: [&str; 3] = ["<script", "javascript:", "onerror="];

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 255;
const PHONE_MIN: usize = 10;
const PHONE_MAX: usize = 20;
const ADDRESS_MIN: usize = 10;
const ADDRESS_MAX: usize = 500;

/// Field-keyed validation messages as returned to the caller.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.keys().copied().collect()
    }
}

/// Checks an order submission and returns it with all free-text fields
/// trimmed, or the per-field error map.
pub fn validate(mut order: OrderCreation) -> Result<OrderCreation, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    order.customer_name = order.customer_name.trim().to_string();
    let name_len = order.customer_name.chars().count();
    if name_len < NAME_MIN {
        errors.add("customer_name", "name must be at least 2 characters");
    } else if name_len > NAME_MAX {
        errors.add("customer_name", "name must be less than 100 characters");
    }
    if contains_markup(&order.customer_name) {
        errors.add("customer_name", "invalid characters in name");
    }

    order.customer_email = order.customer_email.trim().to_string();
    if order.customer_email.chars().count() > EMAIL_MAX {
        errors.add("customer_email", "email must be less than 255 characters");
    } else if !is_valid_email(&order.customer_email) {
        errors.add("customer_email", "invalid email address");
    }

    order.customer_phone = order.customer_phone.trim().to_string();
    let phone_len = order.customer_phone.chars().count();
    if phone_len < PHONE_MIN {
        errors.add("customer_phone", "phone number must be at least 10 characters");
    } else if phone_len > PHONE_MAX {
        errors.add("customer_phone", "phone number must be less than 20 characters");
    } else if !PHONE.is_match(&order.customer_phone) {
        errors.add("customer_phone", "invalid phone number format");
    }

    order.delivery_address = order.delivery_address.trim().to_string();
    let address_len = order.delivery_address.chars().count();
    if address_len < ADDRESS_MIN {
        errors.add("delivery_address", "address must be at least 10 characters");
    } else if address_len > ADDRESS_MAX {
        errors.add("delivery_address", "address must be less than 500 characters");
    }
    if contains_markup(&order.delivery_address) {
        errors.add("delivery_address", "invalid characters in address");
    }

    if order.items.is_empty() {
        errors.add("items", "at least one item is required");
    }
    for item in &order.items {
        if !(item.price > 0.0) {
            errors.add("items", format!("item {} must have a positive price", item.id));
        }
        if item.quantity == 0 {
            errors.add(
                "items",
                format!("item {} must have a positive quantity", item.id),
            );
        }
    }

    if !(order.subtotal > 0.0) {
        errors.add("subtotal", "subtotal must be positive");
    }

    if errors.is_empty() {
        Ok(order)
    } else {
        Err(errors)
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

fn contains_markup(value: &str) -> bool {
    let lowered = value.to_lowercase();
    MARKUP_SIGNATURES
        .iter()
        .any(|signature| lowered.contains(signature))
}
