use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    borrow::Cow,
    fmt::{self, Display},
    str::FromStr,
};

/// A single menu item position of an order.
#[derive(PartialEq, Clone, Debug, Default, Deserialize, Serialize)]
pub struct LineItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(rename = "isVeg")]
    pub is_veg: bool,
}

/// The closed set of payment method labels the storefront offers.
///
/// Card, UPI and wallet details are collected by the storefront for display
/// purposes only and never reach this service.
#[derive(Eq, PartialEq, Clone, Copy, Debug, Deserialize, Serialize, Hash)]
pub enum PaymentMethod {
    #[serde(rename = "UPI Payment")]
    Upi,
    #[serde(rename = "Credit / Debit Card")]
    Card,
    #[serde(rename = "Mobile Wallet")]
    Wallet,
    #[serde(rename = "Cash on Delivery")]
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Upi => "UPI Payment",
            Self::Card => "Credit / Debit Card",
            Self::Wallet => "Mobile Wallet",
            Self::CashOnDelivery => "Cash on Delivery",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::CashOnDelivery
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownLabelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPI Payment" => Ok(Self::Upi),
            "Credit / Debit Card" => Ok(Self::Card),
            "Mobile Wallet" => Ok(Self::Wallet),
            "Cash on Delivery" => Ok(Self::CashOnDelivery),
            _ => Err(UnknownLabelError(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown payment method label {0:?}")]
pub struct UnknownLabelError(String);

/// The fulfillment state of an order.
///
/// Intake only ever writes `Accepted`. Later transitions are written by the
/// fulfillment process outside of this service, so lookup has to tolerate
/// values this binary does not know about.
#[derive(Eq, PartialEq, Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Accepted,
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Unknown => "unknown",
        }
    }

    /// Total function on purpose: statuses written by the fulfillment process
    /// must survive a round trip through the database even when this binary
    /// predates them.
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "accepted" => Self::Accepted,
            "pending" => Self::Pending,
            "confirmed" => Self::Confirmed,
            "preparing" => Self::Preparing,
            "out_for_delivery" => Self::OutForDelivery,
            "delivered" => Self::Delivered,
            _ => Self::Unknown,
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Accepted
    }
}

/// An order as submitted by the storefront.
///
/// Untrusted input. It only lives for the duration of one request and is
/// never persisted verbatim; the persisted [`Order`] is derived from it after
/// validation and price recomputation.
#[derive(PartialEq, Clone, Debug, Default, Deserialize, Serialize)]
pub struct OrderCreation {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub items: Vec<LineItem>,
    /// Client-declared subtotal. Checked against the recomputed value and
    /// then discarded.
    pub subtotal: f64,
    pub payment_method: PaymentMethod,
    /// Hidden form field legitimate clients never populate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub honeypot: Option<String>,
}

/// An order record as persisted and returned by the order store.
///
/// Invariants: `total_amount = subtotal + delivery_fee` and `subtotal` is the
/// sum of `price * quantity` over `items`. Payment instrument details are not
/// representable here on purpose.
#[derive(PartialEq, Clone, Debug, Default, Deserialize, Serialize)]
pub struct Order {
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub estimated_delivery: String,
    pub created_at: DateTime<Utc>,
}

/// The projection of an [`Order`] that is safe to show to a caller whose only
/// credential is knowing the order number and email.
#[derive(PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct RedactedOrder {
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub estimated_delivery: String,
    pub created_at: DateTime<Utc>,
}

const ORDER_NUMBER_PREFIX: &str = "HH";
const ORDER_NUMBER_MIN_LEN: usize = 5;
const ORDER_NUMBER_MAX_LEN: usize = 30;
const ORDER_NUMBER_ENTROPY_BYTES: usize = 4;

/// The sole externally exposed identifier of an order.
///
/// Prefix, base-36 encoded creation time in milliseconds, followed by a block
/// of hex characters from a secure random generator. The random block is what
/// keeps neighbouring order numbers unguessable; a purely time-derived
/// identifier would let a caller enumerate other customers' orders through
/// the tracking endpoint.
#[derive(Clone, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn generate() -> Self {
        // Sub-epoch clocks only happen on badly misconfigured hosts; saturate
        // instead of panicking.
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let mut entropy = [0u8; ORDER_NUMBER_ENTROPY_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut entropy);
        Self::from_parts(millis, entropy)
    }

    fn from_parts(timestamp_millis: u64, entropy: [u8; ORDER_NUMBER_ENTROPY_BYTES]) -> Self {
        Self(format!(
            "{}{}{}",
            ORDER_NUMBER_PREFIX,
            base36(timestamp_millis),
            hex::encode_upper(entropy)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderNumber {
    type Err = ParseOrderNumberError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !(ORDER_NUMBER_MIN_LEN..=ORDER_NUMBER_MAX_LEN).contains(&s.len()) {
            return Err(ParseOrderNumberError::WrongLength);
        }
        if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ParseOrderNumberError::InvalidCharacter);
        }
        let normalized = s.to_ascii_uppercase();
        if !normalized.starts_with(ORDER_NUMBER_PREFIX) {
            return Err(ParseOrderNumberError::MissingPrefix);
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseOrderNumberError {
    #[error("order number must be 5 to 30 characters")]
    WrongLength,
    #[error("order number must start with \"HH\"")]
    MissingPrefix,
    #[error("order number must be alphanumeric")]
    InvalidCharacter,
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Default for OrderNumber {
    fn default() -> Self {
        Self::from_parts(0, [0u8; ORDER_NUMBER_ENTROPY_BYTES])
    }
}

impl Serialize for OrderNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D>(deserializer: D) -> Result<OrderNumber, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Cow::<str>::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

fn base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    // Unwrap because the digits are always valid utf8.
    String::from_utf8(digits).unwrap()
}
