use std::{
    fmt::Display,
    str::FromStr,
};

use super::ParseOrderIdError;

/// The textual prefix every order id carries on the wire.
pub const ORDER_ID_PREFIX: &str = "OrdId";

/// The identifier of an order.
///
/// The numeric value doubles as the slot index of the order in the cache's
/// primary store, so the mapping between id and slot is total and injective.
#[derive(Debug, Default, Clone, Copy, std::hash::Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderId(u64);

impl From<u64> for OrderId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl OrderId {
    /// The primary store slot this id addresses.
    #[inline(always)]
    pub fn slot(&self) -> usize {
        self.0 as usize
    }
}

impl FromStr for OrderId {
    type Err = ParseOrderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseOrderIdError::Empty);
        }
        let digits = s
            .strip_prefix(ORDER_ID_PREFIX)
            .ok_or(ParseOrderIdError::MissingPrefix)?;
        // `u64::from_str` would also accept a leading `+`.
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseOrderIdError::InvalidSlot);
        }
        let slot = digits
            .parse::<u64>()
            .map_err(|_| ParseOrderIdError::InvalidSlot)?;
        Ok(Self(slot))
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{ORDER_ID_PREFIX}{}", self.0)
    }
}

impl serde::Serialize for OrderId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for OrderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
