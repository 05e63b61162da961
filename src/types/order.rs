use getset::{
    CopyGetters,
    Getters,
};
use serde::{
    Deserialize,
    Serialize,
};

use super::{
    InvalidOrderError,
    OrderId,
    Side,
};

/// A quoted intention to buy or sell a fixed quantity of a security,
/// submitted by a user acting for a company. Immutable once constructed;
/// the only edit model is cancel and re-add.
#[derive(Debug, Clone, Eq, PartialEq, Getters, CopyGetters, Serialize, Deserialize)]
#[cfg_attr(test, derive(typed_builder::TypedBuilder))]
pub struct Order {
    /// The unique order id, doubling as the primary store slot of the order.
    #[getset(get_copy = "pub")]
    id: OrderId,

    /// The security this order quotes.
    #[getset(get = "pub")]
    #[cfg_attr(test, builder(setter(into)))]
    security_id: String,

    /// Whether its a buy or sell order.
    #[getset(get_copy = "pub")]
    side: Side,

    /// The quantity of the security this order is for. Always positive.
    #[getset(get_copy = "pub")]
    quantity: u32,

    /// The user that submitted the order.
    #[getset(get = "pub")]
    #[cfg_attr(test, builder(setter(into)))]
    user: String,

    /// The company the user acts for. Orders of one company never cross.
    #[getset(get = "pub")]
    #[cfg_attr(test, builder(setter(into)))]
    company: String,
}

impl Order {
    /// Create a new order from its wire-level fields.
    ///
    /// The fields are checked in a fixed sequence: the order id must decode
    /// (non-empty, `OrdId` prefix, decimal slot suffix), the security id,
    /// user and company must be non-empty and the quantity must be positive.
    ///
    /// # Returns:
    /// Either a successfully created instance or an [`InvalidOrderError`]
    pub fn new(
        order_id: &str,
        security_id: &str,
        side: Side,
        quantity: u32,
        user: &str,
        company: &str,
    ) -> Result<Self, InvalidOrderError> {
        let id = order_id.parse::<OrderId>()?;
        if security_id.is_empty() {
            return Err(InvalidOrderError::EmptySecurityId);
        }
        if user.is_empty() {
            return Err(InvalidOrderError::EmptyUser);
        }
        if company.is_empty() {
            return Err(InvalidOrderError::EmptyCompany);
        }
        if quantity == 0 {
            return Err(InvalidOrderError::ZeroQuantity);
        }
        Ok(Self {
            id,
            security_id: security_id.to_owned(),
            side,
            quantity,
            user: user.to_owned(),
            company: company.to_owned(),
        })
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "id: {}, security_id: {}, side: {}, quantity: {}, user: {}, company: {}",
            self.id, self.security_id, self.side, self.quantity, self.user, self.company
        )
    }
}
