use thiserror::Error;

use super::ORDER_ID_PREFIX;

/// zero-sized error for a side keyword that is neither `Buy` nor `Sell`.
#[derive(Error, Debug, Clone, derive_more::Display, Eq, PartialEq)]
#[display("the side is neither `Buy` nor `Sell`")]
pub struct ParseSideError;

/// The possible errors when decoding the textual form of an order id.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[allow(missing_docs, reason = "Self documenting")]
pub enum ParseOrderIdError {
    #[error("the order id is empty")]
    Empty,

    #[error("the order id does not start with the `{}` prefix", ORDER_ID_PREFIX)]
    MissingPrefix,

    #[error("the order id suffix is not a decimal slot index")]
    InvalidSlot,
}

/// The possible errors when constructing an [`Order`](super::Order) from its
/// wire-level fields.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[allow(missing_docs, reason = "Self documenting")]
pub enum InvalidOrderError {
    #[error(transparent)]
    OrderId(#[from] ParseOrderIdError),

    #[error("the security id is empty")]
    EmptySecurityId,

    #[error("the user is empty")]
    EmptyUser,

    #[error("the company is empty")]
    EmptyCompany,

    #[error(transparent)]
    InvalidSide(#[from] ParseSideError),

    #[error("the order quantity is zero")]
    ZeroQuantity,
}

/// Describes possible Errors that may occur when calling methods in this crate
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[allow(missing_docs, reason = "Self documenting")]
pub enum Error {
    #[error(transparent)]
    InvalidOrder(#[from] InvalidOrderError),

    #[error(transparent)]
    ParseOrderId(#[from] ParseOrderIdError),
}
