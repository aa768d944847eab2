//! Outbound clients for the external payment providers. Each call maps
//! failures to [`AppError::Provider`]; callers leave the order pending and
//! surface the message to the user.

pub mod cinetpay;
pub mod stripe;
