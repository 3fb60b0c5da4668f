//! Wire-level building blocks for the Waave hosted checkout.
//!
//! * [`objects`] holds the checkout request sent to the hosted payment page
//!   and the callback payload the provider posts back.
//! * [`signature`] implements the `X-Api-Signature` digest used to
//!   authenticate callbacks.

pub mod objects;
pub mod signature;
