//! HTTP handlers.

mod health;
mod invoke;

pub use health::health;
pub use invoke::invoke;

#[cfg(test)]
pub(crate) mod fakes;
