//! Domain models shared across the digest job.

pub mod price;

pub use price::{IndexSpec, PricePoint, Ticker};
