//! Adapter for the IFC analysis backend.

mod client;

pub use client::{extract_detail, ApiClient};
