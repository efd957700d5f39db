/// Control-plane API client
pub mod client;
pub mod models;

pub use client::OktetoClient;
