mod api_types;
mod cached_client;
mod client;
mod error;
mod retry;
#[cfg(test)]
pub mod testing;
mod types;

pub use cached_client::SofascoreClient;
pub use client::Fetcher;
pub use types::Event;
