pub mod mocks;
pub mod provider;
pub mod yahoo;

pub use provider::{validate_price_data, PriceProvider};
pub use yahoo::YahooProvider;
