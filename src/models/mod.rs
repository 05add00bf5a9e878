pub mod crossover;
pub mod price;

pub use crossover::{CrossDirection, Crossover, Position};
pub use price::PricePoint;
