// Series module: synthetic price history anchored to a current price.

pub mod fallback;
pub mod generator;

pub use fallback::{PriceOrigin, resolve_anchor};
pub use generator::generate_series;
