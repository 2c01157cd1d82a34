pub mod price_cache;

pub use price_cache::{CacheKey, PriceCache};
