pub mod conversion;

pub use conversion::{parse_u64, parse_u256, quantity};
