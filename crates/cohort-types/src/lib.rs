pub mod keys;

pub use keys::Identity;

/// Fixed-point denominator for revenue shares: 10000 bp = 100%.
pub const BASIS_POINTS: u64 = 10_000;
