mod methods;
mod transitions;
mod types;

#[cfg(test)]
mod tests;

pub use types::{EpochPolicy, Slice, Stage, View, ALL_SLICES, PARTITION_SLICES};
