pub mod aggregation;

pub use aggregation::top_n;
