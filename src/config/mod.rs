//! JSON configurations for the demo tools.
pub mod segment_demo;
