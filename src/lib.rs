pub mod config;
pub mod confidence;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod odds;
pub mod policy;
pub mod props;
pub mod slate;
pub mod spread;
pub mod stats;
pub mod store;
pub mod strength;
pub mod teams;
pub mod totals;
