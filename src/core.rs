pub mod cache;
pub mod engine;
pub mod point;
pub mod refresh;
pub mod selector;
pub mod source;
pub mod store;
