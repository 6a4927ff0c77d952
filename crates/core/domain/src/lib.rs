//! 标签桥接的共享领域模型。

pub mod data;

pub use data::{RegisterKind, TagValue, ValueKind};
