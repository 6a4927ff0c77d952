//! # 标签能力模块
//!
//! 把标签名解析为寄存器映射项，经连接管理器读写原始寄存器，
//! 再通过转换函数得到类型化的标签值。
//!
//! ```text
//! read_tag("temperature")
//!       │
//!       ▼
//! RegisterMap ──► RegisterMapEntry { holding, 10, float32, scale 0.1 }
//!       │
//!       ▼
//! ConnectionManager::read_holding_registers(10, 2)
//!       │
//!       ▼
//! tagbridge_convert::decode_registers ──► TagValue::Float32 × scale
//! ```
//!
//! 重试只发生在连接管理器中，本层不做任何重试；
//! 所有失败都归一为 [`TagError`]。

mod coerce;
mod error;
mod handler;
mod register_map;

pub use coerce::coerce_value;
pub use error::{RegisterMapError, TagError};
pub use handler::TagHandler;
pub use register_map::{RegisterMap, RegisterMapEntry};
