//! # 协议通信能力模块
//!
//! 管理与 Modbus TCP 从站之间的单个会话：
//! - **连接生命周期**：显式 connect / disconnect，首次使用时自动建连
//! - **有界重试**：连接类故障按 `retry_delay` 退避后重连重试，协议类错误立即失败
//! - **传输层**：基于 tokio-modbus 同步客户端（MBAP 帧，功能码 1/2/3/4/5/6/16）
//!
//! ## 架构设计
//!
//! ```text
//! TagHandler / 调用方
//!       │  ModbusRequest
//!       ▼
//! ConnectionManager ── Sleeper（重试间隔）
//!       │
//!       ▼
//! Connector ──► ModbusTransport
//!                    │
//!                    ▼
//!              TcpConnector / TcpTransport (tokio-modbus)
//! ```
//!
//! ## 配置格式
//!
//! ```json
//! { "host": "192.168.1.100", "port": 502, "unit_id": 1,
//!   "timeout_ms": 3000, "retry_count": 3, "retry_delay_ms": 1000 }
//! ```
//!
//! 会话不支持并发使用：所有 I/O 操作都需要 `&mut self`，
//! 多个调用方共享时需在外部加锁，或各自持有一个会话。

mod connection;
mod error;
mod modbus_tcp;
mod types;

pub use connection::{ConnectionManager, Connector, ModbusTransport, Sleeper, ThreadSleeper};
pub use error::ModbusError;
pub use modbus_tcp::TcpConnector;
pub use types::*;
