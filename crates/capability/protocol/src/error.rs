//! 协议错误类型定义

/// Modbus 通信错误
///
/// 只有 [`ModbusError::Connection`] 会被连接管理器重试，其余错误立即返回。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModbusError {
    /// 连接错误（建连失败、I/O 错误、超时、对端关闭）
    #[error("connection error: {0}")]
    Connection(String),

    /// 从站返回异常响应
    #[error("modbus exception (function 0x{function:02X}): {detail}")]
    Exception { function: u8, detail: String },

    /// 响应格式错误或与请求不匹配
    #[error("protocol error: {0}")]
    Protocol(String),

    /// 请求在发出前即被拒绝
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// 重试耗尽
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<ModbusError>,
    },

    /// 配置解析错误
    #[error("config parse error: {0}")]
    ConfigParse(String),
}

impl ModbusError {
    /// 是否为可重试的连接类故障。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// 是否属于连接层失败（含重试耗尽）。
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::RetriesExhausted { .. })
    }
}
