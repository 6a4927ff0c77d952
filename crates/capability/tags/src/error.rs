//! 标签层错误类型定义

use tagbridge_protocol::ModbusError;

/// 标签读写错误（调用方看到的唯一错误类型）
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TagError {
    /// 映射表中不存在该标签（未发生任何 I/O）
    #[error("unknown tag: {0}")]
    UnknownTag(String),

    /// 连接故障（含重试耗尽）
    #[error("connection error: {0}")]
    Connection(String),

    /// 从站异常响应、响应格式错误或非法请求
    #[error("protocol error: {0}")]
    Protocol(String),

    /// 原始数据不足或无法解码
    #[error("conversion error: {0}")]
    Conversion(String),

    /// 写入值无法转换为标签类型
    #[error("cannot coerce value: {0}")]
    WriteCoercion(String),

    /// 只读区域（离散输入 / 输入寄存器）
    #[error("tag is read-only: {0}")]
    ReadOnly(String),
}

impl From<ModbusError> for TagError {
    fn from(err: ModbusError) -> Self {
        if err.is_connection_failure() {
            TagError::Connection(err.to_string())
        } else {
            TagError::Protocol(err.to_string())
        }
    }
}

/// 映射表构建错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegisterMapError {
    #[error("invalid register map: {0}")]
    Invalid(String),
    #[error("register map parse error: {0}")]
    Parse(String),
}
