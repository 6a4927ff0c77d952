//! 协议相关类型定义

use crate::error::ModbusError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Modbus TCP 标准端口
pub const DEFAULT_MODBUS_PORT: u16 = 502;

/// FC01/FC02 单次最多读取的位数
pub const MAX_READ_BITS: u16 = 2000;

/// FC03/FC04 单次最多读取的寄存器数
pub const MAX_READ_REGISTERS: u16 = 125;

/// FC16 单次最多写入的寄存器数
pub const MAX_WRITE_REGISTERS: u16 = 123;

/// Modbus TCP 会话配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// 从站主机地址（IP 或主机名）
    pub host: String,
    /// 从站端口（默认 502）
    #[serde(default = "default_modbus_port")]
    pub port: u16,
    /// 从站单元 ID
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,
    /// 单次建连 / 请求超时（毫秒）
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    /// 连接类故障后的重试次数（总尝试次数 = retry_count + 1）
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// 重试间隔（毫秒）
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_modbus_port() -> u16 {
    DEFAULT_MODBUS_PORT
}

fn default_unit_id() -> u8 {
    1
}

fn default_timeout() -> u64 {
    3000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1000
}

impl ConnectionConfig {
    /// 使用默认超时与重试参数构造配置
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            unit_id: default_unit_id(),
            timeout_ms: default_timeout(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay(),
        }
    }

    /// 从 JSON 配置字符串解析
    pub fn from_json(json: &str) -> Result<Self, ModbusError> {
        serde_json::from_str(json).map_err(|e| ModbusError::ConfigParse(e.to_string()))
    }

    pub fn with_unit_id(mut self, unit_id: u8) -> Self {
        self.unit_id = unit_id;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry_count: u32, retry_delay_ms: u64) -> Self {
        self.retry_count = retry_count;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// 单个逻辑操作的最大尝试次数
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// `host:port` 形式的地址，用于日志
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 一次 Modbus 操作的描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModbusRequest {
    /// 读线圈 (0x01)
    ReadCoils { address: u16, count: u16 },
    /// 读离散输入 (0x02)
    ReadDiscreteInputs { address: u16, count: u16 },
    /// 读保持寄存器 (0x03)
    ReadHoldingRegisters { address: u16, count: u16 },
    /// 读输入寄存器 (0x04)
    ReadInputRegisters { address: u16, count: u16 },
    /// 写单个线圈 (0x05)
    WriteSingleCoil { address: u16, value: bool },
    /// 写单个寄存器 (0x06)
    WriteSingleRegister { address: u16, value: u16 },
    /// 写多个寄存器 (0x10)
    WriteMultipleRegisters { address: u16, values: Vec<u16> },
}

impl ModbusRequest {
    pub fn function_code(&self) -> u8 {
        match self {
            Self::ReadCoils { .. } => 0x01,
            Self::ReadDiscreteInputs { .. } => 0x02,
            Self::ReadHoldingRegisters { .. } => 0x03,
            Self::ReadInputRegisters { .. } => 0x04,
            Self::WriteSingleCoil { .. } => 0x05,
            Self::WriteSingleRegister { .. } => 0x06,
            Self::WriteMultipleRegisters { .. } => 0x10,
        }
    }

    pub fn address(&self) -> u16 {
        match self {
            Self::ReadCoils { address, .. }
            | Self::ReadDiscreteInputs { address, .. }
            | Self::ReadHoldingRegisters { address, .. }
            | Self::ReadInputRegisters { address, .. }
            | Self::WriteSingleCoil { address, .. }
            | Self::WriteSingleRegister { address, .. }
            | Self::WriteMultipleRegisters { address, .. } => *address,
        }
    }

    /// 涉及的位 / 寄存器数量
    pub fn quantity(&self) -> usize {
        match self {
            Self::ReadCoils { count, .. }
            | Self::ReadDiscreteInputs { count, .. }
            | Self::ReadHoldingRegisters { count, .. }
            | Self::ReadInputRegisters { count, .. } => usize::from(*count),
            Self::WriteSingleCoil { .. } | Self::WriteSingleRegister { .. } => 1,
            Self::WriteMultipleRegisters { values, .. } => values.len(),
        }
    }

    /// 发出前校验数量上限与地址范围
    pub fn validate(&self) -> Result<(), ModbusError> {
        let limit = match self {
            Self::ReadCoils { .. } | Self::ReadDiscreteInputs { .. } => MAX_READ_BITS,
            Self::ReadHoldingRegisters { .. } | Self::ReadInputRegisters { .. } => {
                MAX_READ_REGISTERS
            }
            Self::WriteMultipleRegisters { .. } => MAX_WRITE_REGISTERS,
            Self::WriteSingleCoil { .. } | Self::WriteSingleRegister { .. } => return Ok(()),
        };
        let quantity = self.quantity();
        if quantity == 0 || quantity > usize::from(limit) {
            return Err(ModbusError::InvalidRequest(format!(
                "function 0x{:02X}: quantity {} out of range 1..={}",
                self.function_code(),
                quantity,
                limit
            )));
        }
        if usize::from(self.address()) + quantity > 0x1_0000 {
            return Err(ModbusError::InvalidRequest(format!(
                "function 0x{:02X}: address {} + {} exceeds address space",
                self.function_code(),
                self.address(),
                quantity
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ModbusRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fc=0x{:02X} address={} quantity={}",
            self.function_code(),
            self.address(),
            self.quantity()
        )
    }
}

/// 一次成功操作的原始结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModbusResponse {
    /// 线圈 / 离散输入
    Bits(Vec<bool>),
    /// 保持 / 输入寄存器
    Words(Vec<u16>),
    /// 写操作已确认
    Written,
}
