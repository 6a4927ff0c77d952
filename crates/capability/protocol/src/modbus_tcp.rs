//! Modbus TCP 传输实现
//!
//! 基于 tokio-modbus 的同步客户端，负责 MBAP 帧编解码与事务 ID 匹配。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let config = ConnectionConfig::new("192.168.1.100", 502);
//! let mut session = ConnectionManager::new(config);
//! let words = session.read_holding_registers(0, 4)?;
//! ```

use crate::connection::{Connector, ModbusTransport};
use crate::error::ModbusError;
use crate::types::{ConnectionConfig, ModbusRequest, ModbusResponse};
use std::net::{SocketAddr, ToSocketAddrs};
use tokio_modbus::Slave;
use tokio_modbus::client::sync::{self, Reader, Writer};
use tracing::debug;

/// 生产环境使用的 TCP 传输工厂
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn ModbusTransport>, ModbusError> {
        let addr = resolve(config)?;
        let ctx = sync::tcp::connect_slave_with_timeout(
            addr,
            Slave(config.unit_id),
            Some(config.timeout()),
        )
        .map_err(|e| ModbusError::Connection(format!("connect {}: {}", addr, e)))?;

        debug!(target: "tagbridge.protocol", peer = %addr, "tcp session opened");
        Ok(Box::new(TcpTransport { ctx }))
    }
}

/// 解析主机名，取第一个可用地址
fn resolve(config: &ConnectionConfig) -> Result<SocketAddr, ModbusError> {
    (config.host.as_str(), config.port)
        .to_socket_addrs()
        .map_err(|e| ModbusError::Connection(format!("resolve {}: {}", config.endpoint(), e)))?
        .next()
        .ok_or_else(|| {
            ModbusError::Connection(format!("no address found for {}", config.endpoint()))
        })
}

/// 已建立的 tokio-modbus 同步会话
struct TcpTransport {
    ctx: sync::Context,
}

impl ModbusTransport for TcpTransport {
    fn call(&mut self, request: &ModbusRequest) -> Result<ModbusResponse, ModbusError> {
        let function = request.function_code();
        let response = match request {
            ModbusRequest::ReadCoils { address, count } => ModbusResponse::Bits(flatten(
                function,
                self.ctx.read_coils(*address, *count),
            )?),
            ModbusRequest::ReadDiscreteInputs { address, count } => ModbusResponse::Bits(
                flatten(function, self.ctx.read_discrete_inputs(*address, *count))?,
            ),
            ModbusRequest::ReadHoldingRegisters { address, count } => ModbusResponse::Words(
                flatten(function, self.ctx.read_holding_registers(*address, *count))?,
            ),
            ModbusRequest::ReadInputRegisters { address, count } => ModbusResponse::Words(
                flatten(function, self.ctx.read_input_registers(*address, *count))?,
            ),
            ModbusRequest::WriteSingleCoil { address, value } => {
                flatten(function, self.ctx.write_single_coil(*address, *value))?;
                ModbusResponse::Written
            }
            ModbusRequest::WriteSingleRegister { address, value } => {
                flatten(function, self.ctx.write_single_register(*address, *value))?;
                ModbusResponse::Written
            }
            ModbusRequest::WriteMultipleRegisters { address, values } => {
                flatten(function, self.ctx.write_multiple_registers(*address, values))?;
                ModbusResponse::Written
            }
        };
        Ok(response)
    }
}

/// 把 tokio-modbus 的双层结果映射为显式错误分类
///
/// - 传输层 I/O 错误（含超时）-> Connection（可重试）
/// - 帧不匹配等协议错误 -> Protocol
/// - 从站异常码 -> Exception
fn flatten<T>(function: u8, result: tokio_modbus::Result<T>) -> Result<T, ModbusError> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(code)) => Err(ModbusError::Exception {
            function,
            detail: code.to_string(),
        }),
        Err(tokio_modbus::Error::Transport(err)) => Err(ModbusError::Connection(err.to_string())),
        Err(err) => Err(ModbusError::Protocol(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_localhost() {
        let config = ConnectionConfig::new("localhost", 5020);
        let addr = resolve(&config).unwrap();
        assert_eq!(addr.port(), 5020);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_flatten_maps_transport_error_to_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let result: tokio_modbus::Result<()> = Err(tokio_modbus::Error::Transport(io));
        let err = flatten(0x03, result).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_flatten_maps_exception() {
        let result: tokio_modbus::Result<()> =
            Ok(Err(tokio_modbus::ExceptionCode::IllegalDataAddress));
        let err = flatten(0x03, result).unwrap_err();
        assert!(matches!(err, ModbusError::Exception { function: 0x03, .. }));
        assert!(!err.is_retryable());
    }
}
