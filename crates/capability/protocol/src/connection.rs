//! Modbus 会话管理
//!
//! 持有到从站的唯一 TCP 会话，按有界次数执行“重连 + 重试”。
//!
//! ## 重试规则
//!
//! ```text
//! for attempt in 1..=retry_count + 1:
//!     未连接 -> 重连（失败计为一次失败尝试）
//!     发出请求
//!       成功           -> 返回
//!       协议类错误     -> 立即失败，不再重试
//!       连接类故障     -> 若还有下一次尝试则 sleep(retry_delay)，强制关闭旧连接
//! 全部失败 -> RetriesExhausted
//! ```

use crate::error::ModbusError;
use crate::modbus_tcp::TcpConnector;
use crate::types::{ConnectionConfig, ModbusRequest, ModbusResponse};
use std::sync::Arc;
use std::time::Duration;
use tagbridge_telemetry::{
    record_connect_attempt, record_connect_failure, record_exception_response, record_request,
    record_retries_exhausted, record_retry,
};
use tracing::{debug, error, info, warn};

/// 已建立的传输通道，一次只处理一个请求。
pub trait ModbusTransport: Send {
    fn call(&mut self, request: &ModbusRequest) -> Result<ModbusResponse, ModbusError>;
}

/// 传输通道工厂。
pub trait Connector: Send + Sync {
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn ModbusTransport>, ModbusError>;
}

/// 重试间隔的阻塞等待。
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// 基于线程阻塞的等待（不可中途取消）。
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Modbus TCP 会话
///
/// 会话状态只由 [`connect`](Self::connect) / [`disconnect`](Self::disconnect) 改变；
/// 所有 I/O 操作都需要 `&mut self`。
pub struct ConnectionManager {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    sleeper: Arc<dyn Sleeper>,
    transport: Option<Box<dyn ModbusTransport>>,
}

impl ConnectionManager {
    /// 使用 tokio-modbus TCP 传输创建会话（不立即建连）
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_parts(config, Arc::new(TcpConnector), Arc::new(ThreadSleeper))
    }

    /// 使用自定义传输工厂与等待策略创建会话
    pub fn with_parts(
        config: ConnectionConfig,
        connector: Arc<dyn Connector>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            config,
            connector,
            sleeper,
            transport: None,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// 建立连接；已连接时为空操作
    pub fn connect(&mut self) -> Result<(), ModbusError> {
        if self.transport.is_some() {
            return Ok(());
        }

        info!(
            target: "tagbridge.protocol",
            endpoint = %self.config.endpoint(),
            unit_id = self.config.unit_id,
            "connecting to modbus slave"
        );
        record_connect_attempt();

        match self.connector.connect(&self.config) {
            Ok(transport) => {
                self.transport = Some(transport);
                info!(
                    target: "tagbridge.protocol",
                    endpoint = %self.config.endpoint(),
                    "modbus connection established"
                );
                Ok(())
            }
            Err(err) => {
                record_connect_failure();
                error!(
                    target: "tagbridge.protocol",
                    endpoint = %self.config.endpoint(),
                    error = %err,
                    "failed to connect to modbus slave"
                );
                Err(err)
            }
        }
    }

    /// 关闭连接；未连接时为空操作
    pub fn disconnect(&mut self) {
        if self.transport.take().is_some() {
            info!(
                target: "tagbridge.protocol",
                endpoint = %self.config.endpoint(),
                "modbus connection closed"
            );
        }
    }

    /// 执行一次逻辑操作，连接类故障最多尝试 `retry_count + 1` 次
    pub fn execute_with_retry(
        &mut self,
        request: &ModbusRequest,
    ) -> Result<ModbusResponse, ModbusError> {
        request.validate()?;

        let attempts = self.config.max_attempts();
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.attempt(request) {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() => {
                    warn!(
                        target: "tagbridge.protocol",
                        attempt,
                        attempts,
                        request = %request,
                        error = %err,
                        "modbus attempt failed"
                    );
                    if attempt < attempts {
                        record_retry();
                        self.sleeper.sleep(self.config.retry_delay());
                    }
                    self.disconnect();
                    last_error = Some(err);
                }
                Err(err) => {
                    if matches!(err, ModbusError::Exception { .. }) {
                        record_exception_response();
                    }
                    // 帧已错位的连接不能复用；异常响应不影响连接
                    if matches!(err, ModbusError::Protocol(_)) {
                        self.disconnect();
                    }
                    warn!(
                        target: "tagbridge.protocol",
                        attempt,
                        request = %request,
                        error = %err,
                        "modbus request rejected"
                    );
                    return Err(err);
                }
            }
        }

        record_retries_exhausted();
        error!(
            target: "tagbridge.protocol",
            attempts,
            request = %request,
            "modbus retries exhausted"
        );
        let last = last_error
            .unwrap_or_else(|| ModbusError::Connection("no attempt was made".to_string()));
        Err(ModbusError::RetriesExhausted {
            attempts,
            last: Box::new(last),
        })
    }

    fn attempt(&mut self, request: &ModbusRequest) -> Result<ModbusResponse, ModbusError> {
        if self.transport.is_none() {
            warn!(
                target: "tagbridge.protocol",
                endpoint = %self.config.endpoint(),
                "modbus client not connected, reconnecting"
            );
            self.connect()?;
        }
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| ModbusError::Connection("socket is closed".to_string()))?;

        record_request();
        debug!(target: "tagbridge.protocol", request = %request, "modbus request");
        transport.call(request)
    }

    /// 读线圈 (FC01)
    pub fn read_coils(&mut self, address: u16, count: u16) -> Result<Vec<bool>, ModbusError> {
        let response = self.execute_with_retry(&ModbusRequest::ReadCoils { address, count })?;
        expect_bits(response, count)
    }

    /// 读离散输入 (FC02)
    pub fn read_discrete_inputs(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Vec<bool>, ModbusError> {
        let response =
            self.execute_with_retry(&ModbusRequest::ReadDiscreteInputs { address, count })?;
        expect_bits(response, count)
    }

    /// 读保持寄存器 (FC03)
    pub fn read_holding_registers(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ModbusError> {
        let response =
            self.execute_with_retry(&ModbusRequest::ReadHoldingRegisters { address, count })?;
        expect_words(response, count)
    }

    /// 读输入寄存器 (FC04)
    pub fn read_input_registers(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ModbusError> {
        let response =
            self.execute_with_retry(&ModbusRequest::ReadInputRegisters { address, count })?;
        expect_words(response, count)
    }

    /// 写单个线圈 (FC05)
    pub fn write_coil(&mut self, address: u16, value: bool) -> Result<(), ModbusError> {
        let response =
            self.execute_with_retry(&ModbusRequest::WriteSingleCoil { address, value })?;
        expect_written(response)
    }

    /// 写单个保持寄存器 (FC06)
    pub fn write_register(&mut self, address: u16, value: u16) -> Result<(), ModbusError> {
        let response =
            self.execute_with_retry(&ModbusRequest::WriteSingleRegister { address, value })?;
        expect_written(response)
    }

    /// 写多个保持寄存器 (FC16)
    pub fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<(), ModbusError> {
        let response = self.execute_with_retry(&ModbusRequest::WriteMultipleRegisters {
            address,
            values: values.to_vec(),
        })?;
        expect_written(response)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn expect_bits(response: ModbusResponse, count: u16) -> Result<Vec<bool>, ModbusError> {
    match response {
        ModbusResponse::Bits(bits) if bits.len() == usize::from(count) => Ok(bits),
        ModbusResponse::Bits(bits) => Err(ModbusError::Protocol(format!(
            "expected {} bits, got {}",
            count,
            bits.len()
        ))),
        other => Err(ModbusError::Protocol(format!(
            "expected bits, got {:?}",
            other
        ))),
    }
}

fn expect_words(response: ModbusResponse, count: u16) -> Result<Vec<u16>, ModbusError> {
    match response {
        ModbusResponse::Words(words) if words.len() == usize::from(count) => Ok(words),
        ModbusResponse::Words(words) => Err(ModbusError::Protocol(format!(
            "expected {} registers, got {}",
            count,
            words.len()
        ))),
        other => Err(ModbusError::Protocol(format!(
            "expected registers, got {:?}",
            other
        ))),
    }
}

fn expect_written(response: ModbusResponse) -> Result<(), ModbusError> {
    match response {
        ModbusResponse::Written => Ok(()),
        other => Err(ModbusError::Protocol(format!(
            "expected write confirmation, got {:?}",
            other
        ))),
    }
}
