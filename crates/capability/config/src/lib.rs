//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub modbus_host: String,
    pub modbus_port: u16,
    pub modbus_unit_id: u8,
    pub modbus_timeout_ms: u64,
    pub modbus_retry_count: u32,
    pub modbus_retry_delay_ms: u64,
    /// 寄存器映射表 JSON 文件路径；未设置时使用内置映射。
    pub register_map_path: Option<String>,
    /// 待写入的标签值（JSON 对象 name -> value）。
    pub writes: Option<String>,
    pub connect_on_start: bool,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let modbus_host =
            env::var("TAGBRIDGE_MODBUS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let modbus_port = read_u16_with_default("TAGBRIDGE_MODBUS_PORT", 502)?;
        let modbus_unit_id = read_u8_with_default("TAGBRIDGE_MODBUS_UNIT_ID", 1)?;
        let modbus_timeout_ms = read_u64_with_default("TAGBRIDGE_MODBUS_TIMEOUT_MS", 3000)?;
        let modbus_retry_count = read_u32_with_default("TAGBRIDGE_MODBUS_RETRY_COUNT", 3)?;
        let modbus_retry_delay_ms =
            read_u64_with_default("TAGBRIDGE_MODBUS_RETRY_DELAY_MS", 1000)?;
        let register_map_path = read_optional("TAGBRIDGE_REGISTER_MAP");
        let writes = read_optional("TAGBRIDGE_WRITES");
        let connect_on_start = read_bool_with_default("TAGBRIDGE_CONNECT_ON_START", true);

        if modbus_host.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "TAGBRIDGE_MODBUS_HOST".to_string(),
                modbus_host,
            ));
        }

        Ok(Self {
            modbus_host,
            modbus_port,
            modbus_unit_id,
            modbus_timeout_ms,
            modbus_retry_count,
            modbus_retry_delay_ms,
            register_map_path,
            writes,
            connect_on_start,
        })
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u8_with_default(key: &str, default: u8) -> Result<u8, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u8>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u32_with_default(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
