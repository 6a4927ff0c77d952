//! 一次性标签读写：读取全部标签，按需写入后再读一遍。

mod defaults;

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tagbridge_config::AppConfig;
use tagbridge_protocol::{ConnectionConfig, ConnectionManager};
use tagbridge_tags::{RegisterMap, TagHandler};
use tagbridge_telemetry::{init_tracing, metrics};
use tracing::{error, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let registers = Arc::new(load_register_map(&config)?);
    info!(tags = registers.len(), "register map loaded");

    let connection = ConnectionManager::new(
        ConnectionConfig::new(config.modbus_host.clone(), config.modbus_port)
            .with_unit_id(config.modbus_unit_id)
            .with_timeout_ms(config.modbus_timeout_ms)
            .with_retry(config.modbus_retry_count, config.modbus_retry_delay_ms),
    );
    let mut handler = TagHandler::new(registers, connection);

    if config.connect_on_start {
        handler.connection_mut().connect()?;
    }

    log_tags(&mut handler);

    // 写入值：JSON 对象 name -> value
    if let Some(raw) = &config.writes {
        let writes: BTreeMap<String, Value> = serde_json::from_str(raw)?;
        let results = handler.write_multiple_tags(&writes);
        let failed = results.values().filter(|result| result.is_err()).count();
        info!(total = results.len(), failed, "tag writes applied");
        log_tags(&mut handler);
    }

    info!(metrics = ?metrics().snapshot(), "telemetry snapshot");

    handler.connection_mut().disconnect();
    Ok(())
}

fn load_register_map(config: &AppConfig) -> Result<RegisterMap, Box<dyn std::error::Error>> {
    match &config.register_map_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("read register map {}: {}", path, e))?;
            Ok(RegisterMap::from_json(&text)?)
        }
        None => {
            warn!("TAGBRIDGE_REGISTER_MAP not set, using built-in register map");
            Ok(RegisterMap::new(defaults::builtin_entries())?)
        }
    }
}

fn log_tags(handler: &mut TagHandler) {
    for (name, result) in handler.read_all_tags() {
        match result {
            Ok(value) => info!(tag = %name, value = %value, "tag value"),
            Err(err) => error!(tag = %name, error = %err, "tag unavailable"),
        }
    }
}
