//! 标签读写处理器

use crate::coerce::coerce_value;
use crate::error::TagError;
use crate::register_map::{RegisterMap, RegisterMapEntry};
use domain::{RegisterKind, TagValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tagbridge_convert::{decode_bits, decode_registers, encode_value};
use tagbridge_protocol::ConnectionManager;
use tagbridge_telemetry::{record_tag_read, record_tag_write};
use tracing::{debug, info, warn};

/// 按标签名读写从站数据
///
/// 每次调用都是独立的一次性流程：查表 -> 原始 I/O -> 转换，失败即终止。
pub struct TagHandler {
    registers: Arc<RegisterMap>,
    connection: ConnectionManager,
}

impl TagHandler {
    pub fn new(registers: Arc<RegisterMap>, connection: ConnectionManager) -> Self {
        Self {
            registers,
            connection,
        }
    }

    pub fn register_map(&self) -> &RegisterMap {
        &self.registers
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// 用于显式 connect / disconnect
    pub fn connection_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connection
    }

    /// 读取单个标签
    pub fn read_tag(&mut self, name: &str) -> Result<TagValue, TagError> {
        let registers = Arc::clone(&self.registers);
        let result = match registers.get(name) {
            Some(entry) => self.read_entry(entry),
            None => Err(TagError::UnknownTag(name.to_string())),
        };

        record_tag_read(result.is_ok());
        match &result {
            Ok(value) => debug!(target: "tagbridge.tags", tag = name, value = %value, "tag read"),
            Err(err) => warn!(target: "tagbridge.tags", tag = name, error = %err, "tag read failed"),
        }
        result
    }

    /// 按映射表顺序读取全部标签，单个失败不影响其它标签
    pub fn read_all_tags(&mut self) -> BTreeMap<String, Result<TagValue, TagError>> {
        let registers = Arc::clone(&self.registers);
        registers
            .iter()
            .map(|entry| (entry.name.clone(), self.read_tag(&entry.name)))
            .collect()
    }

    /// 写入单个标签
    pub fn write_tag(&mut self, name: &str, value: &Value) -> Result<(), TagError> {
        let registers = Arc::clone(&self.registers);
        let result = match registers.get(name) {
            Some(entry) => self.write_entry(entry, value),
            None => Err(TagError::UnknownTag(name.to_string())),
        };

        record_tag_write(result.is_ok());
        match &result {
            Ok(()) => info!(target: "tagbridge.tags", tag = name, value = %value, "tag written"),
            Err(err) => warn!(target: "tagbridge.tags", tag = name, error = %err, "tag write failed"),
        }
        result
    }

    /// 逐个写入，无跨标签原子性
    pub fn write_multiple_tags(
        &mut self,
        values: &BTreeMap<String, Value>,
    ) -> BTreeMap<String, Result<(), TagError>> {
        values
            .iter()
            .map(|(name, value)| (name.clone(), self.write_tag(name, value)))
            .collect()
    }

    fn read_entry(&mut self, entry: &RegisterMapEntry) -> Result<TagValue, TagError> {
        let (address, count) = (entry.address, entry.word_count);
        let decoded = match entry.register_kind {
            RegisterKind::Coil => {
                let bits = self.connection.read_coils(address, count)?;
                decode_bits(entry.value_kind, &bits)
            }
            RegisterKind::DiscreteInput => {
                let bits = self.connection.read_discrete_inputs(address, count)?;
                decode_bits(entry.value_kind, &bits)
            }
            RegisterKind::Holding => {
                let words = self.connection.read_holding_registers(address, count)?;
                decode_registers(entry.value_kind, &words)
            }
            RegisterKind::Input => {
                let words = self.connection.read_input_registers(address, count)?;
                decode_registers(entry.value_kind, &words)
            }
        };

        let value = decoded.ok_or_else(|| {
            TagError::Conversion(format!(
                "tag {}: cannot decode {} from {} {}",
                entry.name, entry.value_kind, entry.register_kind, address
            ))
        })?;
        Ok(match value {
            TagValue::Float32(raw) => TagValue::Float32((f64::from(raw) * entry.scale) as f32),
            other => other,
        })
    }

    fn write_entry(&mut self, entry: &RegisterMapEntry, value: &Value) -> Result<(), TagError> {
        if !entry.register_kind.is_writable() {
            return Err(TagError::ReadOnly(format!(
                "{} ({} {})",
                entry.name, entry.register_kind, entry.address
            )));
        }

        let native = coerce_value(entry, value)?;
        match (entry.register_kind, native) {
            (RegisterKind::Coil, TagValue::Bool(flag)) => {
                self.connection.write_coil(entry.address, flag)?
            }
            (RegisterKind::Holding, native) => match encode_value(native).as_slice() {
                [word] => self.connection.write_register(entry.address, *word)?,
                words => self.connection.write_registers(entry.address, words)?,
            },
            (kind, native) => {
                return Err(TagError::Conversion(format!(
                    "tag {}: cannot write {} to {}",
                    entry.name,
                    native.kind(),
                    kind
                )));
            }
        }
        Ok(())
    }
}
