//! 写入值到标签类型的宽松转换

use crate::error::TagError;
use crate::register_map::RegisterMapEntry;
use domain::{TagValue, ValueKind};
use serde_json::Value;
use tagbridge_convert::{int16_to_register, uint16_to_register};

const TRUE_WORDS: [&str; 6] = ["true", "t", "1", "yes", "y", "on"];
const FALSE_WORDS: [&str; 7] = ["false", "f", "0", "no", "n", "off", ""];

/// 把主机传入的 JSON 值转换为标签的原生类型
///
/// - bool：JSON 布尔、非零数值、常见真假字符串（不区分大小写）
/// - 整数类型：浮点向零截断，布尔为 1 / 0，数字字符串同样解析；超出位宽时回绕
/// - float32：先除以 `scale` 再转为 f32
pub fn coerce_value(entry: &RegisterMapEntry, value: &Value) -> Result<TagValue, TagError> {
    let rejected = || {
        TagError::WriteCoercion(format!(
            "tag {}: {} is not a valid {}",
            entry.name, value, entry.value_kind
        ))
    };

    let coerced = match entry.value_kind {
        ValueKind::Bool => TagValue::Bool(to_bool(value).ok_or_else(rejected)?),
        ValueKind::UInt16 => TagValue::UInt16(uint16_to_register(
            to_integer(value).ok_or_else(rejected)?,
        )),
        ValueKind::Int16 => TagValue::Int16(
            int16_to_register(to_integer(value).ok_or_else(rejected)?) as i16,
        ),
        // 截取低 32 位
        ValueKind::UInt32 => TagValue::UInt32(to_integer(value).ok_or_else(rejected)? as u32),
        ValueKind::Int32 => TagValue::Int32(to_integer(value).ok_or_else(rejected)? as i32),
        ValueKind::Float32 => {
            let raw = (to_float(value).ok_or_else(rejected)? / entry.scale) as f32;
            if !raw.is_finite() {
                return Err(rejected());
            }
            TagValue::Float32(raw)
        }
    };
    Ok(coerced)
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0),
        Value::String(text) => {
            let text = text.trim().to_ascii_lowercase();
            if TRUE_WORDS.contains(&text.as_str()) {
                Some(true)
            } else if FALSE_WORDS.contains(&text.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Number(number) => {
            if let Some(n) = number.as_i64() {
                Some(n)
            } else if let Some(n) = number.as_u64() {
                // 大于 i64::MAX 的值只保留低位，与回绕语义一致
                Some(n as i64)
            } else {
                number.as_f64().and_then(truncate)
            }
        }
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// 向零截断后按 2^64 取模，结果落在 i64 范围内，低位与原值一致
fn truncate(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let mut wrapped = value.trunc() % TWO_POW_64;
    if wrapped >= TWO_POW_63 {
        wrapped -= TWO_POW_64;
    } else if wrapped < -TWO_POW_63 {
        wrapped += TWO_POW_64;
    }
    Some(wrapped as i64)
}
