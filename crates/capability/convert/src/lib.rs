//! 寄存器字与类型化值之间的转换。
//!
//! 全部为无状态纯函数：
//! - 解码返回 `Option<T>`，`None` 表示“无结果”（寄存器不足），与解码值为 0 区分
//! - 编码按线上表示回绕（uint16 模 2^16、32 位模 2^32），不视为错误
//! - 32 位类型采用大端字序：`registers[0]` 为高 16 位，`registers[1]` 为低 16 位
//!
//! ```text
//! float32 1.5 -> 0x3FC0_0000 -> [0x3FC0, 0x0000]
//! int32  -2  -> 0xFFFF_FFFE -> [0xFFFF, 0xFFFE]
//! ```

use domain::{TagValue, ValueKind};

/// 单个寄存器的位数。
pub const BITS_PER_REGISTER: usize = 16;

/// 取第一个寄存器作为 uint16。
pub fn registers_to_uint16(registers: &[u16]) -> Option<u16> {
    registers.first().copied()
}

/// 取第一个寄存器按补码解释为 int16。
pub fn registers_to_int16(registers: &[u16]) -> Option<i16> {
    registers.first().map(|word| *word as i16)
}

/// 两个寄存器（高字在前）组合为 uint32。
pub fn registers_to_uint32(registers: &[u16]) -> Option<u32> {
    match registers {
        [high, low, ..] => Some((u32::from(*high) << 16) | u32::from(*low)),
        _ => None,
    }
}

/// 两个寄存器（高字在前）按补码解释为 int32。
pub fn registers_to_int32(registers: &[u16]) -> Option<i32> {
    registers_to_uint32(registers).map(|value| value as i32)
}

/// 两个寄存器按 IEEE-754 大端位模式还原为 float32，不做任何舍入。
pub fn registers_to_float32(registers: &[u16]) -> Option<f32> {
    registers_to_uint32(registers).map(f32::from_bits)
}

/// 寄存器拆为 16 个位，低位在前。
pub fn register_to_bits(register: u16) -> [bool; BITS_PER_REGISTER] {
    let mut bits = [false; BITS_PER_REGISTER];
    for (index, bit) in bits.iter_mut().enumerate() {
        *bit = (register >> index) & 1 == 1;
    }
    bits
}

/// 整数截取低 16 位。
pub fn uint16_to_register(value: i64) -> u16 {
    (value & 0xFFFF) as u16
}

/// 有符号整数编码为补码寄存器（负数先加 2^16 再取低 16 位）。
pub fn int16_to_register(value: i64) -> u16 {
    value.rem_euclid(0x1_0000) as u16
}

/// 整数截取低 32 位后拆为 [高字, 低字]。
pub fn uint32_to_registers(value: i64) -> [u16; 2] {
    split_u32((value & 0xFFFF_FFFF) as u32)
}

/// 有符号整数按 32 位补码拆为 [高字, 低字]。
pub fn int32_to_registers(value: i64) -> [u16; 2] {
    split_u32(value.rem_euclid(0x1_0000_0000) as u32)
}

/// float32 的 IEEE-754 位模式拆为 [高字, 低字]。
pub fn float32_to_registers(value: f32) -> [u16; 2] {
    split_u32(value.to_bits())
}

/// 最多 16 个位合成寄存器，低位在前；超过 16 个返回 `None`。
pub fn bits_to_register(bits: &[bool]) -> Option<u16> {
    if bits.len() > BITS_PER_REGISTER {
        return None;
    }
    let register = bits
        .iter()
        .enumerate()
        .filter(|(_, bit)| **bit)
        .fold(0u16, |acc, (index, _)| acc | (1 << index));
    Some(register)
}

fn split_u32(value: u32) -> [u16; 2] {
    [(value >> 16) as u16, (value & 0xFFFF) as u16]
}

/// 按值类型解码寄存器字。
///
/// 保持寄存器中的布尔值以非零为真。
pub fn decode_registers(kind: ValueKind, registers: &[u16]) -> Option<TagValue> {
    let value = match kind {
        ValueKind::Bool => TagValue::Bool(registers_to_uint16(registers)? != 0),
        ValueKind::UInt16 => TagValue::UInt16(registers_to_uint16(registers)?),
        ValueKind::Int16 => TagValue::Int16(registers_to_int16(registers)?),
        ValueKind::UInt32 => TagValue::UInt32(registers_to_uint32(registers)?),
        ValueKind::Int32 => TagValue::Int32(registers_to_int32(registers)?),
        ValueKind::Float32 => TagValue::Float32(registers_to_float32(registers)?),
    };
    Some(value)
}

/// 按值类型解码位序列（线圈 / 离散输入），只支持布尔类型。
pub fn decode_bits(kind: ValueKind, bits: &[bool]) -> Option<TagValue> {
    match kind {
        ValueKind::Bool => bits.first().map(|bit| TagValue::Bool(*bit)),
        _ => None,
    }
}

/// 把类型化值编码为寄存器字（布尔值写 1 / 0）。
pub fn encode_value(value: TagValue) -> Vec<u16> {
    match value {
        TagValue::Bool(value) => vec![u16::from(value)],
        TagValue::UInt16(value) => vec![value],
        TagValue::Int16(value) => vec![int16_to_register(i64::from(value))],
        TagValue::UInt32(value) => uint32_to_registers(i64::from(value)).to_vec(),
        TagValue::Int32(value) => int32_to_registers(i64::from(value)).to_vec(),
        TagValue::Float32(value) => float32_to_registers(value).to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_u32_word_order() {
        assert_eq!(split_u32(0x1234_5678), [0x1234, 0x5678]);
    }

    #[test]
    fn test_register_to_bits_lsb_first() {
        let bits = register_to_bits(0b0000_0000_0000_0101);
        assert!(bits[0]);
        assert!(!bits[1]);
        assert!(bits[2]);
        assert!(bits[3..].iter().all(|bit| !bit));
    }
}
