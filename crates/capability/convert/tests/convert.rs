use domain::{TagValue, ValueKind};
use tagbridge_convert::*;

#[test]
fn int16_boundaries() {
    assert_eq!(registers_to_int16(&[0x8000]), Some(-32768));
    assert_eq!(registers_to_int16(&[0x7FFF]), Some(32767));
    assert_eq!(registers_to_int16(&[0xFFFF]), Some(-1));
}

#[test]
fn int16_encode_adds_modulus_for_negative() {
    assert_eq!(int16_to_register(-1), 0xFFFF);
    assert_eq!(int16_to_register(-32768), 0x8000);
    assert_eq!(int16_to_register(123), 123);
}

#[test]
fn uint16_encode_wraps() {
    assert_eq!(uint16_to_register(65_536), 0);
    assert_eq!(uint16_to_register(65_537), 1);
    assert_eq!(uint16_to_register(-1), 0xFFFF);
}

#[test]
fn short_input_is_no_result_not_zero() {
    assert_eq!(registers_to_uint16(&[]), None);
    assert_eq!(registers_to_uint16(&[0]), Some(0));
    assert_eq!(registers_to_int16(&[]), None);
    assert_eq!(registers_to_uint32(&[0x0001]), None);
    assert_eq!(registers_to_int32(&[]), None);
    assert_eq!(registers_to_float32(&[0x3FC0]), None);
    assert_eq!(decode_registers(ValueKind::Float32, &[0]), None);
    assert_eq!(decode_bits(ValueKind::Bool, &[]), None);
}

#[test]
fn uint32_word_order_is_high_then_low() {
    for value in [0u32, 1, 0xFFFF, 0x1_0000, 0xDEAD_BEEF, u32::MAX] {
        let registers = uint32_to_registers(i64::from(value));
        assert_eq!(registers[0], (value >> 16) as u16);
        assert_eq!(registers[1], (value & 0xFFFF) as u16);
        assert_eq!(registers_to_uint32(&registers), Some(value));
    }
}

#[test]
fn int32_two_complement() {
    assert_eq!(int32_to_registers(-2), [0xFFFF, 0xFFFE]);
    assert_eq!(registers_to_int32(&[0xFFFF, 0xFFFE]), Some(-2));
    assert_eq!(registers_to_int32(&[0x8000, 0x0000]), Some(i32::MIN));
    assert_eq!(registers_to_int32(&[0x7FFF, 0xFFFF]), Some(i32::MAX));
}

#[test]
fn float32_is_bit_exact() {
    assert_eq!(float32_to_registers(1.5), [0x3FC0, 0x0000]);
    assert_eq!(registers_to_float32(&float32_to_registers(1.5)), Some(1.5));
    assert_eq!(registers_to_float32(&[0x4248, 0x0000]), Some(50.0));

    let value = 0.1f32;
    let decoded = registers_to_float32(&float32_to_registers(value)).expect("decoded");
    assert_eq!(decoded.to_bits(), value.to_bits());
}

#[test]
fn bits_encoding_limits() {
    assert_eq!(bits_to_register(&[true; 16]), Some(0xFFFF));
    assert_eq!(bits_to_register(&[]), Some(0));
    assert_eq!(bits_to_register(&[true; 17]), None);
    assert_eq!(bits_to_register(&[false, true]), Some(0b10));
    assert_eq!(register_to_bits(0xFFFF), [true; 16]);
}

#[test]
fn decode_then_encode_is_identity_for_16_bit_kinds() {
    for word in [0u16, 1, 0x7FFF, 0x8000, 0xFFFF] {
        let value = decode_registers(ValueKind::UInt16, &[word]).expect("uint16");
        assert_eq!(encode_value(value), vec![word]);
        let value = decode_registers(ValueKind::Int16, &[word]).expect("int16");
        assert_eq!(encode_value(value), vec![word]);
    }
    for flag in [true, false] {
        let words = encode_value(TagValue::Bool(flag));
        assert_eq!(decode_registers(ValueKind::Bool, &words), Some(TagValue::Bool(flag)));
    }
}

#[test]
fn extra_registers_are_ignored() {
    assert_eq!(registers_to_uint16(&[7, 9]), Some(7));
    assert_eq!(registers_to_uint32(&[0, 1, 2]), Some(1));
}

#[test]
fn bits_only_decode_as_bool() {
    assert_eq!(decode_bits(ValueKind::Bool, &[true, false]), Some(TagValue::Bool(true)));
    assert_eq!(decode_bits(ValueKind::UInt16, &[true]), None);
}
