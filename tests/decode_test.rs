use serre::error::SerreError;
use serre::modbus::{decode_32bit_float, encode_32bit_float};

#[test]
fn decode_matches_big_endian_byte_layout() {
    let cases: [([u16; 2], f32); 5] = [
        ([0x4248, 0x0000], 50.0),
        ([0x4248, 0x8000], 50.125),
        ([0x41BC, 0x0000], 23.5),
        ([0xC14C, 0x0000], -12.75),
        ([0x4020, 0x0000], 2.5),
    ];
    for (words, expected) in cases {
        assert_eq!(decode_32bit_float(&words).unwrap(), expected, "{:04X?}", words);
    }
}

#[test]
fn decode_agrees_with_ieee754_reinterpretation() {
    for (w0, w1) in [(0x0001u16, 0xFFFEu16), (0x7F7F, 0xFFFF), (0x8000, 0x0000), (0x3EAA, 0xAAAB)] {
        let bytes = [(w0 >> 8) as u8, (w0 & 0xFF) as u8, (w1 >> 8) as u8, (w1 & 0xFF) as u8];
        let expected = f32::from_be_bytes(bytes);
        assert_eq!(
            decode_32bit_float(&[w0, w1]).unwrap().to_bits(),
            expected.to_bits()
        );
    }
}

#[test]
fn non_finite_values_pass_through() {
    assert!(decode_32bit_float(&[0x7FC0, 0x0000]).unwrap().is_nan());
    assert_eq!(decode_32bit_float(&[0x7F80, 0x0000]).unwrap(), f32::INFINITY);
    assert_eq!(decode_32bit_float(&[0xFF80, 0x0000]).unwrap(), f32::NEG_INFINITY);
}

#[test]
fn extra_words_are_ignored() {
    assert_eq!(decode_32bit_float(&[0x4248, 0x0000, 0xDEAD]).unwrap(), 50.0);
}

#[test]
fn single_word_is_a_decode_error() {
    let err = decode_32bit_float(&[0x4248]).unwrap_err();
    assert!(matches!(err, SerreError::Decode { .. }));
    assert!(err.to_string().contains("got 1"));
}

#[test]
fn encode_produces_device_word_order() {
    assert_eq!(encode_32bit_float(23.5), [0x41BC, 0x0000]);
    let words = encode_32bit_float(-0.001);
    assert_eq!(decode_32bit_float(&words).unwrap(), -0.001);
}
