#![no_main]
use libfuzzer_sys::fuzz_target;
use serre::channels::ChannelKind;

fuzz_target!(|data: &[u8]| {
    let words: Vec<u16> = data
        .chunks_exact(2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .collect();

    // Short input must be rejected, never panic
    match serre::modbus::decode_32bit_float(&words) {
        Ok(raw) => {
            assert!(words.len() >= 2);
            let _ = ChannelKind::Temperature.scale(raw);
            let _ = ChannelKind::Humidity.scale(raw);
            if raw.is_finite() {
                let back = serre::modbus::encode_32bit_float(raw);
                assert_eq!(back, [words[0], words[1]]);
            }
        }
        Err(_) => assert!(words.len() < 2),
    }
});
