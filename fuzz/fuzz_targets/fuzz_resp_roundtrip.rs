#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use rankset::resp::{decode_value, encode_value};

fuzz_target!(|data: &[u8]| {
    // A decoded reply re-encodes to bytes that decode to the same reply.
    let mut buf = BytesMut::from(data);
    if let Ok(Some(value)) = decode_value(&mut buf) {
        let mut encoded = BytesMut::new();
        encode_value(&value, &mut encoded);

        let reparsed = decode_value(&mut encoded);
        assert!(
            matches!(&reparsed, Ok(Some(v)) if *v == value),
            "roundtrip mismatch: {:?} -> {:?}",
            value,
            reparsed
        );
        assert!(encoded.is_empty());
    }
});
