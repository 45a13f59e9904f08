#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any byte sequence decodes to Ok or Err, never a panic. Keep decoding
    // until the buffer runs dry to exercise the resume path.
    let mut buf = BytesMut::from(data);
    while let Ok(Some(_)) | Err(rankset::Error::Server(_)) = rankset::resp::decode_value(&mut buf) {
        if buf.is_empty() {
            break;
        }
    }
});
