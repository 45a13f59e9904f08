#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed TOML is a Config error, never a panic.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = rankset::Config::parse_str(s) {
            let _ = config.validate();
        }
    }
});
