#![no_main]
use libfuzzer_sys::fuzz_target;
use sfxml::{parse, verify};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(parsed) = parse(s) {
            let _ = verify(s, &parsed);
        }
    }
});
