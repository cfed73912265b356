#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for dialect in [chunkdoc::Dialect::Forward, chunkdoc::Dialect::Reversed] {
        for frame in chunkdoc::frame::frames(data, dialect) {
            if frame.is_err() {
                break;
            }
        }
    }
});
