#![no_main]
use ipdb::validation::{validate_reader, ValidationLevel};
use ipdb::Address;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Loading, looking up and validating garbage must never panic
    if let Ok(reader) = ipdb::Reader::from_bytes(data.to_vec()) {
        for lang in reader.languages() {
            let _ = reader.find(Address::V4([1, 2, 3, 4]), lang);
            let _ = reader.find(Address::V6([0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]), lang);
        }
        let _ = validate_reader(&reader, ValidationLevel::Strict);
    }
});
