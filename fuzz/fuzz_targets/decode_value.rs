#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic, and any accepted value must survive a
    // re-encode/decode cycle unchanged.
    if let Ok(value) = bencodex::decode(data) {
        let bytes = bencodex::encode(&value).unwrap();
        let again = bencodex::decode(&bytes).unwrap();
        assert_eq!(value, again);
    }
});
