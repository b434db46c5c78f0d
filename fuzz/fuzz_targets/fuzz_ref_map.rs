//! Fuzz target for the compressed ref map.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pvcs_storage::RefMap;

fuzz_target!(|data: &[u8]| {
    let _ = RefMap::decode(data);
});
