//! Fuzz target for stored object decoding.
//!
//! Feeds arbitrary bytes to the zlib + header decoder. Anything that
//! decodes must hash to the id it reports.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pvcs_storage::{ObjectId, ObjectStore};

fuzz_target!(|data: &[u8]| {
    if let Ok(object) = ObjectStore::decompress(data) {
        assert_eq!(object.size(), object.data.len());
        assert_eq!(object.id, ObjectId::hash_object(object.object_type, &object.data));
    }
});
