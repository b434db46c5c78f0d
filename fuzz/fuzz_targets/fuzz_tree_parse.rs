#![no_main]

use libfuzzer_sys::fuzz_target;
use pvcs_storage::Tree;

fuzz_target!(|data: &[u8]| {
    if let Ok(tree) = Tree::decode(data) {
        let reparsed = Tree::decode(&tree.encode()).expect("re-encoded tree decodes");
        assert_eq!(reparsed, tree);
        // Hex ids are the only non-canonical part a decodable payload can carry.
        if data.is_ascii() && !data.iter().any(u8::is_ascii_uppercase) {
            assert_eq!(tree.encode(), data);
        }
    }
});
