#![no_main]

use libfuzzer_sys::fuzz_target;
use pvcs_storage::Commit;

fuzz_target!(|data: &[u8]| {
    if let Ok(commit) = Commit::decode(data) {
        let reparsed = Commit::decode(&commit.encode()).expect("re-encoded commit decodes");
        assert_eq!(reparsed, commit);
    }
});
