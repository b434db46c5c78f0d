#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pvcs_repo::{line_diff, split_lines, LineChange};

#[derive(Arbitrary, Debug)]
struct Input {
    old: String,
    new: String,
}

fuzz_target!(|input: Input| {
    let changes = line_diff(&input.old, &input.new);
    let removed = changes
        .iter()
        .filter(|c| matches!(c, LineChange::Removed(_)))
        .count();
    assert!(removed <= split_lines(&input.old).len());
    assert!(changes.len() - removed <= split_lines(&input.new).len());
});
