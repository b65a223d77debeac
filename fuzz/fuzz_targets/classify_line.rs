#![no_main]

use gitlab_strace_analyzer::classifier::classify;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Trace files are decoded lossily, so every byte sequence is a valid line
    let line = String::from_utf8_lossy(data);
    let classification = classify(&line);
    if classification.skipped {
        assert!(classification.findings.is_empty());
    }
});
