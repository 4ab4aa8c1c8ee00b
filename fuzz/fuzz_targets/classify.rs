// fuzz/fuzz_targets/classify.rs
//! The classifier and rendering pass must never panic, whatever the engine
//! sends: hostile braces, half-finished JSON, giant comma soup.

#![no_main]

use libfuzzer_sys::fuzz_target;

use haggle_core::{classify, render_timeline, TimelineOptions};
use haggle_types::{ChatRecord, ChatRole};

fuzz_target!(|data: &str| {
    for role in [ChatRole::System, ChatRole::User, ChatRole::Assistant] {
        let record = ChatRecord::new(role, data);
        let _ = classify(&record);
        let _ = render_timeline(
            std::slice::from_ref(&record),
            TimelineOptions {
                include_system_notes: true,
            },
        );
    }
});
