//! Fuzz target: `parse_line` and `Console::feed`
//!
//! Drives arbitrary bytes into the console line assembler and the parser
//! and asserts that neither panics and that a parsed parameter always
//! fits the five-digit limit.
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use pumpboard::app::commands::{Command, parse_line};
use pumpboard::app::console::Console;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = core::str::from_utf8(data) {
        if let Ok(Some(Command::SetDuration(ms))) = parse_line(line) {
            assert!(ms.to_string().len() <= 5);
        }
    }

    let mut console = Console::new(true);
    let mut out = String::new();
    for &byte in data {
        let _ = console.feed(byte, &mut out);
    }
    // A trailing newline always completes the pending line.
    assert!(console.feed(b'\n', &mut out).is_some());
});
