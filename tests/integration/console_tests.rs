//! Integration tests for the serial console.
//!
//! Bytes are fed the way the main loop feeds them: prompt first, then one
//! received byte, with all output captured in a `String`.

use pumpboard::app::console::{Console, LINE_CAP};
use pumpboard::config::VERSION_ID;

use super::mock_hw::{TestBoard, TickingDelay, make_board, pump_is_on};

fn session(board: &TestBoard, console: &mut Console, input: &str) -> String {
    let mut out = String::new();
    let mut delay = TickingDelay::new(board);
    for byte in input.bytes() {
        console.prompt(&mut out).unwrap();
        console
            .handle_byte(byte, board, &mut out, &mut delay)
            .unwrap();
    }
    out
}

fn quiet(board: &TestBoard, input: &str) -> String {
    session(board, &mut Console::new(false), input)
}

#[test]
fn builds_and_lists_a_recipe() {
    let board = make_board();
    let out = quiet(&board, "p1\nd500\ns\np2\nd300\nw20\ns\nl\n");
    assert_eq!(
        out,
        "?> ?> ?> ?> ?> ?> ?> ?> Stored 2 ingredients\n\
         Pump 1 running for 500ms after 0ms\n\
         Pump 2 running for 300ms after 20ms\n"
    );
}

#[test]
fn go_dispenses_and_clears_the_recipe() {
    let board = make_board();
    let out = quiet(&board, "p4\nd250\ns\ng\nl\n");
    assert!(out.ends_with("Stored 0 ingredients\n"), "{out}");
    assert_eq!(board.now(), 250);
    assert!(board.energized().is_empty());
}

#[test]
fn refusals_are_reported_and_console_keeps_going() {
    let board = make_board();
    let out = quiet(&board, "p21\nd0\ns\ng\nc0\nn3\n");
    assert_eq!(
        out,
        "?> Error: invalid pump id 21!\n\
         ?> Error: only positive integer times are allowed!\n\
         ?> Error: can't store without pump and time!\n\
         ?> Error: no ingredients stored!\n\
         ?> Error: can't stop cleaning while no pumps are running!\n\
         ?> "
    );
    assert!(pump_is_on(&board, 3));
}

#[test]
fn parse_errors_are_reported() {
    let board = make_board();
    assert_eq!(quiet(&board, "x\n"), "?> Error: unknown command!\n");
    assert_eq!(
        quiet(&board, "p1a\n"),
        "?> Error: non-ASCII-digit parameter!\n"
    );
    assert_eq!(
        quiet(&board, "d123456\n"),
        "?> Error: parameter is too long!\n"
    );
    assert_eq!(
        quiet(&board, "d70000\n"),
        "?> Error: parameter is too long!\n"
    );
}

#[test]
fn overlong_line_is_rejected_whole() {
    let board = make_board();
    let line = format!("n{}\n", "1".repeat(LINE_CAP + 4));
    let out = quiet(&board, &line);
    assert!(out.ends_with("Error: command line buffer will overflow!\n"), "{out}");
    assert!(board.energized().is_empty());

    // The next line parses normally.
    assert_eq!(quiet(&board, "n2\n"), "?> ");
    assert!(pump_is_on(&board, 2));
}

#[test]
fn blank_lines_and_carriage_returns_are_ignored() {
    let board = make_board();
    let out = quiet(&board, "\r\n\n \r\n");
    assert_eq!(out, "?> ?> ?> Error: unknown command!\n");
}

#[test]
fn echo_repeats_input() {
    let board = make_board();
    let mut console = Console::new(true);
    let out = session(&board, &mut console, "l\n");
    assert_eq!(out, "?> l\nStored 0 ingredients\n");
}

#[test]
fn help_lists_every_command() {
    let board = make_board();
    let out = quiet(&board, "h\n");
    assert!(out.starts_with("?> Available commands:\n"));
    assert!(out.contains("  h  - Print this help text\n"));
    for cmd in ["v", "r", "pX", "dX", "wX", "s", "g", "l", "cX", "nX", "fX"] {
        assert!(out.contains(&format!("  {cmd}  - ")), "missing {cmd}");
    }
    assert_eq!(quiet(&board, "?\n"), out);
}

#[test]
fn version_names_the_firmware() {
    let board = make_board();
    let out = quiet(&board, "v\n");
    assert_eq!(
        out,
        format!("?> pumpboard firmware {VERSION_ID}\nby PumpBoard Engineering\n")
    );
}

#[test]
fn clean_commands_sweep_the_pumps() {
    let board = make_board();
    assert_eq!(quiet(&board, "c1\n"), "?> ");
    assert!(board.is_cleaning());
    assert_eq!(board.energized().count(), 20);

    assert_eq!(quiet(&board, "n1\n"), "?> Error: can't do that while cleaning!\n");
    assert_eq!(quiet(&board, "c0\n"), "?> ");
    assert!(board.energized().is_empty());
}
