//! Serial command console.
//!
//! Assembles received bytes into lines, parses them into [`Command`]s and
//! runs them against the [`PumpBoard`].  All output goes through
//! [`core::fmt::Write`], so the same console drives the UART on target and
//! a `String` in tests.
//!
//! Refused operations are reported as `Error: <reason>!` and never stop
//! the console.

use core::fmt::{self, Write};

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::debug;

use crate::config::{AUTHOR_ID, COMMAND_PREFIX, COMMANDLINE_PROMPT, TARGET_ID, VERSION_ID};

use super::commands::{parse_line, Command, ParseError, MAX_PARAMETER_DIGITS};
use super::ports::{PumpPort, StatusLightPort};
use super::service::PumpBoard;

/// Longest accepted line, terminator excluded.
pub const LINE_CAP: usize = COMMAND_PREFIX.len() + 1 + MAX_PARAMETER_DIGITS + 10;

const HELP: &[(&str, &str)] = &[
    ("h", "Print this help text"),
    ("v", "Print version information"),
    ("r", "Reset recipe list"),
    ("pX", "Set pump X for current recipe ingredient"),
    ("dX", "Set duration to X milliseconds for current recipe ingredient"),
    ("wX", "Wait for X milliseconds before starting this recipe ingredient"),
    ("s", "Store current recipe ingredient and go to next one"),
    ("g", "Go and dispense currently entered recipe"),
    ("l", "List currently entered recipe ingredients"),
    ("cX", "Start or stop cleaning cycle for all pumps (0 or 1)"),
    ("nX", "Turn on pump X"),
    ("fX", "Turn off pump X"),
];

pub struct Console {
    line: Vec<u8, LINE_CAP>,
    overflowed: bool,
    prompt_pending: bool,
    echo: bool,
}

impl Console {
    pub fn new(echo: bool) -> Self {
        Self {
            line: Vec::new(),
            overflowed: false,
            prompt_pending: true,
            echo,
        }
    }

    /// Print the prompt if a new line is about to start.
    pub fn prompt(&mut self, out: &mut impl Write) -> fmt::Result {
        if self.prompt_pending {
            self.prompt_pending = false;
            out.write_str(COMMANDLINE_PROMPT)?;
        }
        Ok(())
    }

    /// Feed one received byte.  Returns the parse result once a `\n`
    /// completes the line; `Ok(None)` for a blank line.
    pub fn feed(
        &mut self,
        byte: u8,
        out: &mut impl Write,
    ) -> Option<Result<Option<Command>, ParseError>> {
        if self.echo {
            // Echo failures are not worth dropping input for.
            let _ = out.write_char(char::from(byte));
        }

        match byte {
            b'\r' => None,
            b'\n' => {
                let parsed = if self.overflowed {
                    Err(ParseError::LineOverflow)
                } else {
                    core::str::from_utf8(&self.line)
                        .map_err(|_| ParseError::UnknownCommand)
                        .and_then(parse_line)
                };
                self.line.clear();
                self.overflowed = false;
                self.prompt_pending = true;
                Some(parsed)
            }
            _ => {
                if self.line.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Feed one byte and, when it completes a command, run it.
    pub fn handle_byte<P: PumpPort, L: StatusLightPort>(
        &mut self,
        byte: u8,
        board: &PumpBoard<P, L>,
        out: &mut impl Write,
        delay: &mut impl DelayNs,
    ) -> fmt::Result {
        match self.feed(byte, out) {
            None => Ok(()),
            Some(Ok(None)) => Ok(()),
            Some(Ok(Some(cmd))) => {
                debug!("console: {cmd:?}");
                execute(cmd, board, out, delay)
            }
            Some(Err(e)) => writeln!(out, "Error: {e}!"),
        }
    }
}

/// Run one command and print its response.
pub fn execute<P: PumpPort, L: StatusLightPort>(
    cmd: Command,
    board: &PumpBoard<P, L>,
    out: &mut impl Write,
    delay: &mut impl DelayNs,
) -> fmt::Result {
    let result = match cmd {
        Command::Help => return print_help(out),
        Command::Version => return print_version(out),
        Command::List => return print_list(board, out),
        Command::Reset => board.reset(),
        Command::SetPump(id) => board.set_pump(id),
        Command::SetDuration(ms) => board.set_duration(ms),
        Command::SetDelay(ms) => board.set_delay(ms),
        Command::Store => board.store().map(|_| ()),
        Command::Go => board.go(delay),
        Command::Clean { start } => board.clean(start, delay),
        Command::PumpOn(id) => board.pump_on(id).map(|_| ()),
        Command::PumpOff(id) => board.pump_off(id).map(|_| ()),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => writeln!(out, "Error: {e}!"),
    }
}

fn print_help(out: &mut impl Write) -> fmt::Result {
    writeln!(out, "Available commands:")?;
    for (cmd, desc) in HELP {
        writeln!(out, "  {COMMAND_PREFIX}{cmd}  - {desc}")?;
    }
    Ok(())
}

fn print_version(out: &mut impl Write) -> fmt::Result {
    writeln!(out, "{TARGET_ID} firmware {VERSION_ID}")?;
    writeln!(out, "by {AUTHOR_ID}")
}

fn print_list<P: PumpPort, L: StatusLightPort>(
    board: &PumpBoard<P, L>,
    out: &mut impl Write,
) -> fmt::Result {
    let recipe = board.list();
    writeln!(out, "Stored {} ingredients", recipe.len())?;
    for i in &recipe {
        writeln!(
            out,
            "Pump {} running for {}ms after {}ms",
            i.pump, i.duration_ms, i.delay_ms
        )?;
    }
    Ok(())
}
