//! Inbound operator commands.
//!
//! One command per line: the configured [`COMMAND_PREFIX`], one command
//! character and an optional decimal parameter, e.g. `p10` stages pump 10.
//! A missing parameter reads as 0.  The [`Console`](super::console::Console)
//! assembles lines and hands them to [`parse_line`]; the resulting
//! [`Command`] is interpreted against the
//! [`PumpBoard`](super::service::PumpBoard).

use core::fmt;

use crate::config::COMMAND_PREFIX;

/// At most this many parameter digits are accepted.
pub const MAX_PARAMETER_DIGITS: usize = 5;

/// Commands that the console can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `h`, `H`, `?`
    Help,
    /// `v`
    Version,
    /// `r`: drop the recipe being built.
    Reset,
    /// `pX`: stage pump X.
    SetPump(u16),
    /// `dX`: stage a duration of X ms.
    SetDuration(u16),
    /// `wX`: stage a delay of X ms.
    SetDelay(u16),
    /// `s`: commit the staged ingredient.
    Store,
    /// `g`: dispense and wait.
    Go,
    /// `l`: list the committed ingredients.
    List,
    /// `cX`: start (X ≠ 0) or stop (X = 0) a clean cycle.
    Clean { start: bool },
    /// `nX`: switch pump X on.
    PumpOn(u16),
    /// `fX`: switch pump X off.
    PumpOff(u16),
}

impl Command {
    fn from_char(c: char, arg: u16) -> Option<Self> {
        let cmd = match c {
            'h' | 'H' | '?' => Self::Help,
            'v' | 'V' => Self::Version,
            'r' | 'R' => Self::Reset,
            'p' | 'P' => Self::SetPump(arg),
            'd' | 'D' => Self::SetDuration(arg),
            'w' | 'W' => Self::SetDelay(arg),
            's' | 'S' => Self::Store,
            'g' | 'G' => Self::Go,
            'l' | 'L' => Self::List,
            'c' | 'C' => Self::Clean { start: arg != 0 },
            'n' | 'N' => Self::PumpOn(arg),
            'f' | 'F' => Self::PumpOff(arg),
            _ => return None,
        };
        Some(cmd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    UnknownCommand,
    InvalidPrefix,
    NonDigitParameter,
    /// More than [`MAX_PARAMETER_DIGITS`] digits, or a value above `u16::MAX`.
    ParameterTooLong,
    /// The line did not fit the console buffer.
    LineOverflow,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::InvalidPrefix => write!(f, "invalid command prefix"),
            Self::NonDigitParameter => write!(f, "non-ASCII-digit parameter"),
            Self::ParameterTooLong => write!(f, "parameter is too long"),
            Self::LineOverflow => write!(f, "command line buffer will overflow"),
        }
    }
}

/// Parse one line without its terminator.
///
/// Returns `Ok(None)` for a line too short to hold a command.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    if line.len() < COMMAND_PREFIX.len() + 1 {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix(COMMAND_PREFIX) else {
        return Err(ParseError::InvalidPrefix);
    };

    let mut chars = rest.chars();
    let Some(c) = chars.next() else {
        return Ok(None);
    };
    let arg = parse_parameter(chars.as_str())?;

    Command::from_char(c, arg)
        .map(Some)
        .ok_or(ParseError::UnknownCommand)
}

fn parse_parameter(digits: &str) -> Result<u16, ParseError> {
    let mut value: u32 = 0;
    for (i, b) in digits.bytes().enumerate() {
        if !b.is_ascii_digit() {
            return Err(ParseError::NonDigitParameter);
        }
        if i >= MAX_PARAMETER_DIGITS {
            return Err(ParseError::ParameterTooLong);
        }
        value = value * 10 + u32::from(b - b'0');
    }
    u16::try_from(value).map_err(|_| ParseError::ParameterTooLong)
}
