// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The inbound command format: `<group>,<action>,<value>`.

use std::fmt;

/// Errors for commands that can't be carried out. None of these are fatal: the command is
/// logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("message is not valid UTF-8")]
    Encoding,

    #[error("expected 3 comma separated fields, found {0}")]
    FieldCount(usize),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("invalid value '{value}' for {action}")]
    InvalidValue { action: String, value: String },

    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    #[error("track {index} is out of range for group {group} ({available} samples)")]
    TrackOutOfRange {
        group: String,
        index: i64,
        available: usize,
    },
}

/// What to do to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Set the channel volume, in percent.
    Volume(i64),
    /// Play the given track once.
    Play(i64),
    /// Loop the given track until stopped or replaced.
    Loop(i64),
    /// Stop whatever is playing.
    Stop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Volume(percent) => write!(f, "volume {}", percent),
            Action::Play(index) => write!(f, "play {}", index),
            Action::Loop(index) => write!(f, "loop {}", index),
            Action::Stop => f.write_str("stop"),
        }
    }
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The lower-cased group name.
    pub group: String,
    pub action: Action,
}

/// Parses a datagram into a command. Fields are trimmed and lower-cased. `stop` may omit
/// its value; every other action requires exactly three fields.
pub fn parse(datagram: &[u8]) -> Result<Command, CommandError> {
    let text = std::str::from_utf8(datagram).map_err(|_| CommandError::Encoding)?;
    let fields: Vec<String> = text
        .trim()
        .split(',')
        .map(|field| field.trim().to_lowercase())
        .collect();

    let (group, action, value) = match fields.as_slice() {
        [group, action, value] => (group, action, Some(value)),
        [group, action] if action == "stop" => (group, action, None),
        _ => return Err(CommandError::FieldCount(fields.len())),
    };

    let parse_value = || -> Result<i64, CommandError> {
        let value = value.map(String::as_str).unwrap_or_default();
        value.parse::<i64>().map_err(|_| CommandError::InvalidValue {
            action: action.to_string(),
            value: value.to_string(),
        })
    };

    let action = match action.as_str() {
        "volume" => Action::Volume(parse_value()?),
        "play" => Action::Play(parse_value()?),
        "loop" => Action::Loop(parse_value()?),
        "stop" => Action::Stop,
        other => return Err(CommandError::UnknownAction(other.to_string())),
    };

    Ok(Command {
        group: group.to_string(),
        action,
    })
}

#[cfg(test)]
mod test {
    use super::{parse, Action, Command, CommandError};

    fn command(group: &str, action: Action) -> Command {
        Command {
            group: group.to_string(),
            action,
        }
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(parse(b"dispatch,play,1"), Ok(command("dispatch", Action::Play(1))));
        assert_eq!(parse(b"dispatch,loop,0"), Ok(command("dispatch", Action::Loop(0))));
        assert_eq!(
            parse(b"dispatch,volume,50"),
            Ok(command("dispatch", Action::Volume(50)))
        );
        assert_eq!(parse(b"dispatch,stop,0"), Ok(command("dispatch", Action::Stop)));
    }

    #[test]
    fn test_parse_trims_and_lowercases() {
        assert_eq!(
            parse(b"  Dispatch , PLAY ,  2 \r\n"),
            Ok(command("dispatch", Action::Play(2)))
        );
    }

    #[test]
    fn test_stop_ignores_value() {
        assert_eq!(parse(b"archive,stop,x"), Ok(command("archive", Action::Stop)));
        assert_eq!(parse(b"archive,stop"), Ok(command("archive", Action::Stop)));
    }

    #[test]
    fn test_field_count() {
        assert_eq!(parse(b"archive,play"), Err(CommandError::FieldCount(2)));
        assert_eq!(parse(b"archive"), Err(CommandError::FieldCount(1)));
        assert_eq!(parse(b""), Err(CommandError::FieldCount(1)));
        assert_eq!(parse(b"a,play,1,2"), Err(CommandError::FieldCount(4)));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse(b"archive,volume,loud"),
            Err(CommandError::InvalidValue {
                action: "volume".to_string(),
                value: "loud".to_string()
            })
        );
        assert_eq!(
            parse(b"archive,play,"),
            Err(CommandError::InvalidValue {
                action: "play".to_string(),
                value: "".to_string()
            })
        );
        // Negative indices parse; range checking belongs to the group.
        assert_eq!(parse(b"archive,play,-1"), Ok(command("archive", Action::Play(-1))));
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(
            parse(b"archive,rewind,1"),
            Err(CommandError::UnknownAction("rewind".to_string()))
        );
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(parse(&[0xff, 0xfe, b',']), Err(CommandError::Encoding));
    }
}
