// Dashboard commands
//
// The headless dashboard reads one intent per line. Parsing lives here so it
// can be tested without a terminal.

use crate::models::Event;
use thiserror::Error;

/// An intent issued from the dashboard prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Count one IDE event, e.g. `event build`
    Event(Event),

    /// Report a completed catalog challenge, e.g. `complete typing-1`
    Complete(String),

    /// Change the nickname; everything after the keyword is the name
    Nickname(String),

    /// Reset all progress
    Reset,

    /// Print the dashboard
    Show,

    /// List challenges and their status
    Challenges,

    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("Unknown event '{0}'")]
    UnknownEvent(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (keyword, argument) = match line.split_once(char::is_whitespace) {
            Some((keyword, argument)) => (keyword, argument.trim()),
            None => (line, ""),
        };

        let require = |name: &'static str| {
            if argument.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(argument.to_string())
            }
        };

        match keyword.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "event" => {
                let name = require("event")?;
                Event::from_name(&name)
                    .map(Command::Event)
                    .ok_or(CommandError::UnknownEvent(name))
            }
            "complete" => require("complete").map(Command::Complete),
            // The nickname is passed through untouched so validation happens in the engine
            "nickname" => Ok(Command::Nickname(argument.to_string())),
            "reset" => Ok(Command::Reset),
            "show" => Ok(Command::Show),
            "challenges" => Ok(Command::Challenges),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    /// Whether the command can change progression state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Event(_) | Command::Complete(_) | Command::Nickname(_) | Command::Reset
        )
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  event <name>      count an IDE event (typing, cut, copy, paste, backspace,
                    tab, enter, save, build, run, debug, action)
  complete <id>     complete a challenge by id
  nickname <name>   set your nickname
  reset             erase all progress (cannot be undone)
  show              print the dashboard
  challenges        list challenges
  quit              exit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("event build"), Ok(Command::Event(Event::Build)));
        assert_eq!(Command::parse("  EVENT  Typing "), Ok(Command::Event(Event::Typing)));
        assert_eq!(
            Command::parse("complete typing-1"),
            Ok(Command::Complete("typing-1".to_string()))
        );
        assert_eq!(
            Command::parse("nickname Code Wizard"),
            Ok(Command::Nickname("Code Wizard".to_string()))
        );
        assert_eq!(Command::parse("reset"), Ok(Command::Reset));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert_eq!(Command::parse("event"), Err(CommandError::MissingArgument("event")));
        assert_eq!(
            Command::parse("event compile"),
            Err(CommandError::UnknownEvent("compile".to_string()))
        );
        assert_eq!(
            Command::parse("dance"),
            Err(CommandError::Unknown("dance".to_string()))
        );
    }

    #[test]
    fn test_empty_nickname_reaches_engine() {
        assert_eq!(Command::parse("nickname"), Ok(Command::Nickname(String::new())));
    }

    #[test]
    fn test_is_mutating() {
        assert!(Command::Reset.is_mutating());
        assert!(Command::Complete("c1".to_string()).is_mutating());
        assert!(!Command::Show.is_mutating());
        assert!(!Command::Quit.is_mutating());
    }
}
