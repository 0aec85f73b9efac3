//! Line commands read by the `folio-shell` binary.

use thiserror::Error;

pub const HELP: &str = "Commands:
open <href>        - Navigate in place to a page
lang <code>        - Switch language (de/en)
click <selector>   - Click the first matching element
back / forward     - Move through history
key <name>         - Press a key (e.g. ArrowLeft)
show [selector]    - Print markup (default: main)
state              - Print location, language and caches
metrics            - Print translation cache metrics
help               - Show this list
quit               - Exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(String),
    Lang(String),
    Click(String),
    Back,
    Forward,
    Key(String),
    Show(Option<String>),
    State,
    Metrics,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Result<Self, CommandError>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim()).filter(|a| !a.is_empty())),
            None => (line, None),
        };
        let required = |name: &'static str| arg.map(str::to_string).ok_or(CommandError::MissingArgument(name));

        let command = match name {
            "open" => required("open").map(Command::Open),
            "lang" => required("lang").map(Command::Lang),
            "click" => required("click").map(Command::Click),
            "key" => required("key").map(Command::Key),
            "back" => Ok(Command::Back),
            "forward" => Ok(Command::Forward),
            "show" => Ok(Command::Show(arg.map(str::to_string))),
            "state" => Ok(Command::State),
            "metrics" => Ok(Command::Metrics),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CommandError> {
        Command::parse(line).expect("non-blank line")
    }

    // ==================== Parse Tests ====================

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(parse("open about.html"), Ok(Command::Open("about.html".to_string())));
        assert_eq!(parse("lang en"), Ok(Command::Lang("en".to_string())));
        assert_eq!(parse("key ArrowLeft"), Ok(Command::Key("ArrowLeft".to_string())));
    }

    #[test]
    fn test_selector_keeps_inner_spaces() {
        assert_eq!(
            parse("click   .lang-switch span[data-lang=\"en\"]  "),
            Ok(Command::Click(".lang-switch span[data-lang=\"en\"]".to_string()))
        );
    }

    #[test]
    fn test_show_with_and_without_selector() {
        assert_eq!(parse("show"), Ok(Command::Show(None)));
        assert_eq!(parse("show nav a"), Ok(Command::Show(Some("nav a".to_string()))));
    }

    #[test]
    fn test_bare_commands() {
        assert_eq!(parse("back"), Ok(Command::Back));
        assert_eq!(parse("forward"), Ok(Command::Forward));
        assert_eq!(parse("state"), Ok(Command::State));
        assert_eq!(parse("metrics"), Ok(Command::Metrics));
        assert_eq!(parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn test_missing_argument() {
        assert_eq!(parse("open"), Err(CommandError::MissingArgument("open")));
        assert_eq!(parse("lang   "), Err(CommandError::MissingArgument("lang")));
    }

    #[test]
    fn test_unknown_and_blank() {
        assert_eq!(parse("reload"), Err(CommandError::Unknown("reload".to_string())));
        assert!(Command::parse("   ").is_none());
    }

    #[test]
    fn test_help_lists_every_command() {
        for name in ["open", "lang", "click", "back", "forward", "key", "show", "state", "metrics", "quit"] {
            assert!(HELP.contains(name), "help is missing {name}");
        }
    }
}
