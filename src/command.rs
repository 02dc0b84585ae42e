use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::Note;
use crate::store::NoteStore;

/// Bare runs and double-quoted spans, glued together when adjacent so that
/// `--title="a b"` stays one token.
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:[^\s"]+|"[^"]*")+"#).expect("valid token regex"));

const VERB_HINT: &str = "try: add, list, read, edit, remove, remove-all";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Empty input, unknown verb, or a missing required flag.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Anything the store reported while running the command.
    #[error("{0}")]
    Unexpected(String),
}

impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        let message = err.to_string();
        if message.trim().is_empty() {
            CommandError::Unexpected("something went wrong.".into())
        } else {
            CommandError::Unexpected(message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Add,
    List,
    Read,
    Remove,
    RemoveAll,
    Edit,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Add,
        Verb::List,
        Verb::Read,
        Verb::Edit,
        Verb::Remove,
        Verb::RemoveAll,
    ];

    /// Case-insensitive lookup of a verb word.
    pub fn parse(word: &str) -> Option<Self> {
        let word = word.to_lowercase();
        Self::ALL.into_iter().find(|verb| verb.as_str() == word)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Add => "add",
            Verb::List => "list",
            Verb::Read => "read",
            Verb::Remove => "remove",
            Verb::RemoveAll => "remove-all",
            Verb::Edit => "edit",
        }
    }

    pub fn required_flags(self) -> &'static [&'static str] {
        match self {
            Verb::Add | Verb::Edit => &["--title", "--body"],
            Verb::Read | Verb::Remove => &["--title"],
            Verb::List | Verb::RemoveAll => &[],
        }
    }

    /// Hint shown when a required flag is missing.
    pub fn usage(self) -> String {
        let flags: Vec<String> = self
            .required_flags()
            .iter()
            .map(|flag| format!("{flag}=\"...\""))
            .collect();
        if flags.is_empty() {
            format!("use: {}", self.as_str())
        } else {
            format!("use: {} {}", self.as_str(), flags.join(" "))
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { title: String, body: String },
    List,
    Read { title: String },
    Remove { title: String },
    RemoveAll,
    Edit { title: String, body: String },
}

impl Command {
    /// Parse one command line. Nothing touches the store here.
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let tokens = tokenize(input);
        let Some(first) = tokens.first() else {
            return Err(CommandError::Validation(format!(
                "please type a command. {VERB_HINT}"
            )));
        };
        let verb = Verb::parse(first)
            .ok_or_else(|| CommandError::Validation(format!("unknown command. {VERB_HINT}")))?;

        let values: Vec<String> = verb
            .required_flags()
            .iter()
            .map(|flag| flag_value(&tokens, flag))
            .collect();
        if values.iter().any(String::is_empty) {
            return Err(CommandError::Validation(verb.usage()));
        }

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        let command = match verb {
            Verb::Add => Command::Add {
                title: next(),
                body: next(),
            },
            Verb::List => Command::List,
            Verb::Read => Command::Read { title: next() },
            Verb::Remove => Command::Remove { title: next() },
            Verb::RemoveAll => Command::RemoveAll,
            Verb::Edit => Command::Edit {
                title: next(),
                body: next(),
            },
        };
        Ok(command)
    }

    pub fn verb(&self) -> Verb {
        match self {
            Command::Add { .. } => Verb::Add,
            Command::List => Verb::List,
            Command::Read { .. } => Verb::Read,
            Command::Remove { .. } => Verb::Remove,
            Command::RemoveAll => Verb::RemoveAll,
            Command::Edit { .. } => Verb::Edit,
        }
    }

    /// Run the command against `store`.
    pub fn execute(self, store: &NoteStore) -> Result<CommandResponse, CommandError> {
        debug!(verb = %self.verb(), "executing command");
        let response = match self {
            Command::Add { title, body } => {
                let added = store.add(&title, &body)?;
                let message = if added {
                    "note added!"
                } else {
                    "that title already exists."
                };
                CommandResponse::listing(message, added, store.get_all()?)
            }
            Command::List => {
                CommandResponse::listing("here are your notes:", true, store.get_all()?)
            }
            Command::Read { title } => {
                let note = store
                    .read(&title)?
                    .ok_or_else(|| CommandError::NotFound("note not found.".into()))?;
                CommandResponse {
                    message: format!("{}: {}", note.title, note.body),
                    note: Some(note),
                    notes: Some(store.get_all()?),
                    applied: true,
                }
            }
            Command::Remove { title } => {
                let removed = store.remove(&title)?;
                let message = if removed {
                    "note removed!"
                } else {
                    "note not found."
                };
                CommandResponse::listing(message, removed, store.get_all()?)
            }
            Command::RemoveAll => {
                store.remove_all()?;
                CommandResponse::listing("all notes removed!", true, store.get_all()?)
            }
            Command::Edit { title, body } => {
                let edited = store.edit(&title, &body)?;
                let message = if edited {
                    "note updated!"
                } else {
                    "note not found."
                };
                CommandResponse::listing(message, edited, store.get_all()?)
            }
        };
        Ok(response)
    }
}

/// What a front end shows after a command ran.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Note>>,
    /// False when the command was valid but changed nothing, e.g. a
    /// duplicate add or removing an unknown title.
    #[serde(skip)]
    pub applied: bool,
}

impl CommandResponse {
    fn listing(message: &str, applied: bool, notes: Vec<Note>) -> Self {
        Self {
            message: message.to_string(),
            note: None,
            notes: Some(notes),
            applied,
        }
    }
}

/// Parse and execute one command line.
pub fn dispatch(store: &NoteStore, input: &str) -> Result<CommandResponse, CommandError> {
    Command::parse(input)?.execute(store)
}

/// Split a command line on whitespace, keeping `"..."` spans whole.
pub fn tokenize(input: &str) -> Vec<String> {
    TOKEN
        .find_iter(input)
        .map(|found| found.as_str().to_string())
        .collect()
}

/// Value of the first `flag=...` token with one pair of surrounding quotes
/// removed, or an empty string when the flag is absent.
pub fn flag_value(tokens: &[String], flag: &str) -> String {
    let prefix = format!("{flag}=");
    let Some(raw) = tokens.iter().find_map(|token| token.strip_prefix(&prefix)) else {
        return String::new();
    };
    let raw = raw.strip_prefix('"').unwrap_or(raw);
    let raw = raw.strip_suffix('"').unwrap_or(raw);
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_quoted_flags() {
        let tokens = tokenize(r#"add --title="ideas" --body="build a node app""#);
        assert_eq!(
            tokens,
            vec![
                "add".to_string(),
                r#"--title="ideas""#.to_string(),
                r#"--body="build a node app""#.to_string(),
            ]
        );
    }

    #[test]
    fn test_tokenize_blank_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t  ").is_empty());
    }

    #[test]
    fn test_tokenize_unterminated_quote() {
        let tokens = tokenize(r#"add --title="half open"#);
        assert_eq!(tokens, vec!["add", "--title=", "half", "open"]);
    }

    #[test]
    fn test_flag_value_strips_quotes() {
        let tokens = tokenize(r#"add --title="ideas" --body=plain"#);
        assert_eq!(flag_value(&tokens, "--title"), "ideas");
        assert_eq!(flag_value(&tokens, "--body"), "plain");
        assert_eq!(flag_value(&tokens, "--missing"), "");
    }

    #[test]
    fn test_flag_value_takes_first_match() {
        let tokens = tokenize(r#"edit --title="one" --title="two""#);
        assert_eq!(flag_value(&tokens, "--title"), "one");
    }

    #[test]
    fn test_verb_is_case_insensitive() {
        assert_eq!(Verb::parse("REMOVE-ALL"), Some(Verb::RemoveAll));
        assert_eq!(Verb::parse("Add"), Some(Verb::Add));
        assert_eq!(Verb::parse("delete"), None);
    }

    #[test]
    fn test_usage_strings() {
        assert_eq!(Verb::Add.usage(), r#"use: add --title="..." --body="...""#);
        assert_eq!(Verb::Read.usage(), r#"use: read --title="...""#);
        assert_eq!(Verb::Remove.usage(), r#"use: remove --title="...""#);
        assert_eq!(Verb::Edit.usage(), r#"use: edit --title="..." --body="...""#);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("list"), Ok(Command::List));
        assert_eq!(Command::parse("  remove-all "), Ok(Command::RemoveAll));
        assert_eq!(
            Command::parse(r#"edit --body="new" --title="t""#),
            Ok(Command::Edit {
                title: "t".into(),
                body: "new".into()
            })
        );
    }

    #[test]
    fn test_parse_rejects_missing_flags() {
        assert_eq!(
            Command::parse(r#"add --title="x""#),
            Err(CommandError::Validation(Verb::Add.usage()))
        );
        assert_eq!(
            Command::parse(r#"read --title="""#),
            Err(CommandError::Validation(Verb::Read.usage()))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        match Command::parse("frobnicate") {
            Err(CommandError::Validation(msg)) => assert!(msg.contains("remove-all")),
            other => panic!("unexpected: {other:?}"),
        }
        match Command::parse("   ") {
            Err(CommandError::Validation(msg)) => assert!(msg.starts_with("please type a command")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
