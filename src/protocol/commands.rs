//! Module `commands`
//!
//! Defines the command parsing logic and the data structures used to
//! represent commands, their status, associated data, and results.

use std::fs::File;

use crate::broker::QueryField;

/// A command parsed from a client line.
///
/// Every file command carries the token verbatim; nothing here accepts a path.
#[derive(Debug, PartialEq)]
pub enum Command {
    QUERY {
        token: String,
        fields: Option<Vec<QueryField>>,
    },
    TYPE(String),
    READ(String),
    WRITE {
        token: String,
        mode: String,
        length: u64,
    },
    DELETE(String),
    UPDATE(String),
    INSERT(String),
    NOOP,
    QUIT,
    /// Known command with missing or bad arguments
    MALFORMED(&'static str),
    UNKNOWN,
}

impl Command {
    /// Name used in logs. Tokens are left out.
    pub fn name(&self) -> &'static str {
        match self {
            Command::QUERY { .. } => "QUERY",
            Command::TYPE(_) => "TYPE",
            Command::READ(_) => "READ",
            Command::WRITE { .. } => "WRITE",
            Command::DELETE(_) => "DELETE",
            Command::UPDATE(_) => "UPDATE",
            Command::INSERT(_) => "INSERT",
            Command::NOOP => "NOOP",
            Command::QUIT => "QUIT",
            Command::MALFORMED(_) => "MALFORMED",
            Command::UNKNOWN => "UNKNOWN",
        }
    }
}

/// Outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Byte stream the session must move after sending the reply.
#[derive(Debug)]
pub enum CommandData {
    /// Send exactly `length` bytes of `file` to the client.
    Download { file: File, length: u64 },
    /// Read exactly `length` bytes from the client into `file`.
    Upload { file: File, length: u64 },
}

/// Full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
    pub data: Option<CommandData>,
}

/// Parses a raw line into a `Command`.
pub fn parse_command(raw: &str) -> Command {
    let mut parts = raw.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let args: Vec<&str> = parts.collect();

    match (cmd.as_str(), args.as_slice()) {
        ("QUERY", [token]) => Command::QUERY {
            token: token.to_string(),
            fields: None,
        },
        ("QUERY", [token, fields]) => Command::QUERY {
            token: token.to_string(),
            fields: Some(QueryField::parse_list(fields)),
        },
        ("QUERY", _) => Command::MALFORMED("QUERY <token> [field,...]"),
        ("TYPE", [token]) => Command::TYPE(token.to_string()),
        ("TYPE", _) => Command::MALFORMED("TYPE <token>"),
        ("READ", [token]) => Command::READ(token.to_string()),
        ("READ", _) => Command::MALFORMED("READ <token>"),
        ("WRITE", [token, mode, length]) => match length.parse::<u64>() {
            Ok(length) => Command::WRITE {
                token: token.to_string(),
                mode: mode.to_string(),
                length,
            },
            Err(_) => Command::MALFORMED("WRITE <token> <mode> <length>"),
        },
        ("WRITE", _) => Command::MALFORMED("WRITE <token> <mode> <length>"),
        ("DELETE", [token]) => Command::DELETE(token.to_string()),
        ("DELETE", _) => Command::MALFORMED("DELETE <token>"),
        ("UPDATE", [token]) => Command::UPDATE(token.to_string()),
        ("UPDATE", _) => Command::MALFORMED("UPDATE <token>"),
        ("INSERT", [token]) => Command::INSERT(token.to_string()),
        ("INSERT", _) => Command::MALFORMED("INSERT <token>"),
        ("NOOP", []) => Command::NOOP,
        ("QUIT", []) | ("Q", []) => Command::QUIT,
        _ => Command::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: &str = "content://rax/files/sub%2Fa.apk";

    #[test]
    fn test_parse_token_commands() {
        assert_eq!(parse_command(&format!("type {T}")), Command::TYPE(T.into()));
        assert_eq!(parse_command(&format!("READ {T}\r\n")), Command::READ(T.into()));
        assert_eq!(parse_command(&format!("DELETE {T}")), Command::DELETE(T.into()));
        assert_eq!(
            parse_command(&format!("QUERY {T} _size")),
            Command::QUERY {
                token: T.into(),
                fields: Some(vec![QueryField::Size])
            }
        );
    }

    #[test]
    fn test_parse_write() {
        assert_eq!(
            parse_command(&format!("WRITE {T} wa 12")),
            Command::WRITE {
                token: T.into(),
                mode: "wa".into(),
                length: 12
            }
        );
        assert!(matches!(
            parse_command(&format!("WRITE {T} wa twelve")),
            Command::MALFORMED(_)
        ));
    }

    #[test]
    fn test_parse_misuse_and_unknown() {
        assert!(matches!(parse_command("READ"), Command::MALFORMED(_)));
        assert!(matches!(parse_command("TYPE a b"), Command::MALFORMED(_)));
        assert_eq!(parse_command("RETR file.txt"), Command::UNKNOWN);
        assert_eq!(parse_command(""), Command::UNKNOWN);
        assert_eq!(parse_command("quit"), Command::QUIT);
    }
}
