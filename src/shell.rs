// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Interactive command surface.
//!
//! Lines are parsed into a [`Command`] and dispatched to the
//! [`SecureFileStore`]. Every command produces a printable string; failures
//! are rendered with a message chosen by [`ErrorKind`].

use std::fmt;

use crate::error::{ErrorKind, VaultError};
use crate::sandbox::DirectoryChange;
use crate::storage::AuditEvent;
use crate::vault::SecureFileStore;

pub const HELP: &str = "\
Accounts:
  register <user> <password>   create an account
  login <user> <password>      open a session
  logout                       close the session
  whoami                       show the current user
Files:
  create|touch <name>          create an empty encrypted file
  read|cat <name>              print a file
  update|write <name> <text>   replace a file's content
  delete|rm <name>             delete a file
  history <name>               show a file's integrity ledger
Directories:
  mkdir <name>                 create a directory
  cd <dir>                     change directory (`/` for the root)
  pwd                          print the current directory
  ls [dir]                     list a directory
Other:
  audit                        show your audit trail
  help                         show this help
  exit                         leave";

/// Parsed shell command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Register { username: String, password: String },
    Login { username: String, password: String },
    Logout,
    Whoami,
    Create { name: String },
    Read { name: String },
    Update { name: String, content: String },
    Delete { name: String },
    History { name: String },
    Mkdir { name: String },
    Cd { dir: String },
    Pwd,
    Ls { dir: String },
    Audit,
    Help,
    Exit,
}

/// Errors surfaced by the parser.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command: {0} (type 'help')")]
    UnknownCommand(String),
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

/// Split off the first whitespace-delimited word.
fn next_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

fn required<'a>(input: &'a str, name: &'static str) -> Result<(String, &'a str), ParseError> {
    let (word, rest) = next_word(input);
    if word.is_empty() {
        return Err(ParseError::MissingArgument(name));
    }
    Ok((word.to_string(), rest))
}

fn finish(rest: &str) -> Result<(), ParseError> {
    match rest.trim() {
        "" => Ok(()),
        extra => Err(ParseError::UnexpectedArgument(extra.to_string())),
    }
}

fn single(rest: &str, name: &'static str) -> Result<String, ParseError> {
    let (value, rest) = required(rest, name)?;
    finish(rest)?;
    Ok(value)
}

fn credentials(rest: &str) -> Result<(String, String), ParseError> {
    let (username, rest) = required(rest, "user")?;
    let password = single(rest, "password")?;
    Ok((username, password))
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let (verb, rest) = next_word(line);
        if verb.is_empty() {
            return Ok(None);
        }

        let command = match verb.to_ascii_lowercase().as_str() {
            "register" => {
                let (username, password) = credentials(rest)?;
                Command::Register { username, password }
            }
            "login" => {
                let (username, password) = credentials(rest)?;
                Command::Login { username, password }
            }
            "logout" => finish(rest).map(|_| Command::Logout)?,
            "whoami" => finish(rest).map(|_| Command::Whoami)?,
            "create" | "touch" => Command::Create {
                name: single(rest, "name")?,
            },
            "read" | "cat" => Command::Read {
                name: single(rest, "name")?,
            },
            "update" | "write" => {
                let (name, content) = required(rest, "name")?;
                Command::Update {
                    name,
                    content: content.to_string(),
                }
            }
            "delete" | "rm" => Command::Delete {
                name: single(rest, "name")?,
            },
            "history" => Command::History {
                name: single(rest, "name")?,
            },
            "mkdir" => Command::Mkdir {
                name: single(rest, "name")?,
            },
            "cd" => Command::Cd {
                dir: single(rest, "dir")?,
            },
            "pwd" => finish(rest).map(|_| Command::Pwd)?,
            "ls" => {
                let (dir, rest) = next_word(rest);
                finish(rest)?;
                Command::Ls {
                    dir: dir.to_string(),
                }
            }
            "audit" => finish(rest).map(|_| Command::Audit)?,
            "help" => Command::Help,
            "exit" | "quit" => Command::Exit,
            other => return Err(ParseError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Result of executing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Exit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Output(text) => f.write_str(text),
            Outcome::Exit => f.write_str("Goodbye."),
        }
    }
}

/// User-facing message for a failure.
pub fn render_error(err: &VaultError) -> String {
    let headline = match err.kind() {
        ErrorKind::NotFound => "No such file, directory or user",
        ErrorKind::AlreadyExists => "Already exists",
        ErrorKind::NotReadable => "File is not readable",
        ErrorKind::NotWritable => "File is not writable",
        ErrorKind::InvalidArgument => "Invalid argument",
        ErrorKind::OutOfBounds => "Access outside the vault is forbidden",
        ErrorKind::PermissionDenied => "Permission denied",
        ErrorKind::IntegrityViolation => "INTEGRITY VIOLATION: file was altered outside the vault",
        ErrorKind::Crypto => "Decryption failed",
        ErrorKind::Persistence => "Storage unavailable, try again",
        ErrorKind::Unknown => "Unexpected error",
    };
    format!("{headline} ({err})")
}

fn render_audit(events: &[AuditEvent]) -> String {
    if events.is_empty() {
        return "(no events)".to_string();
    }
    events
        .iter()
        .map(|e| {
            let outcome = match e.error_kind {
                None => "ok".to_string(),
                Some(kind) => kind.to_string(),
            };
            let action = format!("{:?}", e.action);
            format!(
                "#{:<5} {} {:<16} {:<20} {}",
                e.sequence.unwrap_or_default(),
                e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                action,
                e.target.as_deref().unwrap_or("-"),
                outcome
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line-oriented front end over a file store.
pub struct Shell<'a> {
    store: &'a mut SecureFileStore,
}

impl<'a> Shell<'a> {
    pub fn new(store: &'a mut SecureFileStore) -> Self {
        Self { store }
    }

    /// Prompt showing the current directory.
    pub fn prompt(&self) -> String {
        format!("sfm:{}> ", self.store.pwd())
    }

    /// Parse and run one line.
    pub fn execute(&mut self, line: &str) -> Outcome {
        match Command::parse(line) {
            Ok(None) => Outcome::Output(String::new()),
            Ok(Some(Command::Exit)) => Outcome::Exit,
            Ok(Some(command)) => {
                let output = self.dispatch(command).unwrap_or_else(|e| render_error(&e));
                Outcome::Output(output)
            }
            Err(e) => Outcome::Output(e.to_string()),
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<String, VaultError> {
        let store = &mut *self.store;
        let output = match command {
            Command::Register { username, password } => {
                store.register(&username, &password)?;
                format!("User {username} registered.")
            }
            Command::Login { username, password } => {
                store.login(&username, &password)?;
                format!("Logged in as {username}.")
            }
            Command::Logout => {
                store.logout()?;
                "Logged out.".to_string()
            }
            Command::Whoami => store.whoami().unwrap_or("(not logged in)").to_string(),
            Command::Create { name } => {
                store.create(&name)?;
                format!("Created {name}.")
            }
            Command::Read { name } => String::from_utf8_lossy(&store.read(&name)?).into_owned(),
            Command::Update { name, content } => {
                store.update(&name, content.as_bytes())?;
                format!("Updated {name} ({} bytes).", content.len())
            }
            Command::Delete { name } => {
                store.delete(&name)?;
                format!("Deleted {name}.")
            }
            Command::History { name } => store
                .history(&name)?
                .iter()
                .map(|entry| {
                    format!(
                        "{} {:>8} {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        entry.size,
                        entry.fingerprint
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Command::Mkdir { name } => {
                store.mkdir(&name)?;
                format!("Created directory {name}.")
            }
            Command::Cd { dir } => match store.change_directory(&dir)? {
                DirectoryChange::Moved => store.pwd(),
                DirectoryChange::AlreadyAtRoot => "Already at the root.".to_string(),
            },
            Command::Pwd => store.pwd(),
            Command::Ls { dir } => {
                let entries = store.list(&dir)?;
                if entries.is_empty() {
                    "(empty)".to_string()
                } else {
                    entries.join("\n")
                }
            }
            Command::Audit => render_audit(&store.audit_trail()?),
            Command::Help => HELP.to_string(),
            Command::Exit => String::new(),
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultConfig;
    use tempfile::TempDir;

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(
            Command::parse("touch a.txt").unwrap(),
            Some(Command::Create { name: "a.txt".into() })
        );
        assert_eq!(
            Command::parse("CAT a.txt").unwrap(),
            Some(Command::Read { name: "a.txt".into() })
        );
        assert_eq!(
            Command::parse("login alice pw").unwrap(),
            Some(Command::Login {
                username: "alice".into(),
                password: "pw".into()
            })
        );
        assert_eq!(Command::parse("ls").unwrap(), Some(Command::Ls { dir: String::new() }));
        assert_eq!(Command::parse("quit").unwrap(), Some(Command::Exit));
    }

    #[test]
    fn update_keeps_the_rest_of_the_line() {
        assert_eq!(
            Command::parse("write notes.txt hello   world ").unwrap(),
            Some(Command::Update {
                name: "notes.txt".into(),
                content: "hello   world ".into()
            })
        );
        assert_eq!(
            Command::parse("update notes.txt").unwrap(),
            Some(Command::Update {
                name: "notes.txt".into(),
                content: String::new()
            })
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            Command::parse("frobnicate").unwrap_err(),
            ParseError::UnknownCommand("frobnicate".into())
        );
        assert_eq!(
            Command::parse("read").unwrap_err(),
            ParseError::MissingArgument("name")
        );
        assert_eq!(
            Command::parse("login alice").unwrap_err(),
            ParseError::MissingArgument("password")
        );
        assert_eq!(
            Command::parse("rm a b").unwrap_err(),
            ParseError::UnexpectedArgument("b".into())
        );
    }

    #[test]
    fn errors_are_rendered_by_kind() {
        let msg = render_error(&VaultError::permission_denied("bob", "a.txt"));
        assert!(msg.starts_with("Permission denied"));
        assert!(msg.contains("bob"));

        let msg = render_error(&VaultError::IntegrityViolation("a.txt".into()));
        assert!(msg.starts_with("INTEGRITY VIOLATION"));

        let msg = render_error(&VaultError::NotADirectory("a.txt".into()));
        assert!(msg.starts_with("Invalid argument"));
    }

    #[test]
    fn session_transcript() {
        let temp = TempDir::new().unwrap();
        let mut store = SecureFileStore::new(&VaultConfig::new(temp.path())).unwrap();
        let mut shell = Shell::new(&mut store);

        let mut run = |line: &str| shell.execute(line).to_string();

        assert!(run("create a.txt").starts_with("Permission denied"));
        assert_eq!(run("register alice pw"), "User alice registered.");
        assert_eq!(run("login alice pw"), "Logged in as alice.");
        assert_eq!(run("whoami"), "alice");
        assert_eq!(run("mkdir docs"), "Created directory docs.");
        assert_eq!(run("cd docs"), "/docs");
        assert_eq!(run("touch a.txt"), "Created a.txt.");
        assert_eq!(run("write a.txt hello there"), "Updated a.txt (11 bytes).");
        assert_eq!(run("cat a.txt"), "hello there");
        assert_eq!(run("ls"), "a.txt");
        assert_eq!(run("history a.txt").lines().count(), 2);
        assert!(run("cd ../..").starts_with("Access outside the vault"));
        assert_eq!(run("cd /"), "/");
        assert_eq!(run("cd .."), "Already at the root.");
        assert_eq!(run("ls"), "docs/");
        assert!(run("audit").contains("docs/a.txt"));
        assert_eq!(run(""), "");
        assert_eq!(run("exit"), "Goodbye.");
    }

    #[test]
    fn prompt_tracks_directory() {
        let temp = TempDir::new().unwrap();
        let mut store = SecureFileStore::new(&VaultConfig::new(temp.path())).unwrap();
        store.register("alice", "pw").unwrap();
        store.login("alice", "pw").unwrap();
        store.mkdir("docs").unwrap();

        let mut shell = Shell::new(&mut store);
        assert_eq!(shell.prompt(), "sfm:/> ");
        shell.execute("cd docs");
        assert_eq!(shell.prompt(), "sfm:/docs> ");
        assert_eq!(shell.execute("exit"), Outcome::Exit);
    }
}
