use std::path::PathBuf;

use crate::domain::Field;

pub const HELP: &str = "\
Commands:
  set <username|name|email|age> <value>   edit a form field (value may be empty)
  file <path>                             choose a profile image
  nofile                                  drop the chosen image
  create                                  Create User
  key <username or email>                 edit the lookup key
  fetch                                   Fetch User
  update                                  Update User (once a user is loaded)
  show                                    redraw the form
  help                                    this text
  quit                                    leave";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set(Field, String),
    File(PathBuf),
    NoFile,
    Create,
    Key(String),
    Fetch,
    Update,
    Show,
    Help,
    Quit,
}

/// Parses a line. Blank lines are `Ok(None)`; anything unrecognised is an error message.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim_start();
    if line.trim().is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line.trim_end(), ""),
    };

    let command = match verb {
        "set" => {
            let (field, value) = match rest.split_once(char::is_whitespace) {
                Some((field, value)) => (field, value.trim()),
                None => (rest, ""),
            };
            if field.is_empty() {
                return Err("usage: set <username|name|email|age> <value>".to_string());
            }
            Command::Set(field.parse()?, value.to_string())
        }
        "file" if rest.is_empty() => return Err("usage: file <path>".to_string()),
        "file" => Command::File(PathBuf::from(rest)),
        "nofile" => Command::NoFile,
        "create" => Command::Create,
        "key" => Command::Key(rest.to_string()),
        "fetch" => Command::Fetch,
        "update" => Command::Update,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command '{}'. Type 'help' for a list.", other)),
    };
    Ok(Some(command))
}
