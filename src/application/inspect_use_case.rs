// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Loads a saved document and drives a Browser from a line-based
// command stream:
//
//   p        go to the parent
//   c <n>    go to child n
//   r <n>    go to root n
//   g <name> go to a module by dotted name
//   q        quit (end of input quits too)
//
// The page is re-rendered after every command that moves the
// selection. Reader and writer are generic so tests can drive
// a session with in-memory buffers.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};

use crate::application::browser::Browser;
use crate::infra::document_store::DocumentStore;
use crate::recording::ledger::Ledger;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Parent,
    Child(usize),
    Root(usize),
    Goto(String),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?;
    let arg = parts.next();
    match (verb, arg) {
        ("p", None) => Some(Command::Parent),
        ("q", None) => Some(Command::Quit),
        ("c", Some(n)) => n.parse().ok().map(Command::Child),
        ("r", Some(n)) => n.parse().ok().map(Command::Root),
        ("g", Some(name)) => Some(Command::Goto(name.to_string())),
        _ => None,
    }
}

pub struct InspectUseCase {
    path:  String,
    start: Option<String>,
}

impl InspectUseCase {
    pub fn new(path: impl Into<String>, start: Option<String>) -> Self {
        Self { path: path.into(), start }
    }

    pub fn execute<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<()> {
        let session = DocumentStore::new(&self.path)
            .load_session()
            .with_context(|| format!("Cannot load recording '{}'", self.path))?;
        let ledger = session.ledger();
        run(&ledger, self.start.as_deref(), input, output)
    }
}

/// Browse `ledger` until `q` or end of input.
pub fn run<R: BufRead, W: Write>(ledger: &Ledger, start: Option<&str>, input: R, mut output: W) -> Result<()> {
    let Some(mut browser) = Browser::new(ledger) else {
        writeln!(output, "Recording contains no modules.")?;
        return Ok(());
    };
    if let Some(name) = start {
        if !browser.select(name) {
            bail!("No module named '{}' in this recording", name);
        }
    }

    write!(output, "{}", browser.render())?;
    for line in input.lines() {
        let line = line.context("Failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }

        let moved = match parse_command(&line) {
            Some(Command::Quit) => break,
            Some(Command::Parent) => browser.select_parent(),
            Some(Command::Child(n)) => browser.select_child(n),
            Some(Command::Root(n)) => browser.select_root(n),
            Some(Command::Goto(name)) => browser.select(&name),
            None => {
                writeln!(output, "Unknown command '{}' (p, c <n>, r <n>, g <name>, q)", line.trim())?;
                continue;
            }
        };

        if moved {
            write!(output, "{}", browser.render())?;
        } else {
            writeln!(output, "Nothing there.")?;
        }
    }
    output.flush()?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::domain::traits::HostModule;
    use crate::ml::testing::FakeModule;
    use crate::recording::session::Session;

    fn drive(session: &Session<'_>, start: Option<&str>, commands: &str) -> Result<String> {
        let mut out = Vec::new();
        run(&session.ledger(), start, Cursor::new(commands), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("p"), Some(Command::Parent));
        assert_eq!(parse_command(" c 2 "), Some(Command::Child(2)));
        assert_eq!(parse_command("r 0"), Some(Command::Root(0)));
        assert_eq!(parse_command("g net.fc"), Some(Command::Goto("net.fc".to_string())));
        assert_eq!(parse_command("c"), None);
        assert_eq!(parse_command("c x"), None);
        assert_eq!(parse_command("p 1"), None);
    }

    #[test]
    fn test_walks_down_and_back_up() {
        let net = FakeModule::new("Net").child("fc", FakeModule::new("Linear"));
        let session = Session::new([("net", &net as &dyn HostModule)]);

        let out = drive(&session, None, "c 0\nc 0\np\nq\nc 0\n").unwrap();
        let headers: Vec<&str> = out.lines().filter(|l| l.starts_with("==")).collect();
        assert_eq!(headers, vec!["== net (Net) ==", "== net.fc (Linear) ==", "== net (Net) =="]);
        assert_eq!(out.matches("Nothing there.").count(), 1);
    }

    #[test]
    fn test_unknown_command_is_reported() {
        let net = FakeModule::new("Net");
        let session = Session::new([("net", &net as &dyn HostModule)]);
        let out = drive(&session, None, "jump\n").unwrap();
        assert!(out.contains("Unknown command 'jump'"));
    }

    #[test]
    fn test_start_module() {
        let net = FakeModule::new("Net").child("fc", FakeModule::new("Linear"));
        let session = Session::new([("net", &net as &dyn HostModule)]);

        let out = drive(&session, Some("net.fc"), "").unwrap();
        assert!(out.starts_with("== net.fc (Linear) =="));
        assert!(drive(&session, Some("net.nope"), "").is_err());
    }

    #[test]
    fn test_empty_recording() {
        let session = Session::new(std::iter::empty::<(String, &dyn HostModule)>());
        let out = drive(&session, None, "p\n").unwrap();
        assert_eq!(out, "Recording contains no modules.\n");
    }
}
