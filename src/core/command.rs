//! Purpose: Turn one raw line of channel input into a typed command.
//! Exports: `Command`, `parse`.
//! Role: Pure parser boundary shared by every listener; no I/O, no mutation.
//! Invariants: Keywords are case-sensitive; molecule names keep their case
//! Invariants: and embedded spaces, with interior whitespace runs collapsed.
//! Invariants: A trailing whitespace-delimited token is the count only when
//! Invariants: it is purely numeric and fits in u64.

use crate::core::catalog::AtomKind;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Add { kind: AtomKind, amount: u64 },
    Deliver { name: String, count: u64 },
    Gen { name: String, count: u64 },
    Invalid,
}

/// Parses one line. Trailing CR/LF is stripped here so every channel gets
/// identical treatment regardless of how its transport frames lines.
pub fn parse(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut tokens = line.split_whitespace();
    let Some(keyword) = tokens.next() else {
        return Command::Invalid;
    };
    let rest: Vec<&str> = tokens.collect();
    match keyword {
        "ADD" => parse_add(&rest),
        "DELIVER" => match parse_molecule_request(&rest) {
            Some((name, count)) => Command::Deliver { name, count },
            None => Command::Invalid,
        },
        "GEN" => match parse_molecule_request(&rest) {
            Some((name, count)) => Command::Gen { name, count },
            None => Command::Invalid,
        },
        _ => Command::Invalid,
    }
}

fn parse_add(rest: &[&str]) -> Command {
    let [kind, amount] = rest else {
        return Command::Invalid;
    };
    let Some(kind) = AtomKind::from_keyword(kind) else {
        return Command::Invalid;
    };
    match parse_numeric(amount) {
        Some(amount) => Command::Add { kind, amount },
        None => Command::Invalid,
    }
}

/// `<molecule-name>[ <count>]`. A lone numeric token is a (probably unknown)
/// name, not a count; a numeric trailer too large for u64 makes the whole
/// line invalid rather than silently folding into the name.
fn parse_molecule_request(rest: &[&str]) -> Option<(String, u64)> {
    if rest.is_empty() {
        return None;
    }
    let (name_tokens, count) = match rest {
        [name @ .., last] if !name.is_empty() && is_numeric(last) => {
            (name, parse_numeric(last)?)
        }
        _ => (rest, 1),
    };
    Some((name_tokens.join(" "), count))
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|byte| byte.is_ascii_digit())
}

fn parse_numeric(token: &str) -> Option<u64> {
    if !is_numeric(token) {
        return None;
    }
    token.parse().ok()
}
