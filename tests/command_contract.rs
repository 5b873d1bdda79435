//! Purpose: Lock the command grammar with corpus coverage.
//! Exports: Integration tests only (no runtime exports).
//! Invariants: The trailing-token-is-count rule and CRLF stripping stay
//! Invariants: represented exactly as every channel relies on them.

use atomite::core::catalog::AtomKind;
use atomite::core::command::{Command, parse};

fn add(kind: AtomKind, amount: u64) -> Command {
    Command::Add { kind, amount }
}

fn deliver(name: &str, count: u64) -> Command {
    Command::Deliver {
        name: name.to_string(),
        count,
    }
}

fn generate(name: &str, count: u64) -> Command {
    Command::Gen {
        name: name.to_string(),
        count,
    }
}

#[test]
fn corpus_well_formed_lines() {
    let corpus: &[(&str, Command)] = &[
        ("ADD CARBON 10", add(AtomKind::Carbon, 10)),
        ("ADD HYDROGEN 0", add(AtomKind::Hydrogen, 0)),
        ("ADD OXYGEN 18446744073709551615", add(AtomKind::Oxygen, u64::MAX)),
        ("DELIVER WATER", deliver("WATER", 1)),
        ("DELIVER WATER 5", deliver("WATER", 5)),
        ("DELIVER CARBON DIOXIDE", deliver("CARBON DIOXIDE", 1)),
        ("DELIVER CARBON DIOXIDE 12", deliver("CARBON DIOXIDE", 12)),
        ("DELIVER SOFT DRINK 2", deliver("SOFT DRINK", 2)),
        ("GEN WATER", generate("WATER", 1)),
        ("GEN SOFT DRINK 3", generate("SOFT DRINK", 3)),
    ];

    for (line, expected) in corpus {
        assert_eq!(&parse(line), expected, "line: {line:?}");
    }
}

#[test]
fn corpus_transport_framing() {
    // Stream input arrives CRLF-terminated, datagrams may or may not be.
    let corpus: &[(&str, Command)] = &[
        ("ADD CARBON 10\r\n", add(AtomKind::Carbon, 10)),
        ("ADD CARBON 10\n", add(AtomKind::Carbon, 10)),
        ("DELIVER WATER 2\r\n", deliver("WATER", 2)),
        ("GEN VODKA\r", generate("VODKA", 1)),
    ];

    for (line, expected) in corpus {
        assert_eq!(&parse(line), expected, "line: {line:?}");
    }
}

#[test]
fn corpus_malformed_lines() {
    let corpus = [
        "",
        "   ",
        "\r\n",
        "FOO BAR",
        "add CARBON 10",
        "ADD",
        "ADD CARBON",
        "ADD CARBON abc",
        "ADD CARBON 1 2",
        "ADD CARBON 0x10",
        "ADD HELIUM 4",
        "ADD carbon 4",
        "DELIVER",
        "GEN",
        "DELIVER WATER 18446744073709551616",
        "ADD CARBON 18446744073709551616",
    ];

    for line in corpus {
        assert_eq!(parse(line), Command::Invalid, "line: {line:?}");
    }
}

#[test]
fn trailing_token_rule_edge_cases() {
    // A lone numeric remainder is a name (looked up and rejected later),
    // never a count with an empty name.
    assert_eq!(parse("DELIVER 42"), deliver("42", 1));
    // Mixed alphanumeric trailers belong to the name.
    assert_eq!(parse("DELIVER VITAMIN B12"), deliver("VITAMIN B12", 1));
    // Only the last token can be the count.
    assert_eq!(parse("DELIVER 7 UP"), deliver("7 UP", 1));
    assert_eq!(parse("DELIVER 7 UP 2"), deliver("7 UP", 2));
}

#[test]
fn names_keep_case_and_spaces() {
    assert_eq!(parse("DELIVER Soft Drink"), deliver("Soft Drink", 1));
    assert_eq!(
        parse("DELIVER   CARBON    DIOXIDE   9"),
        deliver("CARBON DIOXIDE", 9)
    );
}
