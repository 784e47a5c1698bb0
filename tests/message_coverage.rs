//! Integration test to ensure the dispatch loop stays total.
//!
//! Every `Message` variant must be matched by the reducer in `update.rs`,
//! and every `Command` variant must be executed by `command_executors.rs`.
//! Both matches are written without a wildcard arm, so a forgotten handler
//! is a compile error in the crate itself; this test additionally catches
//! the subtler case of a handler that exists but routes to the wrong place
//! (e.g. a new network command with no executor branch).
//!
//! Run with: cargo test --test message_coverage

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

fn source(relative: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

/// Extract the variant names of a top-level `pub enum` by scanning the file.
/// Variant lines start with an upper-case identifier; attribute and comment
/// lines are skipped. The enum ends at the first lone `}`.
fn enum_variants(content: &str, enum_name: &str) -> HashSet<String> {
    let mut variants = HashSet::new();
    let opener = format!("pub enum {} {{", enum_name);
    let mut inside = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with(&opener) {
            inside = true;
            continue;
        }
        if !inside {
            continue;
        }
        if trimmed == "}" {
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with("#[") {
            continue;
        }
        let name: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if name
            .chars()
            .next()
            .map(|c| c.is_ascii_uppercase())
            .unwrap_or(false)
        {
            variants.insert(name);
        }
    }

    assert!(
        !variants.is_empty(),
        "found no variants for enum {}; did it move?",
        enum_name
    );
    variants
}

#[test]
fn every_message_variant_has_a_reducer_arm() {
    let variants = enum_variants(&source("src/messages.rs"), "Message");
    let reducer = source("src/update.rs");

    let unhandled: Vec<&String> = variants
        .iter()
        .filter(|v| !reducer.contains(&format!("Message::{}", v)))
        .collect();

    assert!(
        unhandled.is_empty(),
        "Message variants with no arm in update.rs: {:?}",
        unhandled
    );
}

#[test]
fn every_command_variant_has_an_executor_branch() {
    let variants = enum_variants(&source("src/messages.rs"), "Command");
    let executors = source("src/command_executors.rs");

    let unhandled: Vec<&String> = variants
        .iter()
        .filter(|v| !executors.contains(&format!("Command::{}", v)))
        .collect();

    assert!(
        unhandled.is_empty(),
        "Command variants with no branch in command_executors.rs: {:?}",
        unhandled
    );
}
