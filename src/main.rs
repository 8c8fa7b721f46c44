#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs::File;
use std::process::exit;

use asdf_yaml::{BudgetReport, Error, Node, Options, from_reader_with_options};

fn report_budget(report: &BudgetReport) {
    println!("Budget report:\n{report:#?}");
}

/// Load an ASDF YAML tree and print what it is made of: node counts per kind,
/// the tags seen and the budget report. Can be used as a validator and to
/// estimate budget requirements. Single parameter is the file name.
fn main() {
    let path = match std::env::args().nth(1).ok_or(
        "Loads an ASDF YAML tree and prints a structural summary. \
        Expected a path to a YAML file as the first argument",
    ) {
        Ok(path) => path,
        Err(err) => {
            eprintln!("{err}");
            exit(1);
        }
    };

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Failed to read {path}: {err}");
            exit(2);
        }
    };

    let options = Options {
        budget_report: Some(report_budget),
        ..Options::default()
    };

    let doc = match from_reader_with_options(file, options) {
        Ok(doc) => doc,
        Err(Error::Io { cause }) => {
            eprintln!("Failed to read {path}: {cause}");
            exit(2);
        }
        Err(err) => {
            eprintln!("{path} invalid:\n{err}");
            exit(3);
        }
    };

    let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
    let mut tags: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, node) in doc.arena().iter() {
        *kinds.entry(node.kind()).or_default() += 1;
        match node {
            Node::Scalar(scalar) => *kinds.entry(scalar.kind()).or_default() += 1,
            Node::Tagged { tag, .. } => *tags.entry(tag.as_str()).or_default() += 1,
            _ => {}
        }
    }

    println!("{path}: {} nodes, root is {}", doc.len(), doc.root_ref().untagged().node().kind());
    for (kind, count) in &kinds {
        println!("  {kind:<16} {count}");
    }
    if !tags.is_empty() {
        println!("Tags:");
        for (tag, count) in &tags {
            println!("  {tag} ({count})");
        }
    }
}
