#![no_main]

use asdf_yaml::Node;
use libfuzzer_sys::fuzz_target;

// Biases inputs toward anchors, aliases and self-references, then walks the
// resulting graph to check every child id points into the arena.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 { return; }

    let s = String::from_utf8_lossy(data);

    let inputs = [
        format!("a: &A {s}\nb: *A\nseq: &S [1, 2, *A]\nseq_alias: *S\n"),
        format!("&R {{self: *R, v: {s}}}\n"),
        format!("&L [*L, {s}, *L]\n"),
        format!("x: &X !t {{k: {s}}}\ny: [*X, *X]\n"),
    ];

    for yaml in &inputs {
        let Ok(doc) = asdf_yaml::from_str(yaml) else { continue };
        let len = doc.len();
        for (_, node) in doc.arena().iter() {
            match node {
                Node::Sequence(items) => assert!(items.iter().all(|id| id.index() < len)),
                Node::Mapping(pairs) | Node::OrderedMapping(pairs) => {
                    assert!(pairs.iter().all(|(k, v)| k.index() < len && v.index() < len))
                }
                Node::Tagged { inner, .. } => assert!(inner.index() < len),
                Node::Scalar(_) => {}
            }
        }
    }
});
