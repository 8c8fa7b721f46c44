use asdf_yaml::{Error, Node, from_str};
use indoc::indoc;

#[test]
fn omap_preserves_order() {
    let doc = from_str(indoc! {"
        !!omap
        - z: 1
        - a: 2
        - m: 3
    "})
    .unwrap();
    let root = doc.root_ref();
    assert!(matches!(root.node(), Node::OrderedMapping(_)));
    let entries: Vec<_> = root
        .entries()
        .map(|(k, v)| (k.as_str().unwrap(), v.as_i64().unwrap()))
        .collect();
    assert_eq!(entries, [("z", 1), ("a", 2), ("m", 3)]);
}

#[test]
fn omap_is_not_tagged() {
    let doc = from_str("v: !!omap [{a: 1}, {b: 2}]\n").unwrap();
    let v = doc.root_ref().get("v").unwrap();
    assert_eq!(v.tag(), None);
    assert_eq!(v.len(), 2);
    assert_eq!(v.get("b").unwrap().as_i64(), Some(2));
}

#[test]
fn omap_with_two_keys_in_one_entry_fails() {
    let err = from_str(indoc! {"
        !!omap
        - a: 1
          c: 3
        - b: 2
    "})
    .unwrap_err();
    assert!(matches!(err, Error::Unexpected { .. }), "{err:?}");
}

#[test]
fn omap_of_scalars_fails() {
    let err = from_str("!!omap [a, b]\n").unwrap_err();
    assert!(
        matches!(err, Error::Unexpected { found: "scalar", .. }),
        "{err:?}"
    );
}

#[test]
fn omap_with_empty_entry_fails() {
    let err = from_str("!!omap [{}]\n").unwrap_err();
    assert!(matches!(err, Error::Unexpected { .. }), "{err:?}");
}

#[test]
fn empty_omap() {
    let doc = from_str("!!omap []\n").unwrap();
    assert!(matches!(doc.root_ref().node(), Node::OrderedMapping(v) if v.is_empty()));
}

#[test]
fn anchored_omap_can_be_aliased() {
    let doc = from_str(indoc! {"
        first: &o !!omap
          - k: v
        second: *o
    "})
    .unwrap();
    let root = doc.root_ref();
    assert!(root.get("first").unwrap().same_node(&root.get("second").unwrap()));
}

#[test]
fn omap_values_may_be_containers() {
    let doc = from_str(indoc! {"
        !!omap
        - shape: [2, 3]
        - meta: {unit: m}
    "})
    .unwrap();
    let root = doc.root_ref();
    assert_eq!(root.get("shape").unwrap().len(), 2);
    assert_eq!(root.get("meta").unwrap().get("unit").unwrap().as_str(), Some("m"));
}
