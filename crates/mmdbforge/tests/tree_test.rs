// Behavioral tests for the writer tree: insertion, shadowing, reserved and
// aliased ranges, and the finalize pass.

use mmdbforge::validation::validate_tree;
use mmdbforge::{
    reserved_networks, DataValue, IpVersion, Network, Record, Tree, TreeOptions,
};
use std::net::IpAddr;

fn addr(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn network(s: &str) -> Network {
    s.parse().unwrap()
}

fn v4_tree() -> Tree {
    Tree::new(TreeOptions {
        ip_version: IpVersion::V4,
        ipv4_aliasing: false,
        reserved_networks: Vec::new(),
    })
    .unwrap()
}

fn data(s: &str) -> Record {
    Record::Data(DataValue::from(s))
}

#[test]
fn test_single_network_lookup() {
    let mut tree = v4_tree();
    tree.insert(&network("1.1.1.0/24"), DataValue::from("A"))
        .unwrap();

    let (depth, record) = tree.get(addr("1.1.1.5")).unwrap();
    assert_eq!(depth, 24);
    assert_eq!(record, &data("A"));

    let (_, record) = tree.get(addr("2.0.0.0")).unwrap();
    assert_eq!(record, &Record::Empty);
}

#[test]
fn test_more_specific_network_shadows_broader() {
    let mut tree = v4_tree();
    tree.insert(&network("1.1.0.0/16"), DataValue::from("A"))
        .unwrap();
    tree.insert(&network("1.1.1.0/24"), DataValue::from("B"))
        .unwrap();

    let (_, record) = tree.get(addr("1.1.2.5")).unwrap();
    assert_eq!(record, &data("A"));
    let (depth, record) = tree.get(addr("1.1.1.5")).unwrap();
    assert_eq!(depth, 24);
    assert_eq!(record, &data("B"));

    tree.finalize(0);

    // The broader network's subtree needs exactly one point where both
    // records hold (different) data: the bit where /24 splits off.
    let mut data_pairs = 0;
    for node in tree.iter() {
        if let [Record::Data(left), Record::Data(right)] = node.records() {
            data_pairs += 1;
            assert_ne!(left, right);
        }
    }
    assert_eq!(data_pairs, 1);
}

#[test]
fn test_identical_reinsert_does_not_grow_the_tree() {
    let mut tree = v4_tree();
    tree.insert(&network("1.1.1.0/24"), DataValue::from("A"))
        .unwrap();
    let first = tree.finalize(0);

    tree.insert_with(&network("1.1.1.0/24"), |existing| Ok(existing))
        .unwrap();
    let second = tree.finalize(0);
    assert_eq!(first, second);
}

#[test]
fn test_reserved_network_rejects_and_survives() {
    let mut tree = Tree::new(TreeOptions {
        ip_version: IpVersion::V4,
        ipv4_aliasing: false,
        reserved_networks: vec![network("10.0.0.0/8")],
    })
    .unwrap();

    let err = tree
        .insert(&network("10.1.0.0/16"), DataValue::from("x"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "attempt to insert 10.1.0.0/16, which is in a reserved network"
    );

    tree.insert(&network("0.0.0.0/0"), DataValue::from("X"))
        .unwrap();
    let (_, record) = tree.get(addr("10.0.0.1")).unwrap();
    assert_eq!(record, &Record::Reserved);
    let (_, record) = tree.get(addr("11.0.0.1")).unwrap();
    assert_eq!(record, &data("X"));
}

#[test]
fn test_longest_prefix_wins_after_many_inserts() {
    let mut tree = v4_tree();
    tree.insert(&network("0.0.0.0/0"), DataValue::from("default"))
        .unwrap();
    tree.insert(&network("5.0.0.0/8"), DataValue::from("eight"))
        .unwrap();
    tree.insert(&network("5.5.0.0/16"), DataValue::from("sixteen"))
        .unwrap();
    tree.insert(&network("5.5.5.0/24"), DataValue::from("twentyfour"))
        .unwrap();

    assert_eq!(tree.get(addr("9.9.9.9")).unwrap().1, &data("default"));
    assert_eq!(tree.get(addr("5.9.9.9")).unwrap().1, &data("eight"));
    assert_eq!(tree.get(addr("5.5.9.9")).unwrap().1, &data("sixteen"));
    assert_eq!(tree.get(addr("5.5.5.9")).unwrap().1, &data("twentyfour"));
}

#[test]
fn test_finalize_numbering_is_contiguous_from_base() {
    let mut tree = v4_tree();
    tree.insert(&network("1.1.0.0/16"), DataValue::from("A"))
        .unwrap();
    tree.insert(&network("1.1.1.0/24"), DataValue::from("B"))
        .unwrap();
    tree.insert(&network("9.0.0.0/8"), DataValue::from("C"))
        .unwrap();

    let count = tree.finalize(5);
    assert_eq!(tree.node_count(), count);

    let numbers: Vec<u32> = tree.iter().map(|n| n.node_num().unwrap()).collect();
    let expected: Vec<u32> = (5..5 + count).collect();
    assert_eq!(numbers, expected);
}

#[test]
fn test_finalize_leaves_no_redundant_siblings() {
    let mut tree = v4_tree();
    // Adjacent /25s with the same value collapse back into one /24 shape.
    tree.insert(&network("7.7.7.0/25"), DataValue::from("same"))
        .unwrap();
    tree.insert(&network("7.7.7.128/25"), DataValue::from("same"))
        .unwrap();
    tree.insert(&network("8.0.0.0/8"), DataValue::from("other"))
        .unwrap();
    let count = tree.finalize(0);

    for node in tree.iter() {
        match node.records() {
            [Record::Empty, Record::Empty] => {
                // Only legal for a root that is the sole survivor.
                assert_eq!(count, 1);
            }
            [Record::Data(left), Record::Data(right)] => assert_ne!(left, right),
            _ => {}
        }
    }

    // The /25 pair merged: looking up either half finds the value at /24
    // depth or shallower.
    let (depth, record) = tree.get(addr("7.7.7.200")).unwrap();
    assert_eq!(record, &data("same"));
    assert!(depth <= 24);
}

#[test]
fn test_merge_failure_aborts_insert() {
    let mut tree = v4_tree();
    let err = tree
        .insert_with(&network("1.0.0.0/8"), |_| Err("no thanks".to_string()))
        .unwrap_err();
    assert_eq!(err.to_string(), "no thanks");
}

#[test]
fn test_seeded_v6_tree_validates_and_finalizes() {
    let mut tree = Tree::new(TreeOptions {
        ip_version: IpVersion::V6,
        ipv4_aliasing: true,
        reserved_networks: reserved_networks(IpVersion::V6),
    })
    .unwrap();

    tree.insert(&network("1.2.3.0/24"), DataValue::from("v4 data"))
        .unwrap();
    tree.insert(&network("2400:cb00::/32"), DataValue::from("v6 data"))
        .unwrap();

    let result = validate_tree(tree.prefix_tree());
    assert!(result.is_valid(), "errors: {:?}", result.errors);

    let count = tree.finalize(0);
    assert!(count > 96, "expected at least the IPv4 spine, got {}", count);

    let result = validate_tree(tree.prefix_tree());
    assert!(result.is_valid(), "errors: {:?}", result.errors);
    assert!(result.stats.alias_records >= 3);

    // Every spelling of the IPv4 address still resolves after pruning.
    for spelling in ["1.2.3.4", "::ffff:1.2.3.4", "2002:102:304::"] {
        let (_, record) = tree.get(addr(spelling)).unwrap();
        assert_eq!(record, &data("v4 data"), "spelling {}", spelling);
    }
    let (_, record) = tree.get(addr("2400:cb00::1")).unwrap();
    assert_eq!(record, &data("v6 data"));
}

#[test]
fn test_broad_insert_covers_gaps_between_existing_networks() {
    let mut tree = v4_tree();
    tree.insert(&network("128.0.0.0/2"), DataValue::from("old"))
        .unwrap();
    // Broader insert reaches both the covered subtree and the empty rest.
    tree.insert(&network("128.0.0.0/1"), DataValue::from("new"))
        .unwrap();

    assert_eq!(tree.get(addr("129.0.0.1")).unwrap().1, &data("new"));
    assert_eq!(tree.get(addr("200.0.0.1")).unwrap().1, &data("new"));
    assert_eq!(tree.get(addr("1.0.0.1")).unwrap().1, &Record::Empty);

    // After finalize the right half carries one value everywhere, so the
    // whole subtree collapses into the root's record.
    let count = tree.finalize(0);
    assert_eq!(count, 1);
    assert_eq!(tree.get(addr("200.0.0.1")).unwrap(), (1, &data("new")));
}
