use super::*;

#[test]
fn test_node_id_valid() {
    let id = NodeId::new(7);
    assert!(id.is_valid());
    assert_eq!(id.raw(), 7);
    assert_eq!(format!("{id:?}"), "NodeId(7)");
}

#[test]
fn test_node_id_default_is_invalid() {
    let id = NodeId::default();
    assert!(!id.is_valid());
    assert_eq!(format!("{id:?}"), "NodeId::INVALID");
}

#[test]
fn test_node_id_hash() {
    use std::collections::HashSet;
    let mut set = HashSet::new();
    set.insert(NodeId::new(1));
    set.insert(NodeId::new(1)); // duplicate
    set.insert(NodeId::new(2));
    assert_eq!(set.len(), 2);
}
