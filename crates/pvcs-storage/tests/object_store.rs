//! Object store behaviour through the public API.

use proptest::prelude::*;
use pvcs_storage::{Commit, Object, ObjectId, ObjectStore, ObjectType, Timestamp, Tree};
use std::fs;
use tempfile::TempDir;

fn object_files(store: &ObjectStore) -> usize {
    fs::read_dir(store.dir()).unwrap().count()
}

#[test]
fn storing_identical_bytes_twice_writes_one_object() {
    let temp = TempDir::new().unwrap();
    let store = ObjectStore::init(temp.path().join("objects")).unwrap();

    let a = store.put_blob(b"duplicate me".to_vec()).unwrap();
    let b = store.put_blob(b"duplicate me".to_vec()).unwrap();

    assert_eq!(a, b);
    assert_eq!(object_files(&store), 1);
}

#[test]
fn blob_and_tree_with_identical_payload_hash_differently() {
    let temp = TempDir::new().unwrap();
    let store = ObjectStore::init(temp.path().join("objects")).unwrap();

    let mut tree = Tree::new();
    tree.insert("file.txt", ObjectId::from_bytes([5u8; 32])).unwrap();
    let payload = tree.encode();

    let tree_id = store.put(&tree.to_object()).unwrap();
    let blob_id = store.put_blob(payload).unwrap();

    assert_ne!(tree_id, blob_id);
    assert_eq!(object_files(&store), 2);
    assert_eq!(store.get(&tree_id).unwrap().object_type, ObjectType::Tree);
    assert_eq!(store.get(&blob_id).unwrap().object_type, ObjectType::Blob);
}

#[test]
fn commit_chain_reads_back() {
    let temp = TempDir::new().unwrap();
    let store = ObjectStore::init(temp.path().join("objects")).unwrap();

    let tree_id = store.put(&Tree::new().to_object()).unwrap();
    let root = Commit {
        tree: tree_id,
        parent: None,
        message: Some("root".to_string()),
        timestamp: Timestamp::from_millis(1),
    };
    let root_id = store.put(&root.to_object()).unwrap();
    let child = Commit {
        tree: tree_id,
        parent: Some(root_id),
        message: None,
        timestamp: Timestamp::from_millis(2),
    };
    let child_id = store.put(&child.to_object()).unwrap();

    let loaded = store.get_kind(&child_id, ObjectType::Commit).unwrap();
    let decoded = Commit::decode(&loaded.data).unwrap();
    assert_eq!(decoded, child);
    assert_eq!(decoded.parent, Some(root_id));
    assert_eq!(child.id(), child_id);
}

proptest! {
    #[test]
    fn get_returns_exact_bytes(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let temp = TempDir::new().unwrap();
        let store = ObjectStore::init(temp.path().join("objects")).unwrap();

        let id = store.put_blob(data.clone()).unwrap();
        let object = store.get(&id).unwrap();

        prop_assert_eq!(object.data.as_ref(), &data[..]);
        prop_assert_eq!(id, Object::blob(data).id);
    }

    #[test]
    fn tree_encoding_roundtrips(paths in proptest::collection::btree_set("[a-z]{1,8}(/[a-z]{1,8}){0,3}", 0..20)) {
        let mut tree = Tree::new();
        for (i, path) in paths.iter().enumerate() {
            tree.insert(path.clone(), ObjectId::from_bytes([i as u8; 32])).unwrap();
        }
        prop_assert_eq!(Tree::decode(&tree.encode()).unwrap(), tree);
    }
}
