//! Tests for #[derive(Slice)] and #[derive(StateTree)]

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};
use surface_dispatch::persist::FallbackReason;
use surface_dispatch::{
    merge, HasSlice, MemoryStorage, Persist, PersistTree, Persistor, Slice, SlicePatch, StateTree,
    Storage, Store,
};

#[derive(surface_dispatch::Slice, Clone, Debug, Default, PartialEq)]
#[slice(name = "account")]
struct Account {
    #[slice(persist)]
    balance: u64,
    secret: String,
}

#[derive(surface_dispatch::Slice, Clone, Debug, Default, PartialEq)]
#[slice(name = "view")]
struct View {
    scroll: usize,
    expanded: bool,
}

surface_dispatch::bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct Slices: u8 {
        const ACCOUNT = 1 << 0;
        const VIEW = 1 << 1;
    }
}

#[derive(surface_dispatch::StateTree, Clone, Debug, Default)]
#[tree(changes = "Slices", persist)]
struct Tree {
    #[tree(flag = "ACCOUNT")]
    account: Account,
    #[tree(flag = "VIEW")]
    view: View,
}

#[test]
fn test_slice_name_and_allow_list() {
    assert_eq!(Account::NAME, "account");
    assert_eq!(Account::ALLOW_LIST, &["balance"]);
    assert!(View::ALLOW_LIST.is_empty());
}

#[test]
fn test_patch_is_empty() {
    assert!(AccountPatch::default().is_empty());
    let patch = AccountPatch {
        secret: Some("x".into()),
        ..Default::default()
    };
    assert!(!patch.is_empty());
}

#[test]
fn test_merge_sets_exactly_present_fields() {
    let mut account = Account {
        balance: 5,
        secret: "keep".into(),
    };

    let changed = account.merge(AccountPatch {
        balance: Some(7),
        ..Default::default()
    });
    assert!(changed);
    assert_eq!(account.balance, 7);
    assert_eq!(account.secret, "keep");

    // Same value again is not a change
    assert!(!account.merge(AccountPatch {
        balance: Some(7),
        ..Default::default()
    }));
}

#[test]
fn test_dehydrate_drops_fields_outside_allow_list() {
    let account = Account {
        balance: 10,
        secret: "x".into(),
    };
    assert_eq!(Value::Object(account.dehydrate()), json!({ "balance": 10 }));
}

#[test]
fn test_rehydrate_resets_unlisted_fields() {
    let restored = Account::rehydrate(&json!({ "balance": 10, "secret": "leaked" }));
    assert_eq!(
        restored.value,
        Account {
            balance: 10,
            secret: String::new(),
        }
    );
    assert!(restored.fallbacks.is_empty());
}

#[test]
fn test_rehydrate_invalid_field_falls_back() {
    let restored = Account::rehydrate(&json!({ "balance": "lots" }));
    assert_eq!(restored.value, Account::default());
    assert_eq!(restored.fallbacks.len(), 1);
    assert_eq!(restored.fallbacks[0].field, "balance");
    assert!(matches!(
        restored.fallbacks[0].reason,
        FallbackReason::Invalid(_)
    ));
}

#[test]
fn test_state_tree_flags() {
    assert_eq!(<Tree as HasSlice<Account>>::FLAG, Slices::ACCOUNT);
    assert_eq!(<Tree as HasSlice<View>>::FLAG, Slices::VIEW);
    // Only slices with a non-empty allow-list are persisted
    assert_eq!(Tree::persisted_slices(), Slices::ACCOUNT);
}

#[test]
fn test_tree_blob_omits_unpersisted_slices() {
    let tree = Tree {
        account: Account {
            balance: 3,
            secret: "s".into(),
        },
        view: View {
            scroll: 9,
            expanded: true,
        },
    };
    assert_eq!(
        Value::Object(tree.dehydrate()),
        json!({ "account": { "balance": 3 } })
    );
}

#[test]
fn test_set_state_merge_reports_touched_slices() {
    let store = Store::new(Tree::default());
    let seen: Rc<RefCell<Vec<Slices>>> = Rc::default();
    let s = seen.clone();
    let _handle = store.add_listener(move |change| s.borrow_mut().push(change.changed));

    let changed = store.set_state(merge(ViewPatch {
        scroll: Some(4),
        ..Default::default()
    }));
    assert_eq!(changed, Slices::VIEW);

    // No-op patch: no notification
    let changed = store.set_state(merge(ViewPatch {
        scroll: Some(4),
        ..Default::default()
    }));
    assert_eq!(changed, Slices::empty());

    store.set_state(merge(AccountPatch {
        secret: Some("x".into()),
        ..Default::default()
    }));

    assert_eq!(*seen.borrow(), vec![Slices::VIEW, Slices::ACCOUNT]);
    assert_eq!(store.state().view.scroll, 4);
    assert_eq!(store.state().account.secret, "x");
}

#[test]
fn test_merge_sequence_matches_sequential_field_writes() {
    let patches = vec![
        AccountPatch {
            balance: Some(1),
            ..Default::default()
        },
        AccountPatch {
            secret: Some("a".into()),
            ..Default::default()
        },
        AccountPatch {
            balance: Some(2),
            secret: Some("b".into()),
        },
        AccountPatch::default(),
    ];

    let store = Store::new(Tree::default());
    let mut expected = Account::default();
    for patch in patches {
        if let Some(balance) = patch.balance {
            expected.balance = balance;
        }
        if let Some(secret) = patch.secret.clone() {
            expected.secret = secret;
        }
        store.set_state(merge(patch));
        assert_eq!(store.state().account, expected);
    }
}

#[test]
fn test_persistor_round_trip_with_derived_tree() {
    let storage = MemoryStorage::new();
    let persistor = Rc::new(Persistor::<Tree>::new("persist:test", storage.clone()));
    let store = Store::new(persistor.rehydrate().value);
    let _listener = persistor.attach(&store);

    store.set_state(merge(AccountPatch {
        balance: Some(42),
        secret: Some("never stored".into()),
    }));
    store.set_state(merge(ViewPatch {
        expanded: Some(true),
        ..Default::default()
    }));

    let raw = storage.load("persist:test").unwrap().unwrap();
    let stored: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored, json!({ "account": { "balance": 42 } }));

    let restored = Persistor::<Tree>::new("persist:test", storage).rehydrate().value;
    assert_eq!(restored.account.balance, 42);
    assert_eq!(restored.account.secret, "");
    assert_eq!(restored.view, View::default());
}

#[test]
fn test_tree_implements_state_tree() {
    fn assert_tree<T: StateTree<Changes = Slices>>() {}
    assert_tree::<Tree>();
}
