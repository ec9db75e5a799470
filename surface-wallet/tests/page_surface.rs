//! Wallet page against the in-memory backend

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{config, connect, settle};
use serde_json::Value;
use surface_dispatch::{FrameMessage, MemoryStorage};
use surface_wallet::{
    mount_page, MockWallet, NftFrame, NftMetadata, Timeline, WalletAction, NFT_DISPLAY_ORIGIN,
};

fn commands(messages: &[FrameMessage]) -> Vec<String> {
    messages
        .iter()
        .map(|m| {
            let value: Value = serde_json::from_str(&m.data).unwrap();
            value["command"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_reveal_then_backup_hides_phrase() {
    let wallet = MockWallet::sample();
    let mut proxy = connect(&wallet);
    let mut page = mount_page(&config("wallet-page"), &mut proxy, MemoryStorage::new()).unwrap();
    settle(&mut page).await;
    assert!(!page.state().wallet.is_wallet_backed_up);

    page.intent(WalletAction::RevealRecoveryPhrase {
        password: "password".into(),
    })
    .unwrap();
    settle(&mut page).await;
    let phrase = page.state().page.recovery_phrase.clone().unwrap();
    assert_eq!(phrase.word_count(), 12);

    page.intent(WalletAction::AcknowledgeBackup).unwrap();
    settle(&mut page).await;

    let state = page.state();
    assert_eq!(wallet.calls("notify_backup_complete"), 1);
    assert!(state.wallet.is_wallet_backed_up);
    assert!(state.page.recovery_phrase.is_none());
    assert_eq!(state.page.last_action_error, None);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_password_error_stays_on_page() {
    let wallet = MockWallet::sample();
    let mut proxy = connect(&wallet);
    let mut page = mount_page(&config("wallet-page"), &mut proxy, MemoryStorage::new()).unwrap();
    settle(&mut page).await;

    page.intent(WalletAction::RevealRecoveryPhrase {
        password: "hunter2".into(),
    })
    .unwrap();
    settle(&mut page).await;

    let state = page.state();
    assert!(state.page.recovery_phrase.is_none());
    let error = state.page.last_action_error.as_ref().unwrap();
    assert_eq!(error.operation, "get_recovery_phrase");
    assert_eq!(state.wallet.last_action_error, None);
}

#[tokio::test(start_paused = true)]
async fn test_nft_frame_follows_metadata_fetch() {
    let wallet = MockWallet::sample();
    wallet.add_nft(NftMetadata {
        contract_address: "0xnft".into(),
        token_id: "1".into(),
        name: "Punk #1".into(),
        ..Default::default()
    });
    let mut proxy = connect(&wallet);
    let mut page = mount_page(&config("wallet-page"), &mut proxy, MemoryStorage::new()).unwrap();
    settle(&mut page).await;

    let sent: Rc<RefCell<Vec<FrameMessage>>> = Rc::default();
    let sink = sent.clone();
    let listener = NftFrame::new().attach(page.store(), move |m| sink.borrow_mut().push(m));
    sent.borrow_mut().clear();

    page.intent(WalletAction::NftMetadataFetch {
        contract_address: "0xnft".into(),
        token_id: "1".into(),
    })
    .unwrap();
    settle(&mut page).await;

    assert_eq!(
        commands(&sent.borrow()),
        vec!["update-loading", "update-loading", "update-nft-metadata"]
    );
    assert!(sent.borrow().iter().all(|m| m.target_origin == NFT_DISPLAY_ORIGIN));
    assert_eq!(
        page.state().page.nft_metadata.as_ref().map(|m| m.name.as_str()),
        Some("Punk #1")
    );

    // The frame asks for the full-size view
    let action = NftFrame::new()
        .receive(NFT_DISPLAY_ORIGIN, r#"{"command":"toggle-nft-modal","payload":true}"#)
        .unwrap()
        .unwrap();
    page.intent(action).unwrap();
    assert!(page.state().page.show_nft_modal);

    listener.unsubscribe();
    page.teardown().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_missing_nft_records_error() {
    let wallet = MockWallet::sample();
    let mut proxy = connect(&wallet);
    let mut page = mount_page(&config("wallet-page"), &mut proxy, MemoryStorage::new()).unwrap();
    settle(&mut page).await;

    page.intent(WalletAction::NftMetadataFetch {
        contract_address: "0xnft".into(),
        token_id: "404".into(),
    })
    .unwrap();
    settle(&mut page).await;

    let state = page.state();
    assert!(!state.page.is_fetching_nft_metadata);
    assert_eq!(
        state.page.nft_metadata_error.as_deref(),
        Some("request failed (404): token not found")
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_wallet_keeps_setup_in_progress() {
    let wallet = MockWallet::new();
    let mut proxy = connect(&wallet);
    let mut page = mount_page(&config("wallet-page"), &mut proxy, MemoryStorage::new()).unwrap();
    settle(&mut page).await;

    let state = page.state();
    assert!(state.page.setup_still_in_progress);
    assert!(!state.wallet.is_wallet_created);

    page.intent(WalletAction::SetSelectedTimeline(Timeline::OneYear)).unwrap();
    assert_eq!(page.state().page.selected_timeline, Timeline::OneYear);
}
