//! Wallet page surface
//!
//! The full-tab wallet: onboarding, backup, portfolio and NFT details.

use surface_dispatch::{DispatchResult, RemoteProxy, Storage, SurfaceConfig, SurfaceError};

use crate::action::WalletAction;
use crate::backend::WalletFactory;
use crate::effect::WalletEffect;
use crate::reducer::{clear_error_of, reduce_wallet, set};
use crate::state::{PageSlices, PageTree};
use crate::surface::{build, WalletRuntime};

/// Operations whose failures belong to the page rather than the wallet.
pub const PAGE_OPERATIONS: &[&str] = &["get_recovery_phrase", "notify_backup_complete"];

pub type PageRuntime = WalletRuntime<PageTree>;

fn initial_actions() -> Vec<WalletAction> {
    vec![
        WalletAction::AccountsFetch,
        WalletAction::TransactionsFetch,
        WalletAction::BalanceRefresh,
    ]
}

fn is_requested(requested: &Option<(String, String)>, contract_address: &str, token_id: &str) -> bool {
    requested
        .as_ref()
        .is_some_and(|(contract, token)| contract == contract_address && token == token_id)
}

pub fn reduce_page(state: &mut PageTree, action: WalletAction) -> DispatchResult<PageSlices, WalletEffect> {
    let page = &mut state.page;
    let touched = |changed: bool| {
        if changed {
            DispatchResult::changed(PageSlices::PAGE)
        } else {
            DispatchResult::unchanged()
        }
    };

    match action {
        WalletAction::AgreeToTerms => touched(set(&mut page.wallet_terms_acknowledged, true)),
        WalletAction::SetRestoring(restoring) => touched(set(&mut page.show_is_restoring, restoring)),
        WalletAction::SetSelectedTimeline(timeline) => {
            touched(set(&mut page.selected_timeline, timeline))
        }
        WalletAction::SetAutoPin(enabled) => touched(set(&mut page.is_auto_pin_enabled, enabled)),

        WalletAction::AcknowledgeBackup => DispatchResult::effect(WalletEffect::NotifyBackupComplete),

        WalletAction::RevealRecoveryPhrase { password } => {
            DispatchResult::effect(WalletEffect::FetchRecoveryPhrase { password })
        }
        WalletAction::RecoveryPhraseDidLoad(phrase) => {
            let cleared = clear_error_of(&mut page.last_action_error, "get_recovery_phrase");
            let revealed = set(&mut page.recovery_phrase, Some(phrase));
            touched(cleared || revealed)
        }
        WalletAction::HideRecoveryPhrase => touched(set(&mut page.recovery_phrase, None)),

        WalletAction::NftMetadataFetch {
            contract_address,
            token_id,
        } => {
            let fetching = set(&mut page.is_fetching_nft_metadata, true);
            let cleared = set(&mut page.nft_metadata_error, None);
            let requested = set(
                &mut page.requested_nft,
                Some((contract_address.clone(), token_id.clone())),
            );
            touched(fetching || cleared || requested).with(WalletEffect::FetchNftMetadata {
                contract_address,
                token_id,
            })
        }

        // Answers a request the page has since moved on from
        WalletAction::NftMetadataDidLoad {
            ref contract_address,
            ref token_id,
            ..
        }
        | WalletAction::NftMetadataDidFail {
            ref contract_address,
            ref token_id,
            ..
        } if !is_requested(&page.requested_nft, contract_address, token_id) => {
            tracing::debug!(%contract_address, %token_id, "Dropping stale NFT metadata result");
            DispatchResult::unchanged()
        }

        WalletAction::NftMetadataDidLoad { metadata, .. } => {
            let fetching = set(&mut page.is_fetching_nft_metadata, false);
            let cleared = set(&mut page.nft_metadata_error, None);
            let loaded = set(&mut page.nft_metadata, Some(metadata));
            touched(fetching || cleared || loaded)
        }
        WalletAction::NftMetadataDidFail { error, .. } => {
            let fetching = set(&mut page.is_fetching_nft_metadata, false);
            let recorded = set(&mut page.nft_metadata_error, Some(error.message));
            touched(fetching || recorded)
        }
        WalletAction::ToggleNftModal(show) => touched(set(&mut page.show_nft_modal, show)),

        WalletAction::WalletBackedUp => {
            // The phrase is no longer needed once backed up
            let hidden = set(&mut page.recovery_phrase, None);
            let setup = set(&mut page.setup_still_in_progress, false);
            let result = reduce_wallet(state, WalletAction::WalletBackedUp);
            if hidden || setup {
                result.mark_changed(PageSlices::PAGE)
            } else {
                result
            }
        }

        WalletAction::AccountsDidLoad(accounts) if accounts.is_empty() => {
            let setup = set(&mut page.setup_still_in_progress, true);
            let result = reduce_wallet(state, WalletAction::AccountsDidLoad(accounts));
            if setup {
                result.mark_changed(PageSlices::PAGE)
            } else {
                result
            }
        }

        WalletAction::OperationDidFail(error) if PAGE_OPERATIONS.contains(&error.operation.as_str()) => {
            touched(set(&mut page.last_action_error, Some(error)))
        }

        WalletAction::OperationDidComplete { operation } if PAGE_OPERATIONS.contains(&operation) => {
            let matches = page
                .last_action_error
                .as_ref()
                .is_some_and(|error| error.operation == operation);
            touched(matches && set(&mut page.last_action_error, None))
        }

        other => reduce_wallet(state, other),
    }
}

/// Build and mount the page surface.
///
/// Requires a tokio runtime: mounting issues the initial remote calls.
pub fn mount_page<F: WalletFactory>(
    config: &SurfaceConfig,
    proxy: &mut RemoteProxy<F>,
    storage: impl Storage + 'static,
) -> Result<PageRuntime, SurfaceError> {
    let mut runtime = build(config, proxy, storage, reduce_page);
    runtime.mount(initial_actions())?;
    Ok(runtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NftMetadata, RecoveryPhrase, Timeline};
    use surface_dispatch::{OperationError, RemoteError};

    #[test]
    fn test_local_page_settings() {
        let mut state = PageTree::default();
        assert_eq!(
            reduce_page(&mut state, WalletAction::SetSelectedTimeline(Timeline::OneWeek)).changed,
            PageSlices::PAGE
        );
        assert!(!reduce_page(&mut state, WalletAction::SetSelectedTimeline(Timeline::OneWeek)).is_changed());
        reduce_page(&mut state, WalletAction::AgreeToTerms);
        assert!(state.page.wallet_terms_acknowledged);
    }

    #[test]
    fn test_nft_metadata_flow() {
        let mut state = PageTree::default();
        let result = reduce_page(
            &mut state,
            WalletAction::NftMetadataFetch {
                contract_address: "0xnft".into(),
                token_id: "1".into(),
            },
        );
        assert!(state.page.is_fetching_nft_metadata);
        assert_eq!(result.effects.len(), 1);

        let error = OperationError::remote("get_nft_metadata", &RemoteError::failed(404, "not found"));
        reduce_page(
            &mut state,
            WalletAction::NftMetadataDidFail {
                contract_address: "0xnft".into(),
                token_id: "1".into(),
                error,
            },
        );
        assert!(!state.page.is_fetching_nft_metadata);
        assert_eq!(
            state.page.nft_metadata_error.as_deref(),
            Some("request failed (404): not found")
        );

        let metadata = NftMetadata {
            name: "Punk".into(),
            ..Default::default()
        };
        reduce_page(
            &mut state,
            WalletAction::NftMetadataDidLoad {
                contract_address: "0xnft".into(),
                token_id: "1".into(),
                metadata: metadata.clone(),
            },
        );
        assert_eq!(state.page.nft_metadata, Some(metadata));
        assert_eq!(state.page.nft_metadata_error, None);
    }

    #[test]
    fn test_superseded_nft_result_is_dropped() {
        let mut state = PageTree::default();
        let fetch = |token_id: &str| WalletAction::NftMetadataFetch {
            contract_address: "0xnft".into(),
            token_id: token_id.into(),
        };
        reduce_page(&mut state, fetch("1"));
        reduce_page(&mut state, fetch("2"));

        let current = NftMetadata {
            token_id: "2".into(),
            ..Default::default()
        };
        reduce_page(
            &mut state,
            WalletAction::NftMetadataDidLoad {
                contract_address: "0xnft".into(),
                token_id: "2".into(),
                metadata: current.clone(),
            },
        );

        let late = reduce_page(
            &mut state,
            WalletAction::NftMetadataDidLoad {
                contract_address: "0xnft".into(),
                token_id: "1".into(),
                metadata: NftMetadata {
                    token_id: "1".into(),
                    ..Default::default()
                },
            },
        );
        assert!(!late.is_changed());
        assert_eq!(state.page.nft_metadata, Some(current));

        let error = OperationError::remote("get_nft_metadata", &RemoteError::failed(500, "late"));
        let late = reduce_page(
            &mut state,
            WalletAction::NftMetadataDidFail {
                contract_address: "0xnft".into(),
                token_id: "1".into(),
                error,
            },
        );
        assert!(!late.is_changed());
        assert_eq!(state.page.nft_metadata_error, None);
    }

    #[test]
    fn test_revealed_phrase_clears_password_error() {
        let mut state = PageTree::default();
        let error = OperationError::remote("get_recovery_phrase", &RemoteError::failed(1, "incorrect password"));
        reduce_page(&mut state, WalletAction::OperationDidFail(error));
        assert!(state.page.last_action_error.is_some());

        reduce_page(
            &mut state,
            WalletAction::RecoveryPhraseDidLoad(RecoveryPhrase::new("a b c")),
        );
        assert_eq!(state.page.last_action_error, None);
        assert!(state.page.recovery_phrase.is_some());
    }

    #[test]
    fn test_backup_hides_recovery_phrase() {
        let mut state = PageTree::default();
        reduce_page(
            &mut state,
            WalletAction::RecoveryPhraseDidLoad(RecoveryPhrase::new("a b c")),
        );
        assert!(state.page.recovery_phrase.is_some());

        let result = reduce_page(&mut state, WalletAction::WalletBackedUp);
        assert_eq!(result.changed, PageSlices::PAGE | PageSlices::WALLET);
        assert!(state.page.recovery_phrase.is_none());
        assert!(state.wallet.is_wallet_backed_up);
    }
}
