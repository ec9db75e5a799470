//! Messaging with the sandboxed NFT display frame
//!
//! The page pushes loading state and metadata into the frame; the frame asks
//! the page to toggle the full-size image modal.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use surface_dispatch::{FrameChannel, FrameCommand, FrameError, FrameMessage, ListenerHandle, Store};

use crate::action::WalletAction;
use crate::state::{PageSlices, PageState, PageTree};
use crate::types::NftMetadata;

/// Origin of the untrusted NFT display frame.
pub const NFT_DISPLAY_ORIGIN: &str = "chrome-untrusted://nft-display";

/// Commands the page posts to the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "kebab-case")]
pub enum NftDisplayCommand {
    UpdateLoading(bool),
    UpdateNftMetadata(NftMetadata),
    UpdateNftMetadataError(Option<String>),
}

impl FrameCommand for NftDisplayCommand {
    const COMMANDS: &'static [&'static str] =
        &["update-loading", "update-nft-metadata", "update-nft-metadata-error"];
}

/// Commands the frame posts to the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "kebab-case")]
pub enum NftPageCommand {
    ToggleNftModal(bool),
}

impl FrameCommand for NftPageCommand {
    const COMMANDS: &'static [&'static str] = &["toggle-nft-modal"];
}

/// What the frame last received, to post only differences.
#[derive(Debug, Default, Clone, PartialEq)]
struct Posted {
    loading: Option<bool>,
    metadata: Option<NftMetadata>,
    error: Option<Option<String>>,
}

/// Page side of the NFT display channel.
#[derive(Debug, Clone)]
pub struct NftFrame {
    channel: FrameChannel,
}

impl Default for NftFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl NftFrame {
    pub fn new() -> Self {
        Self {
            channel: FrameChannel::new(NFT_DISPLAY_ORIGIN),
        }
    }

    /// Translate a message received from the frame into an action.
    ///
    /// Unknown commands yield `Ok(None)`.
    pub fn receive(&self, origin: &str, data: &str) -> Result<Option<WalletAction>, FrameError> {
        let command = self.channel.accept::<NftPageCommand>(origin, data)?;
        Ok(command.map(|NftPageCommand::ToggleNftModal(show)| WalletAction::ToggleNftModal(show)))
    }

    /// Messages bringing the frame up to date with `page`.
    fn sync(&self, page: &PageState, posted: &mut Posted) -> Vec<FrameMessage> {
        let mut commands = Vec::new();

        if posted.loading != Some(page.is_fetching_nft_metadata) {
            posted.loading = Some(page.is_fetching_nft_metadata);
            commands.push(NftDisplayCommand::UpdateLoading(page.is_fetching_nft_metadata));
        }
        if let Some(metadata) = &page.nft_metadata {
            if posted.metadata.as_ref() != Some(metadata) {
                posted.metadata = Some(metadata.clone());
                commands.push(NftDisplayCommand::UpdateNftMetadata(metadata.clone()));
            }
        }
        if posted.error.as_ref() != Some(&page.nft_metadata_error) {
            posted.error = Some(page.nft_metadata_error.clone());
            commands.push(NftDisplayCommand::UpdateNftMetadataError(page.nft_metadata_error.clone()));
        }

        commands
            .iter()
            .filter_map(|command| match self.channel.post(command) {
                Ok(message) => Some(message),
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to encode NFT frame command");
                    None
                }
            })
            .collect()
    }

    /// Post the current NFT state, then every change to it, through `post`.
    pub fn attach<P>(self, store: &Store<PageTree>, post: P) -> ListenerHandle
    where
        P: Fn(FrameMessage) + 'static,
    {
        let posted = Rc::new(RefCell::new(Posted::default()));
        for message in self.sync(&store.state().page, &mut posted.borrow_mut()) {
            post(message);
        }

        store.add_listener(move |change| {
            if !change.touches(PageSlices::PAGE) {
                return;
            }
            let messages = self.sync(&change.snapshot.page, &mut posted.borrow_mut());
            for message in messages {
                post(message);
            }
        })
    }
}
