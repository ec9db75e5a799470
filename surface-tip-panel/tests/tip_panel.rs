//! Tip panel against the in-memory host

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use surface_dispatch::{ErrorKind, Phase, RemoteError, RemoteProxy, SurfaceConfig};
use surface_tip_panel::{
    mount_tip_panel, CreatorBanner, CreatorWallet, ExternalWalletProvider, MockTipPanel,
    MockTipPanelFactory, RewardsUser, TipFormStatus, TipPanelAction, TipPanelEvent, TipPanelRuntime,
    TipPanelSlices,
};

async fn settle(runtime: &mut TipPanelRuntime) -> usize {
    let mut dispatched = 0;
    while let Ok(Some(_)) = tokio::time::timeout(Duration::from_millis(50), runtime.next()).await {
        dispatched += 1;
    }
    dispatched
}

fn mount(panel: &MockTipPanel) -> TipPanelRuntime {
    let mut proxy = RemoteProxy::connect(MockTipPanelFactory::new(panel.clone()));
    mount_tip_panel(&SurfaceConfig::named("tip-panel"), &mut proxy).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_mount_shows_ui_once() {
    let host = MockTipPanel::new();
    let mut panel = mount(&host);
    assert_eq!(panel.phase(), Phase::Ready);
    settle(&mut panel).await;
    assert_eq!(host.show_ui_calls(), 1);

    panel.intent(TipPanelAction::InitialRender).unwrap();
    settle(&mut panel).await;
    assert_eq!(host.show_ui_calls(), 1);
    assert_eq!(panel.state().tip_panel.last_action_error, None);
}

#[tokio::test(start_paused = true)]
async fn test_pushed_events_fill_the_form() {
    let host = MockTipPanel::new();
    let mut panel = mount(&host);
    settle(&mut panel).await;
    assert!(panel.state().tip_panel.loading);

    let notified = Rc::new(Cell::new(0));
    let counter = notified.clone();
    let _listener = panel.store().add_listener(move |change| {
        if change.touches(TipPanelSlices::TIP_PANEL) {
            counter.set(counter.get() + 1);
        }
    });

    assert!(host.push(TipPanelEvent::CreatorLoaded {
        banner: CreatorBanner {
            title: "Creator".into(),
            amounts: vec![3.0],
            ..Default::default()
        },
        wallets: vec![CreatorWallet {
            provider: ExternalWalletProvider::Gemini,
            address: "creator".into(),
        }],
    }));
    assert!(host.push(TipPanelEvent::RewardsUserChanged(RewardsUser {
        balance: 12.0,
        wallet_provider: Some(ExternalWalletProvider::Gemini),
        wallet_authorized: true,
    })));
    // Same value again does not notify
    assert!(host.push(TipPanelEvent::MonthlyContributionChanged(false)));
    settle(&mut panel).await;

    let state = panel.state();
    assert!(!state.tip_panel.loading);
    assert_eq!(state.tip_panel.amount_options(), &[3.0]);
    assert_eq!(state.tip_panel.form_status(), TipFormStatus::Ready);
    assert_eq!(notified.get(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_host_records_error() {
    let host = MockTipPanel::new();
    host.refuse_bind(true);
    let mut panel = mount(&host);
    settle(&mut panel).await;

    assert_eq!(host.show_ui_calls(), 0);
    let state = panel.state();
    let error = state.tip_panel.last_action_error.as_ref().unwrap();
    assert_eq!(error.operation, "show_ui");
    assert_eq!(error.kind, ErrorKind::BackendUnavailable);
}

#[tokio::test(start_paused = true)]
async fn test_failed_show_ui_is_recorded() {
    let host = MockTipPanel::new();
    host.fail(RemoteError::failed(-1, "no browser"));
    let mut panel = mount(&host);
    settle(&mut panel).await;

    assert_eq!(host.show_ui_calls(), 1);
    assert_eq!(
        panel.state().tip_panel.last_action_error.as_ref().map(|e| e.kind),
        Some(ErrorKind::RequestFailed)
    );
}
