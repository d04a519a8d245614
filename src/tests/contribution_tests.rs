use super::*;
use crate::core::errors::ErrorKind;
use crate::core::models::contribution::ContributionStatus;
use crate::core::models::audit::AppLog;
use crate::core::models::session::ItemState;

/// Application log that can be switched into failing mode.
struct FlakyLogging {
    failing: Arc<AtomicBool>,
    inner: InMemoryLogging,
}

#[async_trait]
impl LoggingService for FlakyLogging {
    async fn log_action(
        &self,
        action: &str,
        room_id: Option<&str>,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), CofundError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CofundError::LoggingError("log sink unavailable".to_string()));
        }
        self.inner.log_action(action, room_id, details, user_id).await
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, CofundError> {
        self.inner.get_logs().await
    }
}

#[tokio::test]
async fn test_contribution_commits_and_updates_progress() {
    let service = create_test_service();
    let room = create_room(&service, &["u1", "u2"]).await;
    let session_id = open_session(&service, &room, vec![item("tv", 500, 2)]).await;

    let receipt = service.contribute(&session_id, wallet("tv", "u2", 400)).await.unwrap();
    assert_eq!(receipt.contributors.len(), 1);
    let contributor = &receipt.contributors[0];
    assert_eq!(contributor.user_id, "u2");
    assert_eq!(contributor.username, "u2-name");
    assert_eq!(contributor.status, ContributionStatus::Contributed);
    assert!(contributor.transaction_id.as_deref().unwrap().starts_with("wal_"));
    assert!(!receipt.all_items_funded);

    let progress = service.progress(&session_id, "tv").await.unwrap();
    assert_eq!(progress.current_amount, money(400));
    assert_eq!(progress.remaining_amount, money(600));
    assert_eq!(progress.percent, money(40));
    assert!(!progress.is_complete);
}

#[tokio::test]
async fn test_rejects_non_positive_and_fractional_amounts() {
    let service = create_test_service();
    let room = create_room(&service, &["u1"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 100, 1)]).await;

    let zero = service.contribute(&session_id, wallet("a", "u1", 0)).await;
    assert!(matches!(zero, Err(CofundError::InvalidAmount(_))));
    let negative = service.contribute(&session_id, wallet("a", "u1", -10)).await;
    assert!(matches!(negative, Err(CofundError::InvalidAmount(_))));

    let mut fractional = wallet("a", "u1", 1);
    fractional.amount = Decimal::new(1005, 3);
    let result = service.contribute(&session_id, fractional).await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_overfunding_is_rejected_with_remaining_amount() {
    let service = create_test_service();
    let room = create_room(&service, &["u1", "u2"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 100, 1)]).await;

    service.contribute(&session_id, wallet("a", "u1", 70)).await.unwrap();
    let result = service.contribute(&session_id, wallet("a", "u2", 50)).await;
    match result {
        Err(CofundError::Overfunding {
            item_id,
            requested,
            remaining,
        }) => {
            assert_eq!(item_id, "a");
            assert_eq!(requested, money(50));
            assert_eq!(remaining, money(30));
        }
        other => panic!("expected overfunding, got {:?}", other),
    }

    let progress = service.progress(&session_id, "a").await.unwrap();
    assert_eq!(progress.current_amount, money(70));
}

#[tokio::test]
async fn test_unknown_item_member_and_missing_item_id() {
    let service = create_test_service();
    let room = create_room(&service, &["u1"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 100, 1)]).await;

    let unknown_item = service.contribute(&session_id, wallet("nope", "u1", 10)).await;
    assert!(matches!(unknown_item, Err(CofundError::ItemNotFound(_))));

    let stranger = service.contribute(&session_id, wallet("a", "mallory", 10)).await;
    assert!(matches!(stranger, Err(CofundError::UnknownMember(_))));

    let no_item = service
        .contribute(&session_id, pay(PaymentMethod::Wallet, None, "u1", 10))
        .await;
    assert!(matches!(no_item, Err(CofundError::InvalidInput(..))));
}

#[tokio::test]
async fn test_payment_failure_leaves_ledger_unchanged() {
    let channel = Arc::new(ScriptedChannel::new(PaymentMethod::Wallet));
    channel.fail_pay.store(true, Ordering::SeqCst);
    let service = create_test_service_with(PaymentChannels::new().with(channel.clone()));
    let room = create_room(&service, &["u1"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 100, 1)]).await;

    let result = service.contribute(&session_id, wallet("a", "u1", 40)).await;
    let err = result.unwrap_err();
    assert_eq!(err, CofundError::PaymentChannel("provider unavailable".to_string()));
    assert!(err.is_retryable());

    let snapshot = service.snapshot(&session_id).await.unwrap();
    assert_eq!(snapshot.items[0].progress.current_amount, Decimal::ZERO);
    assert!(snapshot.items[0].contributors.is_empty());

    channel.fail_pay.store(false, Ordering::SeqCst);
    service.contribute(&session_id, wallet("a", "u1", 40)).await.unwrap();
    assert_eq!(service.progress(&session_id, "a").await.unwrap().current_amount, money(40));
}

#[tokio::test]
async fn test_insufficient_wallet_balance_is_a_channel_error() {
    let service = create_test_service_with(default_channels(WalletChannel::new(money(50))));
    let room = create_room(&service, &["u1"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 100, 1)]).await;

    let result = service.contribute(&session_id, wallet("a", "u1", 80)).await;
    assert!(matches!(result, Err(CofundError::PaymentChannel(_))));
}

#[tokio::test]
async fn test_unconfigured_method_is_a_channel_error() {
    let service = create_test_service_with(PaymentChannels::new().with(Arc::new(WalletChannel::new(money(100)))));
    let room = create_room(&service, &["u1"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 100, 1)]).await;

    let result = service
        .contribute(&session_id, pay(PaymentMethod::MultiPartyLink, Some("a"), "u1", 10))
        .await;
    assert!(matches!(result, Err(CofundError::PaymentChannel(_))));
}

#[tokio::test]
async fn test_collection_link_contribution() {
    let service = create_test_service();
    let room = create_room(&service, &["u1", "u2"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 100, 1)]).await;

    let receipt = service
        .contribute(&session_id, pay(PaymentMethod::MultiPartyLink, Some("a"), "u2", 100))
        .await
        .unwrap();
    assert!(receipt.transaction_id.starts_with("lnk_"));
    assert_eq!(receipt.payment_method, PaymentMethod::MultiPartyLink);
    assert!(receipt.all_items_funded);
}

#[tokio::test]
async fn test_three_item_cart_funded_only_after_last_item() {
    let service = create_test_service();
    let room = create_room(&service, &["u1", "u2", "u3"]).await;
    let session_id = open_session(
        &service,
        &room,
        vec![item("a", 200, 1), item("b", 300, 1), item("c", 500, 1)],
    )
    .await;

    let first = service.contribute(&session_id, wallet("a", "u1", 200)).await.unwrap();
    assert!(!first.all_items_funded);
    assert!(!service.cart_summary(&session_id).await.unwrap().all_items_funded);

    let second = service.contribute(&session_id, wallet("b", "u2", 300)).await.unwrap();
    assert!(!second.all_items_funded);
    let summary = service.cart_summary(&session_id).await.unwrap();
    assert_eq!(summary.funded_items, 2);
    assert!(!summary.all_items_funded);

    let third = service.contribute(&session_id, wallet("c", "u3", 500)).await.unwrap();
    assert!(third.all_items_funded);

    let summary = service.cart_summary(&session_id).await.unwrap();
    assert!(summary.all_items_funded);
    assert_eq!(summary.total_contributed, money(1000));
    assert_eq!(summary.total_remaining, Decimal::ZERO);

    let logs = service.get_app_logs(&room.id).await.unwrap();
    assert_eq!(logs.iter().filter(|l| l.action == "ALL_ITEMS_FUNDED").count(), 1);
}

#[tokio::test]
async fn test_funded_item_rejects_further_contributions() {
    let service = create_test_service();
    let room = create_room(&service, &["u1", "u2"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 100, 1), item("b", 100, 1)]).await;

    service.contribute(&session_id, wallet("a", "u1", 100)).await.unwrap();
    let result = service.contribute(&session_id, wallet("a", "u2", 1)).await;
    assert!(matches!(result, Err(CofundError::Overfunding { remaining, .. }) if remaining == Decimal::ZERO));

    let snapshot = service.snapshot(&session_id).await.unwrap();
    assert_eq!(snapshot.items[0].state, ItemState::Funded);
    assert_eq!(snapshot.items[1].state, ItemState::Unfunded);
}

#[tokio::test]
async fn test_zero_priced_item_starts_complete() {
    let service = create_test_service();
    let room = create_room(&service, &["u1"]).await;
    let session_id = open_session(&service, &room, vec![item("gift", 0, 1)]).await;

    let progress = service.progress(&session_id, "gift").await.unwrap();
    assert!(progress.is_complete);
    assert_eq!(progress.percent, money(100));
}

#[tokio::test]
async fn test_contributions_are_audited() {
    let service = create_test_service();
    let room = create_room(&service, &["u1"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 100, 1)]).await;

    service.contribute(&session_id, wallet("a", "u1", 60)).await.unwrap();
    let _ = service.contribute(&session_id, wallet("a", "u1", 60)).await;

    let actions: Vec<String> = service
        .get_session_audits(&session_id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.action)
        .collect();
    assert_eq!(actions, vec!["SESSION_OPENED", "CONTRIBUTION_COMMITTED", "CONTRIBUTION_REJECTED"]);
}

#[tokio::test]
async fn test_committed_contribution_survives_audit_failure() {
    let failing = Arc::new(AtomicBool::new(false));
    let service = create_test_service_with_logging(FlakyLogging {
        failing: failing.clone(),
        inner: InMemoryLogging::new(),
    });
    let room = create_room(&service, &["u1"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 100, 1)]).await;

    failing.store(true, Ordering::SeqCst);
    let receipt = service.contribute(&session_id, wallet("a", "u1", 100)).await.unwrap();
    assert!(receipt.all_items_funded);
    assert_eq!(service.progress(&session_id, "a").await.unwrap().current_amount, money(100));

    // a retry would be rejected rather than charged twice
    let retry = service.contribute(&session_id, wallet("a", "u1", 100)).await;
    assert!(matches!(retry, Err(CofundError::Overfunding { remaining, .. }) if remaining == Decimal::ZERO));
    assert_eq!(service.progress(&session_id, "a").await.unwrap().current_amount, money(100));
}
