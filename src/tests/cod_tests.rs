use super::*;
use crate::core::errors::ErrorKind;

fn cod(user_id: &str, amount: i64) -> ContributionRequest {
    pay(PaymentMethod::Cod, None, user_id, amount)
}

#[tokio::test]
async fn test_cod_rejected_in_group_room_for_any_amount() {
    let service = create_test_service();
    let room = create_room(&service, &["u1", "u2"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 300, 1), item("b", 200, 1)]).await;

    for amount in [500, 100, 1] {
        let err = service.contribute(&session_id, cod("u1", amount)).await.unwrap_err();
        assert!(matches!(err, CofundError::CodNotAllowed(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(service.cart_summary(&session_id).await.unwrap().total_contributed, Decimal::ZERO);
}

#[tokio::test]
async fn test_cod_requires_exact_remaining_total() {
    let service = create_test_service();
    let room = create_room(&service, &["solo"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 300, 1), item("b", 200, 1)]).await;

    let short = service.contribute(&session_id, cod("solo", 400)).await;
    assert!(matches!(short, Err(CofundError::CodNotAllowed(_))));
    let over = service.contribute(&session_id, cod("solo", 600)).await;
    assert!(matches!(over, Err(CofundError::CodNotAllowed(_))));
    assert_eq!(service.cart_summary(&session_id).await.unwrap().total_contributed, Decimal::ZERO);
}

#[tokio::test]
async fn test_cod_covers_every_item_with_one_transaction() {
    let service = create_test_service();
    let room = create_room(&service, &["solo"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 300, 1), item("b", 100, 2)]).await;

    let receipt = service.contribute(&session_id, cod("solo", 500)).await.unwrap();
    assert!(receipt.transaction_id.starts_with("cod_"));
    assert!(receipt.all_items_funded);
    assert_eq!(receipt.contributors.len(), 2);
    assert!(
        receipt
            .contributors
            .iter()
            .all(|c| c.transaction_id.as_deref() == Some(receipt.transaction_id.as_str())
                && c.payment_method == PaymentMethod::Cod)
    );
    let shares: Vec<Decimal> = receipt.contributors.iter().map(|c| c.amount).collect();
    assert_eq!(shares, vec![money(300), money(200)]);

    let summary = service.cart_summary(&session_id).await.unwrap();
    assert!(summary.all_items_funded);
    assert_eq!(summary.total_contributed, money(500));
}

#[tokio::test]
async fn test_cod_settles_what_remains_after_wallet_payment() {
    let service = create_test_service();
    let room = create_room(&service, &["solo"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 300, 1), item("b", 200, 1)]).await;

    service.contribute(&session_id, wallet("a", "solo", 300)).await.unwrap();
    service.contribute(&session_id, wallet("b", "solo", 50)).await.unwrap();

    let receipt = service.contribute(&session_id, cod("solo", 150)).await.unwrap();
    assert_eq!(receipt.contributors.len(), 1);
    assert_eq!(receipt.contributors[0].item_id, "b");
    assert_eq!(receipt.contributors[0].amount, money(150));
    assert!(receipt.all_items_funded);
}

#[tokio::test]
async fn test_cod_on_funded_cart_is_rejected() {
    let service = create_test_service();
    let room = create_room(&service, &["solo"]).await;
    let session_id = open_session(&service, &room, vec![item("a", 100, 1)]).await;

    service.contribute(&session_id, wallet("a", "solo", 100)).await.unwrap();
    let result = service.contribute(&session_id, cod("solo", 100)).await;
    assert!(matches!(result, Err(CofundError::CodNotAllowed(_))));
}

#[tokio::test]
async fn test_cod_receipt_follows_cart_order() {
    let service = create_test_service();
    let room = create_room(&service, &["solo"]).await;
    let session_id = open_session(&service, &room, vec![item("zeta", 100, 1), item("alpha", 50, 1)]).await;

    let receipt = service.contribute(&session_id, cod("solo", 150)).await.unwrap();
    let item_ids: Vec<&str> = receipt.contributors.iter().map(|c| c.item_id.as_str()).collect();
    assert_eq!(item_ids, vec!["zeta", "alpha"]);
}

#[tokio::test]
async fn test_cod_refunded_when_cart_changes_during_payment() {
    let cod_channel = Arc::new(ScriptedChannel::new(PaymentMethod::Cod).held());
    let channels = PaymentChannels::new()
        .with(Arc::new(WalletChannel::new(money(1_000))))
        .with(cod_channel.clone());
    let service = Arc::new(create_test_service_with(channels));
    let room = create_room(&*service, &["solo"]).await;
    let session_id = open_session(&*service, &room, vec![item("a", 300, 1), item("b", 200, 1)]).await;

    let pending_cod = {
        let service = service.clone();
        let session_id = session_id.clone();
        tokio::spawn(async move { service.contribute(&session_id, cod("solo", 500)).await })
    };
    cod_channel.entered.notified().await;

    // wallet payment lands while the cash-on-delivery charge is in flight
    service.contribute(&session_id, wallet("a", "solo", 100)).await.unwrap();
    cod_channel.release();

    let result = pending_cod.await.unwrap();
    assert!(matches!(result, Err(CofundError::CodNotAllowed(_))));
    assert_eq!(cod_channel.paid.load(Ordering::SeqCst), 1);
    assert_eq!(cod_channel.refunded.load(Ordering::SeqCst), 1);
    assert_eq!(service.cart_summary(&session_id).await.unwrap().total_contributed, money(100));

    // re-quoting the new remainder settles the cart exactly
    cod_channel.release();
    let receipt = service.contribute(&session_id, cod("solo", 400)).await.unwrap();
    assert!(receipt.all_items_funded);
    let summary = service.cart_summary(&session_id).await.unwrap();
    assert_eq!(summary.total_contributed, summary.total_target);
    assert_eq!(summary.total_contributed, money(500));
    assert_eq!(cod_channel.refunded.load(Ordering::SeqCst), 1);
}
