mod common;

use anyhow::Result;
use common::{test_service, StandardCards};
use feecard::application::{CardUpdate, LedgerError};
use feecard::domain::{CardCategory, CardStatus};
use uuid::Uuid;

#[tokio::test]
async fn test_create_card_with_opening_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let card = service
        .create_card(
            "GDRFA Visas".into(),
            CardCategory::Gdrfa,
            CardStatus::Active,
            25000,
            Some("shared desk card".into()),
        )
        .await?;

    assert_eq!(card.balance, 25000);
    assert_eq!(card.category, CardCategory::Gdrfa);
    assert!(!card.linked_to_fees);

    // Opening balance leaves no transaction record
    let history = service.list_transactions(card.id).await?;
    assert!(history.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_create_card_rejects_empty_name() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service
        .create_card(
            "   ".into(),
            CardCategory::General,
            CardStatus::Active,
            0,
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn test_create_card_rejects_negative_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service
        .create_card(
            "Bad".into(),
            CardCategory::General,
            CardStatus::Active,
            -100,
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn test_create_card_rejects_duplicate_name() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCards::create_basic(&service).await?;

    let err = service
        .create_card(
            "ICP Main".into(),
            CardCategory::Icp,
            CardStatus::Active,
            0,
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn test_list_cards_in_creation_order() -> Result<()> {
    let (service, _temp) = test_service().await?;

    for name in ["First", "Second", "Third"] {
        service
            .create_card(
                name.into(),
                CardCategory::General,
                CardStatus::Active,
                0,
                None,
            )
            .await?;
    }

    let names: Vec<String> = service
        .list_cards()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["First", "Second", "Third"]);

    Ok(())
}

#[tokio::test]
async fn test_get_card_unknown_id() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service.get_card(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, LedgerError::CardNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_update_metadata_never_touches_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let card = StandardCards::funded(&service, "Desk Card", 40000).await?;

    let updated = service
        .update_card_metadata(
            card.id,
            CardUpdate {
                name: Some("Desk Card 2".into()),
                category: Some(CardCategory::Ded),
                status: Some(CardStatus::Suspended),
                notes: Some("handed over".into()),
            },
        )
        .await?;

    assert_eq!(updated.name, "Desk Card 2");
    assert_eq!(updated.category, CardCategory::Ded);
    assert_eq!(updated.status, CardStatus::Suspended);
    assert_eq!(updated.notes.as_deref(), Some("handed over"));
    assert_eq!(updated.balance, 40000);

    // The stored card agrees
    let stored = service.get_card(card.id).await?;
    assert_eq!(stored.balance, 40000);
    assert_eq!(stored.name, "Desk Card 2");

    Ok(())
}

#[tokio::test]
async fn test_update_metadata_rejects_duplicate_rename() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (icp, mohre) = StandardCards::create_basic(&service).await?;

    let err = service
        .update_card_metadata(
            mohre.id,
            CardUpdate {
                name: Some(icp.name.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn test_update_metadata_unknown_card() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service
        .update_card_metadata(Uuid::new_v4(), CardUpdate::default())
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::CardNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_link_toggle_is_idempotent_and_recordless() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (icp, _) = StandardCards::create_basic(&service).await?;

    let linked = service.set_linked(icp.id, true).await?;
    assert!(linked.linked_to_fees);

    // Linking twice in a row leaves the flag set and produces no record
    let linked_again = service.set_linked(icp.id, true).await?;
    assert!(linked_again.linked_to_fees);

    let unlinked = service.set_linked(icp.id, false).await?;
    assert!(!unlinked.linked_to_fees);

    let history = service.list_transactions(icp.id).await?;
    assert!(history.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_link_toggle_unknown_card() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service.set_linked(Uuid::new_v4(), true).await.unwrap_err();
    assert!(matches!(err, LedgerError::CardNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_linking_works_regardless_of_balance_or_status() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let parked = StandardCards::parked(&service, "Parked", 0).await?;

    let linked = service.set_linked(parked.id, true).await?;
    assert!(linked.linked_to_fees);
    assert_eq!(linked.status, CardStatus::Inactive);

    Ok(())
}
