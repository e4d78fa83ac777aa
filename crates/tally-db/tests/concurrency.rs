//! Concurrent settlement against a file-backed database with a real
//! multi-connection pool.

use std::sync::Arc;

use tally_core::{CoreError, ItemInput, ItemType, Money, PaymentLine, PaymentMethod, Percentage, TicketStatus};
use tally_db::{Database, DbConfig, DbError, NewTicket, TicketFilter};

const CO: &str = "company-1";

async fn file_database(dir: &tempfile::TempDir) -> Database {
    let config = DbConfig::new(dir.path().join("tally.db")).max_connections(8);
    Database::new(config).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_finalize_settles_once() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_database(&dir).await;

    let client = db.catalog().insert_client(CO, "Ana").await.unwrap();
    let service = db
        .catalog()
        .insert_service(CO, "Cut", Money::from_cents(5000), Percentage::from_bps(2000))
        .await
        .unwrap();
    let product = db
        .catalog()
        .insert_product(CO, "Shampoo", Money::from_cents(2000), 10, 1)
        .await
        .unwrap();

    let engine = db.engine();
    let ticket = engine
        .open_ticket(
            CO,
            NewTicket {
                client_id: client.id.clone(),
                professional_id: Some("prof-p".to_string()),
                notes: None,
            },
        )
        .await
        .unwrap();
    let ticket_id = ticket.ticket.id;

    for (entry, quantity) in [(&service, 1), (&product, 2)] {
        engine
            .add_item(
                CO,
                &ticket_id,
                ItemInput {
                    item_type: entry.item_type,
                    reference_id: entry.id.clone(),
                    quantity,
                    unit_value_cents: None,
                    professional_id: None,
                    commission_bps: None,
                },
            )
            .await
            .unwrap();
    }

    let payments = Arc::new(vec![PaymentLine::new(
        PaymentMethod::Card,
        Money::from_cents(9000),
    )]);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = engine.clone();
            let ticket_id = ticket_id.clone();
            let payments = Arc::clone(&payments);
            tokio::spawn(async move { engine.finalize(CO, &ticket_id, &payments).await })
        })
        .collect();

    let mut settled = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => settled += 1,
            Err(DbError::Domain(CoreError::InvalidState { status, .. })) => {
                assert_eq!(status, TicketStatus::Finished);
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!((settled, rejected), (1, 1));

    let stock = db.stock().get(CO, &product.id).await.unwrap().unwrap();
    assert_eq!(stock.stock_current, 8);
    assert_eq!(db.financial().count(CO).await.unwrap(), 1);
    assert_eq!(db.commissions().for_ticket(CO, &ticket_id).await.unwrap().len(), 1);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opens_get_distinct_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_database(&dir).await;
    let client = db.catalog().insert_client(CO, "Ana").await.unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = db.engine();
            let client_id = client.id.clone();
            tokio::spawn(async move {
                engine
                    .open_ticket(
                        CO,
                        NewTicket {
                            client_id,
                            ..Default::default()
                        },
                    )
                    .await
            })
        })
        .collect();

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap().ticket.number);
    }
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 10);

    let listed = db.tickets().list(CO, &TicketFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 10);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_finalizes_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_database(&dir).await;
    let client = db.catalog().insert_client(CO, "Ana").await.unwrap();
    let product = db
        .catalog()
        .insert_product(CO, "Beard Oil", Money::from_cents(3990), 3, 1)
        .await
        .unwrap();

    let engine = db.engine();
    let mut ticket_ids = Vec::new();
    for _ in 0..5 {
        let ticket = engine
            .open_ticket(
                CO,
                NewTicket {
                    client_id: client.id.clone(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        engine
            .add_item(
                CO,
                &ticket.ticket.id,
                ItemInput {
                    item_type: ItemType::Product,
                    reference_id: product.id.clone(),
                    quantity: 1,
                    unit_value_cents: None,
                    professional_id: None,
                    commission_bps: None,
                },
            )
            .await
            .unwrap();
        ticket_ids.push(ticket.ticket.id);
    }

    let handles: Vec<_> = ticket_ids
        .into_iter()
        .map(|ticket_id| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.finalize(CO, &ticket_id, &[]).await })
        })
        .collect();

    let mut settled = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => settled += 1,
            Err(DbError::Domain(CoreError::InsufficientStock { available, .. })) => {
                assert_eq!(available, 0);
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(settled, 3);
    let stock = db.stock().get(CO, &product.id).await.unwrap().unwrap();
    assert_eq!(stock.stock_current, 0);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cashback_never_overdraws_balance() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_database(&dir).await;
    let client = db.catalog().insert_client(CO, "Ana").await.unwrap();
    let service = db
        .catalog()
        .insert_service(CO, "Cut", Money::from_cents(10_000), Percentage::from_bps(0))
        .await
        .unwrap();
    let balance = db.cashback().balance(CO, &client.id).await.unwrap();
    db.cashback()
        .credit(CO, &balance.id, Money::from_cents(5000), None)
        .await
        .unwrap();

    // Two tickets of the same client, each asking for the whole balance
    let engine = db.engine();
    let mut ticket_ids = Vec::new();
    for _ in 0..2 {
        let ticket = engine
            .open_ticket(
                CO,
                NewTicket {
                    client_id: client.id.clone(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        engine
            .add_item(
                CO,
                &ticket.ticket.id,
                ItemInput {
                    item_type: ItemType::Service,
                    reference_id: service.id.clone(),
                    quantity: 1,
                    unit_value_cents: None,
                    professional_id: None,
                    commission_bps: None,
                },
            )
            .await
            .unwrap();
        ticket_ids.push(ticket.ticket.id);
    }

    let handles: Vec<_> = ticket_ids
        .into_iter()
        .map(|ticket_id| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .apply_cashback(CO, &ticket_id, Money::from_cents(5000))
                    .await
            })
        })
        .collect();

    let mut applied = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                assert!(outcome.ticket.is_balanced());
                applied += outcome.applied_cents;
            }
            Err(DbError::Domain(CoreError::InsufficientFunds { .. })) => refused += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert!(applied <= 5000, "applied {applied} exceeds the credited 5000");
    assert_eq!((applied, refused), (5000, 1));

    let after = db.cashback().balance(CO, &client.id).await.unwrap();
    assert!(after.balance_cents >= 0);
    assert_eq!(after.balance_cents, 5000 - applied);

    db.close().await;
}
