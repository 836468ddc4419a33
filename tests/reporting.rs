//! Read-side views: listings with derived paid totals, status and search
//! filters, per-client outstanding balances and the global outstanding sum.

use ardoise::{ClientEdit, CreditFilter, CreditStatus, Ledger, LedgerError};
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Two clients, three credits, one partially paid and one settled.
fn seeded_ledger() -> (Ledger, i64, i64) {
    let mut ledger = Ledger::open_in_memory().unwrap();
    let ibrahim = ledger
        .create_client("Ibrahim", Some("0556000000"), Some("Tipaza"), None)
        .unwrap();
    let samir = ledger
        .create_client("Samir", Some("0771000000"), Some("Cherchell"), None)
        .unwrap();

    let c1 = ledger
        .create_credit("Ibrahim", date("2026-07-01"), dec!(1500.00), Some("avance"))
        .unwrap();
    ledger
        .add_payment(c1, ibrahim, date("2026-07-15"), dec!(500.00), None)
        .unwrap();

    let c2 = ledger
        .create_credit("Ibrahim", date("2026-08-01"), dec!(200.00), Some("marchandise"))
        .unwrap();
    ledger
        .add_payment(c2, ibrahim, date("2026-08-02"), dec!(200.00), None)
        .unwrap();

    ledger
        .create_credit("Samir", date("2026-08-10"), dec!(80.50), Some("avance"))
        .unwrap();

    (ledger, ibrahim, samir)
}

#[test]
fn listing_carries_consistent_paid_totals() {
    let (ledger, _, _) = seeded_ledger();
    let rows = ledger.list_credits(&CreditFilter::default()).unwrap();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.remaining, row.principal - row.paid);
    }
    // ordered by client name
    assert_eq!(rows[0].client_name, "Ibrahim");
    assert_eq!(rows[2].client_name, "Samir");
}

#[test]
fn filter_by_status() {
    let (ledger, _, _) = seeded_ledger();

    let open = ledger
        .list_credits(&CreditFilter {
            status: Some(CreditStatus::Open),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(open.len(), 2);
    assert!(open.iter().all(|row| row.status == CreditStatus::Open));

    let settled = ledger
        .list_credits(&CreditFilter {
            status: Some(CreditStatus::Settled),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].principal, dec!(200.00));
    assert_eq!(settled[0].paid, dec!(200.00));
}

#[test]
fn filter_by_client_and_search() {
    let (ledger, ibrahim, _) = seeded_ledger();

    let mine = ledger
        .list_credits(&CreditFilter {
            client_id: Some(ibrahim),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|row| row.client_id == ibrahim));

    let by_name = ledger
        .list_credits(&CreditFilter {
            search: Some("sam".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].client_name, "Samir");

    let by_reason = ledger
        .list_credits(&CreditFilter {
            search: Some("marchandise".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_reason.len(), 1);

    let by_month = ledger
        .list_credits(&CreditFilter {
            search: Some("2026-07".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_month.len(), 1);
    assert_eq!(by_month[0].principal, dec!(1500.00));

    let none = ledger
        .list_credits(&CreditFilter {
            search: Some("introuvable".into()),
            ..Default::default()
        })
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn total_outstanding_sums_open_credits_only() {
    let (mut ledger, ibrahim, _) = seeded_ledger();
    // 1000.00 still owed by Ibrahim + 80.50 by Samir; the settled credit
    // contributes nothing
    assert_eq!(ledger.total_outstanding().unwrap(), dec!(1080.50));

    let c = ledger
        .list_credits(&CreditFilter {
            status: Some(CreditStatus::Open),
            client_id: Some(ibrahim),
            ..Default::default()
        })
        .unwrap();
    ledger.settle_credit(c[0].id, ibrahim).unwrap();
    assert_eq!(ledger.total_outstanding().unwrap(), dec!(80.50));
}

#[test]
fn client_accounts_carry_live_outstanding() {
    let (ledger, _, _) = seeded_ledger();
    let accounts = ledger.list_clients().unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].name, "Ibrahim");
    assert_eq!(accounts[0].outstanding, dec!(1000.00));
    assert_eq!(accounts[1].name, "Samir");
    assert_eq!(accounts[1].outstanding, dec!(80.50));
}

#[test]
fn search_clients_matches_name_phone_and_locality() {
    let (ledger, _, _) = seeded_ledger();

    let hits = ledger.search_clients("ibra").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Ibrahim");

    let hits = ledger.search_clients("0771").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Samir");

    let hits = ledger.search_clients("Cherchell").unwrap();
    assert_eq!(hits.len(), 1);

    assert!(ledger.search_clients("zzz").unwrap().is_empty());
}

#[test]
fn payments_list_in_chronological_order() {
    let mut ledger = Ledger::open_in_memory().unwrap();
    let client = ledger.create_client("Ibrahim", None, None, None).unwrap();
    let credit = ledger
        .create_credit("Ibrahim", date("2026-08-01"), dec!(500.00), None)
        .unwrap();

    // inserted out of date order
    ledger
        .add_payment(credit, client, date("2026-08-20"), dec!(50.00), None)
        .unwrap();
    ledger
        .add_payment(credit, client, date("2026-08-05"), dec!(100.00), None)
        .unwrap();
    ledger
        .add_payment(credit, client, date("2026-08-12"), dec!(25.00), Some("espèces"))
        .unwrap();

    let payments = ledger.list_payments(credit).unwrap();
    let dates: Vec<_> = payments.iter().map(|p| p.date).collect();
    assert_eq!(
        dates,
        vec![date("2026-08-05"), date("2026-08-12"), date("2026-08-20")]
    );
    assert_eq!(payments[1].note.as_deref(), Some("espèces"));
    assert!(payments.iter().all(|p| p.credit_id == credit && p.client_id == client));
}

#[test]
fn client_lifecycle_edits() {
    let mut ledger = Ledger::open_in_memory().unwrap();
    let id = ledger
        .create_client("  Ibrahim  ", None, None, None)
        .unwrap();
    // name is trimmed on the way in
    assert_eq!(ledger.client(id).unwrap().name, "Ibrahim");

    let err = ledger.create_client("   ", None, None, None).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    ledger
        .edit_client(id, ClientEdit::Phone(Some("0556000001".into())))
        .unwrap();
    ledger
        .edit_client(id, ClientEdit::Locality(Some("Hadjout".into())))
        .unwrap();
    ledger
        .edit_client(id, ClientEdit::Name("Brahim".into()))
        .unwrap();
    let client = ledger.client(id).unwrap();
    assert_eq!(client.name, "Brahim");
    assert_eq!(client.phone.as_deref(), Some("0556000001"));
    assert_eq!(client.locality.as_deref(), Some("Hadjout"));

    let err = ledger
        .edit_client(id, ClientEdit::Name("  ".into()))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let err = ledger
        .edit_client(999, ClientEdit::Note(None))
        .unwrap_err();
    assert!(matches!(err, LedgerError::ClientNotFound(999)));

    let err = ledger.delete_client(999).unwrap_err();
    assert!(matches!(err, LedgerError::ClientNotFound(999)));
}
