//! Transaction lifecycle integration tests.

mod common;

use std::sync::Arc;

use serde_json::json;

use arbor_link::{ArborLinkError, Connection, ServerSummary, Session};
use common::{FakeConnection, Response};

fn as_dyn(conn: &Arc<FakeConnection>) -> Arc<dyn Connection> {
    Arc::clone(conn) as Arc<dyn Connection>
}

#[tokio::test]
async fn begin_run_commit_round_trip() {
    let conn = FakeConnection::new(vec![
        Response::empty(), // BEGIN
        Response::records(&["n"], vec![vec![json!({"labels": ["Person"]})]]),
        Response::records_with_summary(
            &[],
            vec![],
            ServerSummary {
                statement_type: Some("rw".to_string()),
                ..ServerSummary::default()
            },
        ), // COMMIT
    ]);
    let session = Session::new(as_dyn(&conn));
    assert!(!session.has_open_transaction());

    let mut tx = session.begin_transaction().await.unwrap();
    assert!(session.has_open_transaction());

    let records = tx
        .run("CREATE (n) RETURN n")
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(records.len(), 1);

    let summary = tx.commit().await.unwrap();
    assert_eq!(summary.statement.text, "COMMIT");
    assert_eq!(summary.statement_type(), Some("rw"));
    assert!(!session.has_open_transaction());

    assert_eq!(
        conn.statements(),
        vec!["BEGIN", "CREATE (n) RETURN n", "COMMIT"]
    );
}

#[tokio::test]
async fn begin_failure_clears_flag_and_session_stays_usable() {
    let conn = FakeConnection::new(vec![
        Response::failure("Arbor.TransientError.Transaction.Unavailable", "no leader"),
        Response::empty(), // retried BEGIN
    ]);
    let session = Session::new(as_dyn(&conn));

    let err = session.begin_transaction().await.unwrap_err();
    assert!(matches!(err, ArborLinkError::Server(_)));
    assert!(!session.has_open_transaction());

    // A new transaction can be begun after the failure.
    let tx = session.begin_transaction().await.unwrap();
    assert!(session.has_open_transaction());
    drop(tx);
}

#[tokio::test]
async fn commit_failure_clears_flag_before_caller_observes_outcome() {
    let conn = FakeConnection::new(vec![
        Response::empty(), // BEGIN
        Response::failure("Arbor.ClientError.Schema.ConstraintViolation", "duplicate"),
        Response::empty(), // next BEGIN
    ]);
    let session = Session::new(as_dyn(&conn));

    let mut tx = session.begin_transaction().await.unwrap();
    let err = tx.commit().await.unwrap_err();
    assert!(matches!(err, ArborLinkError::Server(_)));

    // Flag already cleared by the time the caller resumes, so a new
    // transaction opens immediately.
    assert!(!session.has_open_transaction());
    session.begin_transaction().await.unwrap();
}

#[tokio::test]
async fn rollback_clears_flag_and_issues_rollback_statement() {
    let conn = FakeConnection::new(vec![
        Response::empty(), // BEGIN
        Response::empty(), // ROLLBACK
    ]);
    let session = Session::new(as_dyn(&conn));

    let mut tx = session.begin_transaction().await.unwrap();
    tx.rollback().await.unwrap();

    assert!(!session.has_open_transaction());
    assert_eq!(conn.statements(), vec!["BEGIN", "ROLLBACK"]);
}

#[tokio::test]
async fn second_transaction_while_open_is_rejected() {
    let conn = FakeConnection::new(vec![Response::empty()]);
    let session = Session::new(as_dyn(&conn));

    let _tx = session.begin_transaction().await.unwrap();

    assert!(matches!(
        session.begin_transaction().await,
        Err(ArborLinkError::TransactionOpen)
    ));
}

#[tokio::test]
async fn closed_transaction_rejects_further_operations() {
    let conn = FakeConnection::new(vec![
        Response::empty(), // BEGIN
        Response::empty(), // COMMIT
    ]);
    let session = Session::new(as_dyn(&conn));

    let mut tx = session.begin_transaction().await.unwrap();
    tx.commit().await.unwrap();

    assert!(matches!(
        tx.commit().await,
        Err(ArborLinkError::TransactionClosed)
    ));
    assert!(matches!(
        tx.rollback().await,
        Err(ArborLinkError::TransactionClosed)
    ));
    assert!(matches!(
        tx.run("RETURN 1"),
        Err(ArborLinkError::TransactionClosed)
    ));
}

#[tokio::test]
async fn dropping_open_transaction_frees_the_session() {
    let conn = FakeConnection::new(vec![
        Response::empty(), // BEGIN
        Response::empty(), // BEGIN again
    ]);
    let session = Session::new(as_dyn(&conn));

    let tx = session.begin_transaction().await.unwrap();
    assert!(session.has_open_transaction());
    drop(tx);
    assert!(!session.has_open_transaction());

    session.begin_transaction().await.unwrap();
}
