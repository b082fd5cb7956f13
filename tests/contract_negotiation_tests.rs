//! Contract negotiation tests
//!
//! These tests drive the negotiation store through the full client/contractor
//! cycle and check the status table, version history and signing rules.
//!
//! Test coverage:
//! - Every accepted transition bumps the version and appends one history entry
//! - request_changes / send_to_other_party manage the negotiation comment
//! - Both signatures in order lead to Signed - Active
//! - Out-of-turn signing is rejected without touching the contract

use buildbridge::contracts::{next_status, Contract, ContractAction, ContractError, ContractNegotiation, ContractStatus};
use buildbridge::{ContractApi, MockBackend, PartyRole};
use tokio_test::{assert_err, assert_ok};

type Step = fn(&mut ContractNegotiation) -> Result<ContractStatus, ContractError>;

fn negotiation_in(status: ContractStatus, role: PartyRole) -> ContractNegotiation {
    let mut contract = Contract::seed("project-42");
    contract.status = status;
    ContractNegotiation::new(contract, role)
}

fn assert_single_step(before: &Contract, after: &Contract, role: PartyRole) {
    assert_eq!(after.version_number, before.version_number + 1);
    assert_eq!(after.version_history.len(), before.version_history.len() + 1);
    let entry = after.version_history.last().unwrap();
    assert_eq!(entry.version_number, after.version_number);
    assert_eq!(entry.modified_by, role);
}

#[test]
fn test_full_negotiation_keeps_version_history_in_step() {
    let mut store = negotiation_in(ContractStatus::AwaitingClientReview, PartyRole::Client);

    let steps: [(PartyRole, Step); 6] = [
        (PartyRole::Client, |s: &mut ContractNegotiation| s.send_to_other_party(None)),
        (PartyRole::Contractor, |s: &mut ContractNegotiation| s.request_changes("Split milestone 2")),
        (PartyRole::Client, |s: &mut ContractNegotiation| {
            s.send_to_other_party(Some("Split as requested".to_string()))
        }),
        (PartyRole::Contractor, |s: &mut ContractNegotiation| s.approve(None)),
        (PartyRole::Client, |s: &mut ContractNegotiation| s.sign()),
        (PartyRole::Contractor, |s: &mut ContractNegotiation| s.sign()),
    ];

    for (role, step) in steps {
        store.set_role(role);
        let before = store.contract().clone();
        assert_ok!(step(&mut store));
        assert_single_step(&before, store.contract(), role);
    }

    assert_eq!(store.status(), ContractStatus::SignedActive);
    assert_eq!(store.contract().version_number, 7);
    assert!(store.contract().is_fully_signed());
}

#[test]
fn test_request_changes_sets_comment() {
    let mut store = negotiation_in(ContractStatus::AwaitingContractorReview, PartyRole::Contractor);
    let status = store.request_changes("x").unwrap();
    assert_eq!(status, ContractStatus::AwaitingClientModification);
    assert_eq!(store.contract().last_negotiation_comment.as_deref(), Some("x"));
}

#[test]
fn test_send_from_modification_clears_comment() {
    let mut store = negotiation_in(ContractStatus::AwaitingContractorReview, PartyRole::Contractor);
    store.request_changes("Reduce retention to 5%").unwrap();

    store.set_role(PartyRole::Client);
    let status = store.send_to_other_party(None).unwrap();
    assert_eq!(status, ContractStatus::AwaitingContractorReview);
    assert_eq!(store.contract().last_negotiation_comment, None);
}

#[test]
fn test_client_then_contractor_signatures() {
    let mut store = negotiation_in(ContractStatus::ApprovedAwaitingSignatures, PartyRole::Client);

    store.sign().unwrap();
    assert_eq!(store.status(), ContractStatus::AwaitingContractorSignature);
    assert!(store.contract().client_signed_pdf_url.is_some());
    assert!(store.contract().contractor_signed_pdf_url.is_none());

    store.set_role(PartyRole::Contractor);
    store.sign().unwrap();
    assert_eq!(store.status(), ContractStatus::SignedActive);
    assert!(store.contract().contractor_signed_pdf_url.is_some());
}

#[test]
fn test_contractor_cannot_sign_first() {
    let mut store = negotiation_in(ContractStatus::ApprovedAwaitingSignatures, PartyRole::Contractor);
    let before = store.contract().clone();

    let err = assert_err!(store.sign());
    assert_eq!(err, ContractError::NotYourTurnToSign);
    assert_eq!(store.status(), ContractStatus::ApprovedAwaitingSignatures);
    assert!(store.error.is_some());
    assert_eq!(store.contract(), &before);
}

#[test]
fn test_client_cannot_approve() {
    let mut store = negotiation_in(ContractStatus::AwaitingContractorReview, PartyRole::Client);
    assert_err!(store.approve(None));
    assert_eq!(store.error.as_deref(), Some("Only contractor can approve the contract"));
    assert_eq!(store.contract().version_number, 1);
}

#[test]
fn test_table_lookup_ignores_wrong_role() {
    assert_eq!(
        next_status(ContractStatus::AwaitingContractorReview, ContractAction::Approve, PartyRole::Client),
        ContractStatus::AwaitingContractorReview
    );
    assert_eq!(
        next_status(ContractStatus::SignedActive, ContractAction::Sign, PartyRole::Contractor),
        ContractStatus::SignedActive
    );
}

#[tokio::test]
async fn test_load_and_save_round_trip_through_backend() {
    let backend = MockBackend::new();
    let seeded = Contract::seed("project-42");
    backend.insert_contract(seeded.clone()).await;

    let mut store = ContractNegotiation::new(Contract::seed("other"), PartyRole::Client);
    store.load(&backend, &seeded.id).await.unwrap();
    assert_eq!(store.contract().id, seeded.id);

    store.send_to_other_party(Some("Ready".to_string())).unwrap();
    store.save(&backend).await.unwrap();
    assert!(!store.is_loading);

    let stored = backend.fetch_contract(&seeded.id).await.unwrap().into_result().unwrap();
    assert_eq!(stored.status, ContractStatus::AwaitingContractorReview);
    assert_eq!(stored.version_number, 2);
}

#[tokio::test]
async fn test_backend_failure_is_reported_as_error_string() {
    let backend = MockBackend::new();
    let seeded = Contract::seed("project-42");
    backend.insert_contract(seeded.clone()).await;
    backend.fail_next(1).await;

    let mut store = ContractNegotiation::new(seeded.clone(), PartyRole::Client);
    let err = store.load(&backend, &seeded.id).await.unwrap_err();
    assert!(matches!(err, ContractError::Api(_)));
    assert!(store.error.as_deref().unwrap().contains("Network error"));
    assert_eq!(store.contract(), &seeded);
}
