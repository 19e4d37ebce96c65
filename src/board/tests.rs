//! Store behavior under scripted remote outcomes

use super::*;
use crate::abstractions::{MockDealPersistence, PersistenceCall, PersistenceOp};
use crate::error::BoardError;
use proptest::prelude::*;
use std::sync::Arc;

fn deal(id: i64, stage: &str) -> Deal {
    Deal {
        id: DealId::from(id),
        company: format!("Company {id}"),
        stage: stage.to_string(),
        sourcer: None,
        partner: None,
        notes: None,
        last_updated: None,
    }
}

fn abc() -> Arc<StageRegistry> {
    Arc::new(StageRegistry::from_names(["A", "B", "C"]).unwrap())
}

fn stages(store: &DealStore) -> Vec<&str> {
    store.deals().iter().map(|d| d.stage.as_str()).collect()
}

fn ids(store: &DealStore) -> Vec<&str> {
    store.deals().iter().map(|d| d.id.as_str()).collect()
}

async fn loaded_store(records: Vec<Deal>) -> (Arc<MockDealPersistence>, DealStore) {
    let mock = Arc::new(MockDealPersistence::with_records(records));
    let mut store = DealStore::new(mock.clone(), abc());
    store.load().await.unwrap();
    (mock, store)
}

#[tokio::test]
async fn test_load_sorts_by_stage() {
    let (_, store) = loaded_store(vec![deal(1, "B"), deal(2, "A"), deal(3, "C")]).await;
    assert!(store.is_loaded());
    assert_eq!(stages(&store), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_load_is_stable_for_equal_stages() {
    let (_, store) = loaded_store(vec![
        deal(1, "B"),
        deal(2, "A"),
        deal(3, "B"),
        deal(4, "A"),
    ])
    .await;
    assert_eq!(ids(&store), vec!["2", "4", "1", "3"]);
}

#[tokio::test]
async fn test_load_failure_keeps_previous_collection() {
    let (mock, mut store) = loaded_store(vec![deal(1, "B"), deal(2, "A")]).await;
    let before = store.deals().to_vec();

    mock.records.lock().await.push(deal(3, "C"));
    mock.fail_next(PersistenceOp::List, "gateway timeout").await;

    let err = store.load().await.unwrap_err();
    assert!(err.is_remote());
    assert_eq!(store.deals(), before.as_slice());
}

#[tokio::test]
async fn test_load_drops_duplicate_ids() {
    let (_, store) = loaded_store(vec![deal(1, "B"), deal(1, "A"), deal(2, "C")]).await;
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(&DealId::from(1)).unwrap().stage, "B");
}

#[tokio::test]
async fn test_mutations_require_load() {
    let mock = Arc::new(MockDealPersistence::with_records(vec![deal(1, "A")]));
    let mut store = DealStore::new(mock.clone(), abc());

    let err = store.add_deal(DealDraft::new("Acme", "A")).await.unwrap_err();
    assert!(matches!(err, BoardError::NotLoaded));
    let err = store
        .update_field(&DealId::from(1), DealField::Stage, "B")
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::NotLoaded));
    let err = store.delete_deal(&DealId::from(1)).await.unwrap_err();
    assert!(matches!(err, BoardError::NotLoaded));

    assert!(mock.get_calls().await.is_empty());
}

#[tokio::test]
async fn test_stage_update_moves_deal_to_end() {
    let (mock, mut store) = loaded_store(vec![deal(1, "A"), deal(2, "B"), deal(3, "B")]).await;

    store
        .update_field(&DealId::from(2), DealField::Stage, "C")
        .await
        .unwrap();

    assert_eq!(store.get(&DealId::from(2)).unwrap().stage, "C");
    assert_eq!(ids(&store), vec!["1", "3", "2"]);
    assert_eq!(
        mock.get_calls().await.last(),
        Some(&PersistenceCall::Update {
            id: DealId::from(2),
            field: DealField::Stage,
            value: Some("C".to_string()),
        })
    );
}

#[tokio::test]
async fn test_stage_update_keeps_prior_order_within_stage() {
    let (_, mut store) = loaded_store(vec![deal(1, "A"), deal(2, "B"), deal(3, "C")]).await;

    store
        .update_field(&DealId::from(2), DealField::Stage, "C")
        .await
        .unwrap();

    // 2 was ahead of 3 before the move, so it stays ahead within C
    assert_eq!(ids(&store), vec!["1", "2", "3"]);
    assert_eq!(stages(&store), vec!["A", "C", "C"]);
}

#[tokio::test]
async fn test_update_leaves_other_fields_untouched() {
    let mut original = deal(1, "A");
    original.sourcer = Some("Tom".to_string());
    original.notes = Some("first call went well".to_string());
    let (_, mut store) = loaded_store(vec![original.clone()]).await;

    store
        .update_field(&DealId::from(1), DealField::Partner, "Ben")
        .await
        .unwrap();

    let updated = store.get(&DealId::from(1)).unwrap();
    assert_eq!(updated.partner.as_deref(), Some("Ben"));
    assert_eq!(updated.company, original.company);
    assert_eq!(updated.stage, original.stage);
    assert_eq!(updated.sourcer, original.sourcer);
    assert_eq!(updated.notes, original.notes);
    assert_eq!(updated.last_updated, original.last_updated);
}

#[tokio::test]
async fn test_empty_value_clears_optional_field() {
    let mut original = deal(1, "A");
    original.sourcer = Some("Intern".to_string());
    let (mock, mut store) = loaded_store(vec![original]).await;

    store
        .update_field(&DealId::from(1), DealField::Sourcer, "")
        .await
        .unwrap();

    assert_eq!(store.get(&DealId::from(1)).unwrap().sourcer, None);
    assert_eq!(mock.snapshot().await[0].sourcer, None);
}

#[tokio::test]
async fn test_failed_update_changes_nothing() {
    let (mock, mut store) = loaded_store(vec![deal(1, "A"), deal(2, "B")]).await;
    let before = store.deals().to_vec();
    mock.fail_next(PersistenceOp::Update, "permission denied").await;

    let err = store
        .update_field(&DealId::from(1), DealField::Stage, "C")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("permission denied"));
    assert_eq!(store.deals(), before.as_slice());
}

#[tokio::test]
async fn test_update_unknown_deal_skips_remote() {
    let (mock, mut store) = loaded_store(vec![deal(1, "A")]).await;
    let calls_before = mock.get_calls().await.len();

    let err = store
        .update_field(&DealId::from(99), DealField::Notes, "hello")
        .await
        .unwrap_err();

    assert!(matches!(err, BoardError::DealNotFound(id) if id == DealId::from(99)));
    assert_eq!(mock.get_calls().await.len(), calls_before);
}

#[tokio::test]
async fn test_failed_delete_keeps_deal() {
    let (mock, mut store) = loaded_store(vec![deal(4, "A"), deal(5, "B")]).await;
    let before = store.deals().to_vec();
    mock.fail_next(PersistenceOp::Delete, "row is locked").await;

    assert!(store.delete_deal(&DealId::from(5)).await.is_err());

    assert_eq!(store.deals(), before.as_slice());
    assert!(store.get(&DealId::from(5)).is_some());
}

#[tokio::test]
async fn test_delete_removes_deal() {
    let (mock, mut store) = loaded_store(vec![deal(4, "A"), deal(5, "B")]).await;

    store.delete_deal(&DealId::from(5)).await.unwrap();

    assert_eq!(ids(&store), vec!["4"]);
    assert_eq!(mock.snapshot().await.len(), 1);
}

#[tokio::test]
async fn test_add_deal_uses_persisted_record() {
    let (mock, mut store) = loaded_store(vec![deal(1, "A"), deal(2, "B"), deal(3, "C")]).await;
    mock.set_next_id(9);

    let added = store
        .add_deal(DealDraft::new("Acme", "A").with_sourcer("Stephen"))
        .await
        .unwrap();

    assert_eq!(added, vec![DealId::from(9)]);
    assert_eq!(ids(&store), vec!["1", "9", "2", "3"]);
    let acme = store.get(&DealId::from(9)).unwrap();
    assert_eq!(acme.company, "Acme");
    assert_eq!(acme.sourcer.as_deref(), Some("Stephen"));
    assert!(acme.last_updated.is_some());
}

#[tokio::test]
async fn test_failed_add_changes_nothing() {
    let (mock, mut store) = loaded_store(vec![deal(1, "A")]).await;
    let before = store.deals().to_vec();
    mock.fail_next(PersistenceOp::Insert, "violates not-null constraint")
        .await;

    let err = store.add_deal(DealDraft::new("Acme", "B")).await.unwrap_err();

    assert!(err.is_remote());
    assert_eq!(store.deals(), before.as_slice());
}

#[tokio::test]
async fn test_add_rejects_id_already_on_board() {
    let (mock, mut store) = loaded_store(vec![deal(1, "A"), deal(2, "B")]).await;
    let before = store.deals().to_vec();
    mock.set_next_id(2);

    let err = store.add_deal(DealDraft::new("Clash", "C")).await.unwrap_err();

    assert!(matches!(err, BoardError::DuplicateDeal(id) if id == DealId::from(2)));
    assert_eq!(store.deals(), before.as_slice());
}

#[tokio::test]
async fn test_unknown_stage_sorts_first() {
    let registry = Arc::new(StageRegistry::default());
    let mock = Arc::new(MockDealPersistence::with_records(vec![
        deal(1, "Memo"),
        deal(2, "Inbound Deals"),
        deal(3, "Dumpster"),
    ]));
    let mut store = DealStore::new(mock, registry);
    store.load().await.unwrap();

    store.add_deal(DealDraft::new("Mystery", "Unknown")).await.unwrap();

    assert_eq!(
        stages(&store),
        vec!["Unknown", "Inbound Deals", "Memo", "Dumpster"]
    );
}

#[tokio::test]
async fn test_view_filters_without_resorting() {
    let (_, store) = loaded_store(vec![
        deal(1, "C"),
        deal(2, "B"),
        deal(3, "B"),
        deal(4, "A"),
    ])
    .await;

    let all = store.view(&StageFilter::All);
    assert_eq!(all.len(), store.len());

    let b: Vec<_> = store
        .view(&StageFilter::Stage("B".to_string()))
        .iter()
        .map(|d| d.id.as_str())
        .collect();
    assert_eq!(b, vec!["2", "3"]);
}

#[derive(Debug, Clone)]
enum Mutation {
    Add(usize),
    Move(usize, usize),
    Delete(usize),
}

fn mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        (0usize..4).prop_map(Mutation::Add),
        (0usize..16, 0usize..4).prop_map(|(d, s)| Mutation::Move(d, s)),
        (0usize..16).prop_map(Mutation::Delete),
    ]
}

const STAGE_POOL: [&str; 4] = ["A", "B", "C", "Unknown"];

fn is_stage_sorted(store: &DealStore) -> bool {
    let registry = store.registry();
    store
        .deals()
        .windows(2)
        .all(|w| registry.index_of(&w[0].stage) <= registry.index_of(&w[1].stage))
}

proptest! {
    #[test]
    fn prop_store_stays_sorted(
        initial in prop::collection::vec(0usize..4, 0..12),
        mutations in prop::collection::vec((mutation(), any::<bool>()), 0..24),
    ) {
        tokio_test::block_on(async {
            let records = initial
                .iter()
                .enumerate()
                .map(|(i, s)| deal(i as i64 + 1, STAGE_POOL[*s]))
                .collect();
            let (mock, mut store) = loaded_store(records).await;
            prop_assert!(is_stage_sorted(&store));

            for (mutation, fail) in mutations {
                let before = store.deals().to_vec();
                let pick = |d: usize| before.get(d % before.len().max(1)).map(|d| d.id.clone());
                let (op, target) = match mutation {
                    Mutation::Add(_) => (PersistenceOp::Insert, None),
                    Mutation::Move(d, _) => (PersistenceOp::Update, pick(d)),
                    Mutation::Delete(d) => (PersistenceOp::Delete, pick(d)),
                };
                if op != PersistenceOp::Insert && target.is_none() {
                    continue;
                }
                if fail {
                    mock.fail_next(op, "scripted failure").await;
                }

                let result = match (mutation, target) {
                    (Mutation::Add(s), _) => store
                        .add_deal(DealDraft::new("Generated", STAGE_POOL[s]))
                        .await
                        .map(|_| ()),
                    (Mutation::Move(_, s), Some(id)) => {
                        store.update_field(&id, DealField::Stage, STAGE_POOL[s]).await
                    }
                    (Mutation::Delete(_), Some(id)) => store.delete_deal(&id).await,
                    _ => continue,
                };

                if fail {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(store.deals(), before.as_slice());
                } else {
                    prop_assert!(result.is_ok());
                }

                prop_assert!(is_stage_sorted(&store));

                // stability: deals sharing a stage keep their relative order
                for stage in STAGE_POOL {
                    let prior: Vec<_> = before
                        .iter()
                        .filter(|d| d.stage == stage)
                        .map(|d| d.id.clone())
                        .collect();
                    let now: Vec<_> = store
                        .deals()
                        .iter()
                        .filter(|d| d.stage == stage && prior.contains(&d.id))
                        .map(|d| d.id.clone())
                        .collect();
                    let prior_still_present: Vec<_> =
                        prior.into_iter().filter(|id| now.contains(id)).collect();
                    prop_assert_eq!(now, prior_still_present);
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_filter_partitions_collection(
        initial in prop::collection::vec(0usize..4, 0..20),
        selected in 0usize..4,
    ) {
        let deals: Vec<Deal> = initial
            .iter()
            .enumerate()
            .map(|(i, s)| deal(i as i64, STAGE_POOL[*s]))
            .collect();

        let all = filter(&deals, &StageFilter::All);
        prop_assert_eq!(all.len(), deals.len());

        let stage = STAGE_POOL[selected];
        let matching = filter(&deals, &StageFilter::Stage(stage.to_string()));
        prop_assert!(matching.iter().all(|d| d.stage == stage));

        let rest = deals.iter().filter(|d| d.stage != stage).count();
        prop_assert_eq!(matching.len() + rest, deals.len());
    }
}
