use chrono::NaiveDate;
use rex_domain::{
    ConflictDetection, ExpenseOwner, NewRecurringExpense, RecurringExpense,
    RecurringExpensePatch, StartDateShiftKind, YearMonth,
};
use uuid::Uuid;

use crate::{
    chain_warnings, CoreError, DeletionMode, DeletionOutcome, DeletionRequest, ExpenseLifecycle,
    MemoryExpenseStore, RecurringExpenseStore,
};

fn month(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

fn lifecycle() -> ExpenseLifecycle {
    ExpenseLifecycle::new(Box::new(MemoryExpenseStore::new()))
}

fn draft(start: YearMonth, end: Option<YearMonth>) -> NewRecurringExpense {
    let mut draft = NewRecurringExpense::new(
        ExpenseOwner::Employee(Uuid::new_v4()),
        "Parking",
        120.0,
        "usd",
        start,
    );
    draft.end = end;
    draft
}

fn add_sibling(
    engine: &ExpenseLifecycle,
    root: &RecurringExpense,
    start: YearMonth,
    end: Option<YearMonth>,
) -> RecurringExpense {
    let mut draft = root.successor_draft(start);
    draft.end = end;
    engine
        .store()
        .create(RecurringExpense::from_draft(Uuid::new_v4(), draft))
        .expect("create sibling")
}

fn current(year: i32, month: u32) -> DeletionRequest {
    DeletionRequest::new(DeletionMode::Current, year, month)
}

#[test]
fn create_marks_record_as_chain_root() {
    let engine = lifecycle();
    let record = engine.create(draft(month(2024, 3), None)).expect("create");
    assert_eq!(record.chain_id, record.id);
    assert_eq!(record.currency, "USD");
    assert_eq!(engine.chain(record.id).unwrap(), vec![record]);
}

#[test]
fn single_month_record_is_removed_entirely() {
    let engine = lifecycle();
    let record = engine
        .create(draft(month(2024, 6), Some(month(2024, 6))))
        .unwrap();

    let outcome = engine.delete_by_mode(record.id, current(2024, 6)).unwrap();
    assert!(matches!(outcome, DeletionOutcome::Deleted { .. }));
    assert!(engine.chain(record.chain_id).unwrap().is_empty());
}

#[test]
fn open_ended_record_is_split_around_the_month() {
    let engine = lifecycle();
    let record = engine.create(draft(month(2024, 1), None)).unwrap();

    engine.delete_by_mode(record.id, current(2024, 6)).unwrap();

    let chain = engine.chain(record.chain_id).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].id, record.id);
    assert_eq!(chain[0].start_month_key(), month(2024, 1));
    assert_eq!(chain[0].end_month_key(), Some(month(2024, 5)));
    assert_eq!(chain[1].start_month_key(), month(2024, 7));
    assert!(chain[1].is_open_ended());
    assert_eq!(chain[1].chain_id, record.id);
    assert_eq!(chain[1].owner, record.owner);
    assert_eq!(chain[1].value, record.value);
}

#[test]
fn deleting_a_deleted_record_reports_not_found() {
    let engine = lifecycle();
    let record = engine.create(draft(month(2024, 1), None)).unwrap();
    let request = DeletionRequest::new(DeletionMode::All, 2024, 1);

    engine.delete_by_mode(record.id, request).unwrap();
    let err = engine
        .delete_by_mode(record.id, request)
        .expect_err("second delete");
    assert!(matches!(err, CoreError::RecordNotFound(id) if id == record.id));
}

#[test]
fn unknown_mode_names_the_offending_value() {
    let err = DeletionRequest::parse("YESTERDAY", 2024, 1).expect_err("bad mode");
    assert_eq!(err.to_string(), "Unsupported deletion type: YESTERDAY");
}

#[test]
fn future_matches_the_head_of_a_current_split() {
    let engine = lifecycle();
    let truncated = engine.create(draft(month(2024, 1), None)).unwrap();
    let split = engine.create(draft(month(2024, 1), None)).unwrap();

    let future = engine
        .delete_by_mode(
            truncated.id,
            DeletionRequest::new(DeletionMode::Future, 2024, 8),
        )
        .unwrap();
    let split_outcome = engine.delete_by_mode(split.id, current(2024, 8)).unwrap();

    let DeletionOutcome::Truncated { record: future } = future else {
        panic!("expected truncation");
    };
    let DeletionOutcome::Split { truncated: head, .. } = split_outcome else {
        panic!("expected split");
    };
    assert_eq!(future.start_date, head.start_date);
    assert_eq!(future.end_date, head.end_date);
}

fn windows(chain: &[RecurringExpense]) -> Vec<(YearMonth, Option<YearMonth>, f64, String)> {
    chain
        .iter()
        .map(|record| {
            (
                record.start_month_key(),
                record.end_month_key(),
                record.value,
                record.currency.clone(),
            )
        })
        .collect()
}

#[test]
fn truncate_then_current_on_next_month_equals_future() {
    for (start, end, target) in [
        (month(2024, 1), None, month(2024, 6)),
        (month(2024, 1), Some(month(2024, 9)), month(2024, 6)),
        (month(2023, 10), None, month(2024, 1)),
    ] {
        let engine = lifecycle();
        let stepwise = engine.create(draft(start, end)).unwrap();
        let direct = engine.create(draft(start, end)).unwrap();
        let last_kept = target.previous();

        engine
            .store()
            .update(stepwise.id, &RecurringExpensePatch::end_at(last_kept))
            .unwrap();
        engine
            .delete_by_mode(stepwise.id, current(target.year(), target.month()))
            .unwrap();
        engine
            .delete_by_mode(
                direct.id,
                DeletionRequest::new(DeletionMode::Future, target.year(), target.month()),
            )
            .unwrap();

        let stepwise_chain = engine.chain(stepwise.chain_id).unwrap();
        let direct_chain = engine.chain(direct.chain_id).unwrap();
        assert_eq!(windows(&stepwise_chain), windows(&direct_chain));
        assert_eq!(
            windows(&direct_chain),
            vec![(start, Some(last_kept), 120.0, "USD".to_string())]
        );
    }
}

#[test]
fn classify_unchanged_start_is_no_change() {
    let engine = lifecycle();
    let record = engine.create(draft(month(2024, 3), None)).unwrap();
    let shift = engine
        .classify_start_date_shift(record.id, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        .unwrap();
    assert_eq!(shift.value, StartDateShiftKind::NoChange);
    assert!(shift.conflicts.is_empty());
}

#[test]
fn classify_increase_into_sibling_conflicts() {
    let engine = lifecycle();
    let root = engine
        .create(draft(month(2024, 1), Some(month(2024, 4))))
        .unwrap();
    let sibling = add_sibling(&engine, &root, month(2024, 5), None);

    let shift = engine
        .classify_start_date_shift(root.id, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
        .unwrap();
    assert_eq!(shift.value, StartDateShiftKind::IncreaseConflict);
    assert_eq!(shift.conflicts, vec![sibling]);
}

#[test]
fn classify_reduce_without_siblings_is_safe() {
    let engine = lifecycle();
    let root = engine.create(draft(month(2024, 6), None)).unwrap();
    let shift = engine
        .classify_start_date_shift(root.id, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        .unwrap();
    assert_eq!(shift.value, StartDateShiftKind::ReduceSafe);
    assert!(shift.conflicts.is_empty());
}

#[test]
fn policy_is_forwarded_to_the_classifier() {
    let engine = lifecycle().with_conflict_detection(ConflictDetection::IntervalOverlap);
    let root = engine
        .create(draft(month(2024, 5), Some(month(2024, 5))))
        .unwrap();
    add_sibling(&engine, &root, month(2023, 1), Some(month(2026, 1)));

    let shift = engine
        .classify_start_date_shift(root.id, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
        .unwrap();
    assert_eq!(shift.value, StartDateShiftKind::ReduceConflict);
}

#[test]
fn chains_stay_disjoint_across_deletion_sequences() {
    let targets = [
        (2024, 6),
        (2024, 1),
        (2024, 12),
        (2025, 3),
        (2024, 7),
        (2025, 1),
        (2024, 2),
        (2026, 6),
        (2024, 3),
    ];

    for rotation in 0..targets.len() {
        let engine = lifecycle();
        let root = engine.create(draft(month(2024, 1), None)).unwrap();

        for step in 0..targets.len() {
            let (year, month_no) = targets[(rotation + step) % targets.len()];
            let target = month(year, month_no);
            let chain = engine.chain(root.chain_id).unwrap();
            let Some(owner) = chain.iter().find(|record| record.covers(target)) else {
                continue;
            };
            let mode = if step % 4 == 3 {
                DeletionMode::Future
            } else {
                DeletionMode::Current
            };
            engine
                .delete_by_mode(owner.id, DeletionRequest::new(mode, year, month_no))
                .unwrap();

            let chain = engine.chain(root.chain_id).unwrap();
            assert!(
                chain_warnings(&chain).is_empty(),
                "rotation {rotation} step {step}: {:?}",
                chain_warnings(&chain)
            );
            assert!(chain.iter().all(|record| !record.covers(target)));
            assert!(chain.iter().all(|record| record.chain_id == root.id));
        }
    }
}

#[test]
fn monthly_totals_follow_the_chain_after_a_split() {
    let engine = lifecycle();
    let record = engine
        .create(draft(month(2024, 1), Some(month(2024, 4))))
        .unwrap();
    engine.delete_by_mode(record.id, current(2024, 2)).unwrap();

    let totals = engine
        .monthly_totals(Some(record.owner), month(2024, 1), month(2024, 4))
        .unwrap();
    let months: Vec<String> = totals.iter().map(|t| t.month.to_string()).collect();
    assert_eq!(months, ["2024-01", "2024-03", "2024-04"]);
    assert!(engine.chain_warnings(record.chain_id).unwrap().is_empty());
}

#[test]
fn split_share_is_served_for_flagged_organization_expenses() {
    let engine = lifecycle();
    let mut org_draft = draft(month(2024, 1), None).split();
    org_draft.owner = ExpenseOwner::Organization(Uuid::new_v4());
    let shared = engine.create(org_draft).unwrap();
    let plain = engine.create(draft(month(2024, 1), None)).unwrap();

    let share = engine.split_share(shared.id, 3).unwrap();
    assert_eq!(share.id, shared.id);
    assert_eq!(share.share, 40.0);
    assert!(matches!(
        engine.split_share(plain.id, 3),
        Err(CoreError::InvalidOperation(_))
    ));
    assert!(matches!(
        engine.split_share(Uuid::new_v4(), 3),
        Err(CoreError::RecordNotFound(_))
    ));
}
