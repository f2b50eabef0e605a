use chrono::Utc;
use counters::config::DatabaseConfig;
use counters::{
    Counter, CounterChanges, Database, Entry, Interval, NewCounter, NewEntry, StoreError,
};

const DAY: i64 = 86_400;

fn db() -> Database {
    Database::open_in_memory().unwrap()
}

#[test]
fn create_returns_first_row_with_last_insert_id() {
    let db = db();
    let counter = Counter::create(&db, &[NewCounter::new("Water", 8, Interval::Daily).with_days(62)]).unwrap();
    assert_eq!(counter.id, 1);
    assert_eq!(counter.title, "Water");
    assert_eq!(counter.days, Some(62));

    let stored = Counter::find(&db, None).unwrap();
    assert_eq!(stored, vec![counter]);
}

#[test]
fn create_without_rows_is_validation_error() {
    let err = Counter::create(&db(), &[]).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Validation error: Incomplete input in INSERT");
}

#[test]
fn find_filters_by_interval() {
    let db = db();
    Counter::create(
        &db,
        &[
            NewCounter::new("Run", 1, Interval::Daily),
            NewCounter::new("Call home", 1, Interval::Weekly),
            NewCounter::new("Books", 0, Interval::Lifetime),
        ],
    )
    .unwrap();

    let weekly = Counter::find(&db, Some(Interval::Weekly)).unwrap();
    assert_eq!(weekly.len(), 1);
    assert_eq!(weekly[0].title, "Call home");
    assert_eq!(Counter::find(&db, Some(Interval::Lifetime)).unwrap()[0].title, "Books");
    assert!(Counter::find(&db, Some(Interval::Yearly)).unwrap().is_empty());
    assert_eq!(Counter::find(&db, None).unwrap().len(), 3);
}

#[test]
fn update_applies_changes_locally() {
    let db = db();
    let mut counter = Counter::create(&db, &[NewCounter::new("Run", 1, Interval::Daily)]).unwrap();

    let changed = counter
        .update(
            &db,
            CounterChanges {
                title: Some("Run 5k".to_string()),
                interval: Some(Interval::Weekly),
                days: Some(Some(127)),
                ..CounterChanges::default()
            },
        )
        .unwrap();
    assert_eq!(changed, 1);
    assert_eq!(counter.title, "Run 5k");
    assert_eq!(counter.interval, Interval::Weekly);
    assert_eq!(Counter::find(&db, None).unwrap(), vec![counter.clone()]);

    let err = counter.update(&db, CounterChanges::default()).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn update_of_missing_counter_changes_nothing() {
    let db = db();
    let mut ghost = Counter::create(&db, &[NewCounter::new("Ghost", 1, Interval::Daily)]).unwrap();
    ghost.delete(&db).unwrap();

    let changed = ghost
        .update(
            &db,
            CounterChanges {
                goal: Some(9),
                ..CounterChanges::default()
            },
        )
        .unwrap();
    assert_eq!(changed, 0);
    assert_eq!(ghost.goal, 1);
}

#[test]
fn value_counts_current_bucket_only() {
    let db = db();
    let daily = Counter::create(&db, &[NewCounter::new("Daily", 1, Interval::Daily)]).unwrap();
    let lifetime = Counter::create(&db, &[NewCounter::new("Total", 1, Interval::Lifetime)]).unwrap();
    let now = Utc::now().timestamp();

    Entry::create(
        &db,
        &[
            NewEntry::new(daily.id, now),
            NewEntry::new(daily.id, now - 3 * DAY),
            NewEntry::new(lifetime.id, now),
            NewEntry::new(lifetime.id, now - 400 * DAY),
        ],
    )
    .unwrap();

    assert_eq!(daily.value(&db).unwrap(), 1);
    assert_eq!(lifetime.value(&db).unwrap(), 2);
    assert!(Entry::count_by_counter_id(&db, daily.id, Interval::Yearly).unwrap() >= 1);
}

#[test]
fn increase_and_decrease() {
    let db = db();
    let counter = Counter::create(&db, &[NewCounter::new("Push-ups", 2, Interval::Daily)]).unwrap();

    let first = counter.increase(&db).unwrap();
    let second = counter.increase(&db).unwrap();
    assert!(second.id > first.id);
    assert_eq!(counter.value(&db).unwrap(), 2);

    assert_eq!(counter.decrease(&db).unwrap(), Some(second));
    assert_eq!(counter.value(&db).unwrap(), 1);
    assert_eq!(Entry::find_last_by_counter_id(&db, counter.id).unwrap(), Some(first));

    assert_eq!(counter.decrease(&db).unwrap(), Some(first));
    assert_eq!(counter.decrease(&db).unwrap(), None);
    assert_eq!(counter.value(&db).unwrap(), 0);
}

#[test]
fn decrease_leaves_past_buckets_alone() {
    let db = db();
    let counter = Counter::create(&db, &[NewCounter::new("Walk", 1, Interval::Daily)]).unwrap();
    Entry::create(&db, &[NewEntry::new(counter.id, Utc::now().timestamp() - 2 * DAY)]).unwrap();

    assert_eq!(counter.decrease(&db).unwrap(), None);
    assert!(Entry::find_last_by_counter_id(&db, counter.id).unwrap().is_some());
}

#[test]
fn decrease_skips_backdated_entries() {
    let db = db();
    let counter = Counter::create(&db, &[NewCounter::new("Walk", 1, Interval::Daily)]).unwrap();
    let today = counter.increase(&db).unwrap();
    let backdated = Entry::create(&db, &[NewEntry::new(counter.id, Utc::now().timestamp() - 3 * DAY)]).unwrap();

    assert_eq!(counter.decrease(&db).unwrap(), Some(today));
    assert_eq!(counter.decrease(&db).unwrap(), None);
    assert_eq!(Entry::find_last_by_counter_id(&db, counter.id).unwrap(), Some(backdated));
}

#[test]
fn deleting_counter_cascades_to_entries() {
    let db = db();
    let counter = Counter::create(&db, &[NewCounter::new("Tea", 1, Interval::Daily)]).unwrap();
    counter.increase(&db).unwrap();
    counter.increase(&db).unwrap();

    assert_eq!(counter.delete(&db).unwrap(), 1);
    assert_eq!(Entry::count_by_counter_id(&db, counter.id, Interval::Lifetime).unwrap(), 0);
}

#[test]
fn entry_deletion() {
    let db = db();
    let counter = Counter::create(&db, &[NewCounter::new("Tea", 1, Interval::Lifetime)]).unwrap();
    let entry = Entry::create(&db, &[NewEntry::new(counter.id, 10), NewEntry::new(counter.id, 20)]).unwrap();
    assert_eq!(entry.created, 10);

    assert_eq!(entry.delete(&db).unwrap(), 1);
    assert_eq!(Entry::delete_by_counter_id(&db, counter.id).unwrap(), 1);
    assert_eq!(counter.value(&db).unwrap(), 0);
}

#[test]
fn entry_for_missing_counter_is_constraint_error() {
    let err = Entry::create(&db(), &[NewEntry::new(99, 0)]).unwrap_err();
    assert!(err.is_constraint(), "{err:?}");
}

#[tokio::test]
async fn async_models() {
    let db = db();
    let counter = Counter::create_async(&db, &[NewCounter::new("Async", 1, Interval::Monthly)])
        .await
        .unwrap();
    Entry::create_async(&db, &[NewEntry::new(counter.id, 100), NewEntry::new(counter.id, 200)])
        .await
        .unwrap();

    let found = Counter::find_async(&db, Some(Interval::Monthly)).await.unwrap();
    assert_eq!(found, vec![counter.clone()]);

    let entries = Entry::select_by_counter_id_async(&db, counter.id).await.unwrap();
    assert_eq!(
        entries.iter().map(|e| e.created).collect::<Vec<_>>(),
        vec![100, 200]
    );

    assert!(Counter::create_async(&db, &[]).await.unwrap_err().is_validation());
}

#[test]
fn file_database_persists_across_opens() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig::file(dir.path().join("nested").join("counters.db"));

    let counter = {
        let db = Database::open(&config).unwrap();
        let counter = Counter::create(&db, &[NewCounter::new("Stretch", 1, Interval::Daily)]).unwrap();
        counter.increase(&db).unwrap();
        counter
    };

    let db = Database::open(&config).unwrap();
    assert_eq!(
        db.applied_migrations().unwrap(),
        vec!["initial_schema".to_string(), "custom_days".to_string()]
    );
    assert_eq!(Counter::find(&db, None).unwrap(), vec![counter.clone()]);
    assert_eq!(counter.value(&db).unwrap(), 1);
}
