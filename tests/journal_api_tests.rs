//! Integration tests for the asynchronous journal API.
//!
//! Each test opens a fresh database file in a temporary directory, so the
//! pool, the connection customizer and the bootstrap run exactly as they do
//! in the binary.

use chrono::NaiveDate;
use daybook::db::entries::NewEntry;
use daybook::db::search::SearchFilter;
use daybook::errors::AppError;
use daybook::Journal;
use tempfile::TempDir;

async fn open_journal() -> (Journal, TempDir) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let db_path = temp_dir.path().join("nested").join("daybook.db");
    let journal = Journal::open(db_path, 4).await.expect("open journal");
    (journal, temp_dir)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn mood_id(journal: &Journal, name: &str) -> i64 {
    journal
        .find_mood_by_name(name.to_string())
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("mood {} is seeded", name))
        .id
}

async fn tag_id(journal: &Journal, name: &str) -> i64 {
    journal
        .find_tag_by_name(name.to_string())
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("tag {} exists", name))
        .id
}

#[tokio::test]
async fn test_second_entry_for_same_day_conflicts() {
    let (journal, _dir) = open_journal().await;

    let morning = day(2024, 2, 10).and_hms_opt(8, 15, 0).unwrap();
    let evening = day(2024, 2, 10).and_hms_opt(22, 45, 0).unwrap();

    let first = journal
        .create_entry(NewEntry::at("Morning", "Early start", morning))
        .await
        .unwrap();
    let second = journal
        .create_entry(NewEntry::at("Evening", "Late finish", evening))
        .await;

    assert!(matches!(second, Err(AppError::Conflict(_))));
    let all = journal.list_entries().await.unwrap();
    assert_eq!(all, vec![first]);
}

#[tokio::test]
async fn test_update_date_rules() {
    let (journal, _dir) = open_journal().await;

    let a = journal
        .create_entry(NewEntry::new("A", "a", day(2024, 3, 1)))
        .await
        .unwrap();
    let b = journal
        .create_entry(NewEntry::new("B", "b", day(2024, 3, 2)))
        .await
        .unwrap();

    let mut moved = b.clone();
    moved.entry_date = a.entry_date;
    assert!(matches!(
        journal.update_entry(moved).await,
        Err(AppError::Conflict(_))
    ));
    assert_eq!(journal.get_entry_by_id(b.id).await.unwrap(), Some(b.clone()));

    let mut same_day = b.clone();
    same_day.content = "b, revised".to_string();
    let updated = journal.update_entry(same_day).await.unwrap();
    assert_eq!(updated.entry_date, b.entry_date);
    assert_eq!(updated.created_at, b.created_at);
    assert!(updated.updated_at > b.updated_at);
}

#[tokio::test]
async fn test_update_unknown_entry_is_not_found() {
    let (journal, _dir) = open_journal().await;

    let entry = journal
        .create_entry(NewEntry::new("A", "a", day(2024, 3, 1)))
        .await
        .unwrap();
    let mut ghost = entry;
    ghost.id += 100;

    assert!(matches!(
        journal.update_entry(ghost).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_too_many_secondary_moods_keeps_previous_set() {
    let (journal, _dir) = open_journal().await;
    let entry = journal
        .create_entry(NewEntry::new("A", "a", day(2024, 4, 1)))
        .await
        .unwrap();

    let happy = mood_id(&journal, "Happy").await;
    let calm = mood_id(&journal, "Calm").await;
    let curious = mood_id(&journal, "Curious").await;
    let bored = mood_id(&journal, "Bored").await;
    let sad = mood_id(&journal, "Sad").await;

    journal.set_moods(entry.id, happy, vec![calm]).await.unwrap();
    let before = journal.get_moods(entry.id).await.unwrap();

    let result = journal
        .set_moods(entry.id, sad, vec![calm, curious, bored])
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(journal.get_moods(entry.id).await.unwrap(), before);
}

#[tokio::test]
async fn test_set_moods_replaces_whole_set() {
    let (journal, _dir) = open_journal().await;
    let entry = journal
        .create_entry(NewEntry::new("A", "a", day(2024, 4, 2)))
        .await
        .unwrap();

    let grateful = mood_id(&journal, "Grateful").await;
    let curious = mood_id(&journal, "Curious").await;
    let calm = mood_id(&journal, "Calm").await;
    let anxious = mood_id(&journal, "Anxious").await;

    journal
        .set_moods(entry.id, grateful, vec![curious, calm])
        .await
        .unwrap();
    let moods = journal.get_moods(entry.id).await.unwrap();
    assert_eq!(moods.primary.map(|m| m.id), Some(grateful));
    let secondary: Vec<i64> = moods.secondary.iter().map(|m| m.id).collect();
    assert_eq!(secondary, vec![curious, calm]);

    journal.set_moods(entry.id, anxious, vec![]).await.unwrap();
    let moods = journal.get_moods(entry.id).await.unwrap();
    assert_eq!(moods.primary.map(|m| m.name), Some("Anxious".to_string()));
    assert!(moods.secondary.is_empty());
}

#[tokio::test]
async fn test_tag_names_are_case_insensitive() {
    let (journal, _dir) = open_journal().await;

    let tag = journal.create_tag("  gardening ".to_string()).await.unwrap();
    assert_eq!(tag.name, "gardening");
    assert!(!tag.is_pre_built);

    assert!(matches!(
        journal.create_tag("GARDENING".to_string()).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        journal.create_tag("work".to_string()).await,
        Err(AppError::Conflict(_))
    ));
    journal.create_tag("Ökologie".to_string()).await.unwrap();
    assert!(matches!(
        journal.create_tag("ökologie".to_string()).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        journal.create_tag("   ".to_string()).await,
        Err(AppError::Validation(_))
    ));

    let tags = journal.list_tags().await.unwrap();
    assert_eq!(tags.len(), 12);
    assert!(tags[..10].iter().all(|t| t.is_pre_built));
    assert_eq!(tags[10].name, "gardening");
    assert_eq!(tags[11].name, "Ökologie");
}

#[tokio::test]
async fn test_set_tags_normalizes_input() {
    let (journal, _dir) = open_journal().await;
    let entry = journal
        .create_entry(NewEntry::new("A", "a", day(2024, 5, 1)))
        .await
        .unwrap();

    let work = tag_id(&journal, "Work").await;
    let health = tag_id(&journal, "Health").await;

    journal
        .set_tags(entry.id, vec![work, -1, health, work, 0])
        .await
        .unwrap();
    let names: Vec<String> = journal
        .get_tags(entry.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["Health", "Work"]);

    journal.set_tags(entry.id, vec![]).await.unwrap();
    assert!(journal.get_tags(entry.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_combines_dimensions() {
    let (journal, _dir) = open_journal().await;

    let happy = mood_id(&journal, "Happy").await;
    let sad = mood_id(&journal, "Sad").await;
    let work = tag_id(&journal, "Work").await;
    let travel = tag_id(&journal, "Travel").await;

    let both = journal
        .create_entry(NewEntry::new("Offsite", "Team trip to the coast", day(2024, 6, 1)))
        .await
        .unwrap();
    journal.set_moods(both.id, happy, vec![]).await.unwrap();
    journal.set_tags(both.id, vec![work, travel]).await.unwrap();

    let mood_only = journal
        .create_entry(NewEntry::new("Sunday", "Slow morning", day(2024, 6, 2)))
        .await
        .unwrap();
    journal.set_moods(mood_only.id, sad, vec![happy]).await.unwrap();

    let tag_only = journal
        .create_entry(NewEntry::new("Deadline", "Shipped the release", day(2024, 6, 3)))
        .await
        .unwrap();
    journal.set_tags(tag_only.id, vec![work]).await.unwrap();

    let hits = journal
        .search(SearchFilter::new().mood_ids([happy]).tag_ids([work]))
        .await
        .unwrap();
    assert_eq!(hits, vec![both.clone()]);

    // Matches through a secondary mood and both tags, still listed once each.
    let hits = journal
        .search(SearchFilter::new().mood_ids([happy, sad]))
        .await
        .unwrap();
    let ids: Vec<i64> = hits.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![mood_only.id, both.id]);

    let hits = journal
        .search(SearchFilter::new().tag_ids([work, travel]))
        .await
        .unwrap();
    let ids: Vec<i64> = hits.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![tag_only.id, both.id]);

    let hits = journal
        .search(
            SearchFilter::new()
                .text("COAST")
                .start_date(day(2024, 6, 1))
                .end_date(day(2024, 6, 1)),
        )
        .await
        .unwrap();
    assert_eq!(hits, vec![both]);

    assert_eq!(
        journal.search(SearchFilter::new()).await.unwrap(),
        journal.list_entries().await.unwrap()
    );
}

#[tokio::test]
async fn test_delete_removes_associations() {
    let (journal, _dir) = open_journal().await;
    let entry = journal
        .create_entry(NewEntry::new("A", "a", day(2024, 7, 1)))
        .await
        .unwrap();

    let happy = mood_id(&journal, "Happy").await;
    let calm = mood_id(&journal, "Calm").await;
    let family = tag_id(&journal, "Family").await;
    journal.set_moods(entry.id, happy, vec![calm]).await.unwrap();
    journal.set_tags(entry.id, vec![family]).await.unwrap();

    assert!(journal.delete_entry(entry.id).await.unwrap());
    assert!(!journal.delete_entry(entry.id).await.unwrap());

    let moods = journal.get_moods(entry.id).await.unwrap();
    assert!(moods.primary.is_none());
    assert!(moods.secondary.is_empty());
    assert!(journal.get_tags(entry.id).await.unwrap().is_empty());
    assert!(journal
        .get_entry_by_date(entry.entry_date)
        .await
        .unwrap()
        .is_none());

    // The day is free again.
    journal
        .create_entry(NewEntry::new("A again", "a", day(2024, 7, 1)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reopening_does_not_duplicate_seed_data() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("daybook.db");

    let first = Journal::open(db_path.clone(), 2).await.unwrap();
    let moods_before = first.list_moods().await.unwrap();
    let tags_before = first.list_tags().await.unwrap();
    drop(first);

    let second = Journal::open(db_path.clone(), 2).await.unwrap();
    second.database().initialize_schema().unwrap();

    assert_eq!(second.list_moods().await.unwrap(), moods_before);
    assert_eq!(second.list_tags().await.unwrap(), tags_before);
    assert_eq!(moods_before.len(), 15);
    assert_eq!(tags_before.len(), 10);
}

#[tokio::test]
async fn test_moods_listed_by_category_then_name() {
    let (journal, _dir) = open_journal().await;
    let moods = journal.list_moods().await.unwrap();

    let names: Vec<&str> = moods.iter().take(5).map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Angry", "Anxious", "Lonely", "Sad", "Stressed"]);
    assert_eq!(moods[5].name, "Bored");
    assert_eq!(moods[10].name, "Confident");

    let mut categories: Vec<&str> = moods.iter().map(|m| m.category.as_str()).collect();
    categories.dedup();
    assert_eq!(categories, vec!["Negative", "Neutral", "Positive"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_keep_one_entry_per_day() {
    let (journal, _dir) = open_journal().await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let journal = journal.clone();
        handles.push(tokio::spawn(async move {
            journal
                .create_entry(NewEntry::new(format!("Try {}", i), "race", day(2024, 8, 1)))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(journal.list_entries().await.unwrap().len(), 1);
}
