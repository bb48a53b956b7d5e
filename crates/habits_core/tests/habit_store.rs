use habits_core::db::{open_db, open_db_in_memory};
use habits_core::{
    HabitListQuery, HabitRepository, NewHabit, RepoError, RolloverReport, SqliteHabitRepository,
};
use rusqlite::params;
use uuid::Uuid;

const T0: i64 = 1_700_000_000_000;

#[test]
fn create_assigns_identity_and_defaults() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::new(&conn);

    let created = repo
        .create_habit(&NewHabit::new("Exercise", true, "30 min"), T0)
        .unwrap();
    assert_eq!(created.created_at, T0);
    assert!(!created.goal_fulfilled);
    assert_eq!(created.progress_days, 0);
    assert!(!created.archived);

    let loaded = repo.get_habit(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn create_accepts_empty_text() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::new(&conn);

    let created = repo.create_habit(&NewHabit::new("", false, ""), T0).unwrap();
    assert_eq!(repo.get_habit(created.id).unwrap().unwrap().name, "");
}

#[test]
fn update_persists_full_state_but_not_created_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::new(&conn);

    let mut habit = repo
        .create_habit(&NewHabit::new("Smoke", false, "zero"), T0)
        .unwrap();
    habit.name = "No smoking".to_string();
    habit.goal = "none at all".to_string();
    habit.is_good = true;
    habit.goal_fulfilled = true;
    habit.progress_days = 4;
    habit.archived = true;
    habit.created_at = T0 + 99;
    repo.update_habit(&habit).unwrap();

    let loaded = repo.get_habit(habit.id).unwrap().unwrap();
    assert_eq!(loaded.name, "No smoking");
    assert_eq!(loaded.goal, "none at all");
    assert!(loaded.is_good);
    assert!(loaded.goal_fulfilled);
    assert_eq!(loaded.progress_days, 4);
    assert!(loaded.archived);
    assert_eq!(loaded.created_at, T0);
}

#[test]
fn update_and_delete_of_missing_habit_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::new(&conn);

    let mut ghost = repo
        .create_habit(&NewHabit::new("Ghost", true, "boo"), T0)
        .unwrap();
    repo.delete_habit(ghost.id).unwrap();

    ghost.goal_fulfilled = true;
    let update_err = repo.update_habit(&ghost).unwrap_err();
    assert!(matches!(update_err, RepoError::NotFound(id) if id == ghost.id));

    let delete_err = repo.delete_habit(ghost.id).unwrap_err();
    assert!(matches!(delete_err, RepoError::NotFound(id) if id == ghost.id));
    assert!(repo.get_habit(ghost.id).unwrap().is_none());
}

#[test]
fn list_partitions_by_archived_flag() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::new(&conn);

    let active = repo
        .create_habit(&NewHabit::new("Read", true, "10 pages"), T0)
        .unwrap();
    let mut archived = repo
        .create_habit(&NewHabit::new("Snack", false, "no chips"), T0)
        .unwrap();
    archived.archived = true;
    repo.update_habit(&archived).unwrap();

    let active_list = repo.list_habits(&HabitListQuery::active()).unwrap();
    assert_eq!(active_list.len(), 1);
    assert_eq!(active_list[0].id, active.id);

    let archived_list = repo.list_habits(&HabitListQuery::archived()).unwrap();
    assert_eq!(archived_list.len(), 1);
    assert_eq!(archived_list[0].id, archived.id);

    assert_eq!(repo.list_habits(&HabitListQuery::all()).unwrap().len(), 2);
}

#[test]
fn list_orders_by_case_sensitive_name_then_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::new(&conn);

    for name in ["walk", "Yoga", "Meditate", "Yoga", "apple"] {
        repo.create_habit(&NewHabit::new(name, true, "daily"), T0)
            .unwrap();
    }

    let listed = repo.list_habits(&HabitListQuery::active()).unwrap();
    let names: Vec<&str> = listed.iter().map(|habit| habit.name.as_str()).collect();
    // Uppercase sorts before lowercase under ordinal comparison.
    assert_eq!(names, vec!["Meditate", "Yoga", "Yoga", "apple", "walk"]);
    assert!(listed[1].id.to_string() < listed[2].id.to_string());
}

#[test]
fn invalid_persisted_rows_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO habits (uuid, name, is_good, goal, created_at)
         VALUES (?1, 'broken', 1, 'g', ?2);",
        params!["not-a-uuid", T0],
    )
    .unwrap();

    let repo = SqliteHabitRepository::new(&conn);
    let err = repo.list_habits(&HabitListQuery::active()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("habits.uuid")));
}

#[test]
fn get_unknown_id_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::new(&conn);
    assert!(repo.get_habit(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn rollover_history_returns_latest_run() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::new(&conn);
    assert!(repo.last_rollover().unwrap().is_none());

    let first = RolloverReport {
        ran_at: T0,
        scanned: 3,
        advanced: 1,
    };
    let second = RolloverReport {
        ran_at: T0 + 10,
        scanned: 2,
        advanced: 0,
    };
    repo.record_rollover(&first).unwrap();
    repo.record_rollover(&second).unwrap();

    assert_eq!(repo.last_rollover().unwrap(), Some(second));
}

#[test]
fn habits_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habits.db");

    let expected = {
        let conn = open_db(&path).unwrap();
        let repo = SqliteHabitRepository::new(&conn);
        let mut habit = repo
            .create_habit(&NewHabit::new("Journal", true, "one page"), T0)
            .unwrap();
        habit.goal_fulfilled = true;
        habit.progress_days = 12;
        repo.update_habit(&habit).unwrap();
        habit
    };

    let conn = open_db(&path).unwrap();
    let repo = SqliteHabitRepository::new(&conn);
    assert_eq!(repo.get_habit(expected.id).unwrap(), Some(expected));
}
