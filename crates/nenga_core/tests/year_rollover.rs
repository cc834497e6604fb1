use nenga_core::db::open_db_in_memory;
use nenga_core::{
    AddressInput, AddressStore, DisabledPersonPolicy, ErrorKind, MourningStatus, NengaLedger,
    NewAddress, NewPerson, PersonRepository, PrintingStatus, ReceivedStatus, RepoError,
    RolloverService, SqliteAddressStore, SqliteNengaLedger, SqlitePersonRepository,
    SqliteYearRepository, YearRepository,
};
use rusqlite::Connection;

fn seed_person(conn: &Connection, family: &str, given: &str, addresses: usize) -> i64 {
    let person = SqlitePersonRepository::new(conn)
        .create_person(&NewPerson::new(family, given).unwrap())
        .unwrap();
    let store = SqliteAddressStore::new(conn);
    for n in 0..addresses {
        let address = NewAddress::parse(&AddressInput {
            family_name: family.to_string(),
            given_name: given.to_string(),
            zipcode: "1000001".to_string(),
            address1: format!("千代田区{n}"),
            ..AddressInput::default()
        })
        .unwrap();
        store.add_address(person.id, &address, true).unwrap();
    }
    person.id
}

fn count_nenga(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM nenga;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn rollover_seeds_one_record_per_current_address_with_defaults() {
    let conn = open_db_in_memory().unwrap();
    seed_person(&conn, "山田", "太郎", 2);
    seed_person(&conn, "佐藤", "花子", 1);
    seed_person(&conn, "鈴木", "次郎", 0);

    let created = RolloverService::new(SqliteYearRepository::new(&conn))
        .initialize_year(2025)
        .unwrap();

    assert_eq!(created.record_count, 2);
    assert_eq!(created.year.year, 2025);
    assert!(!created.year.locked);

    let entries = SqliteNengaLedger::new(&conn).list_entries_by_year(2025).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.windows(2).all(|pair| pair[0].record.id < pair[1].record.id));
    assert!(entries
        .windows(2)
        .all(|pair| pair[0].address.id < pair[1].address.id));
    for entry in &entries {
        assert!(entry.address.is_current);
        assert_eq!(entry.record.printing, PrintingStatus::Sent);
        assert_eq!(entry.record.received, ReceivedStatus::NotReceived);
        assert_eq!(entry.record.mourning, MourningStatus::Normal);
    }
}

#[test]
fn repeated_rollover_is_rejected_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    seed_person(&conn, "山田", "太郎", 1);
    let rollover = RolloverService::new(SqliteYearRepository::new(&conn));

    rollover.initialize_year(2025).unwrap();
    let before = count_nenga(&conn);
    seed_person(&conn, "佐藤", "花子", 1);

    let err = rollover.initialize_year(2025).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyInitialized(2025)));
    assert_eq!(err.kind(), ErrorKind::AlreadyInitialized);
    assert_eq!(count_nenga(&conn), before);
}

#[test]
fn disabled_people_follow_the_policy() {
    let conn = open_db_in_memory().unwrap();
    seed_person(&conn, "山田", "太郎", 1);
    let dormant = seed_person(&conn, "佐藤", "花子", 1);
    SqlitePersonRepository::new(&conn)
        .set_person_disabled(dormant, true)
        .unwrap();
    let years = SqliteYearRepository::new(&conn);

    let excluded = years
        .initialize_year(2025, DisabledPersonPolicy::Exclude)
        .unwrap();
    let included = years
        .initialize_year(2026, DisabledPersonPolicy::Include)
        .unwrap();

    assert_eq!(excluded.record_count, 1);
    assert_eq!(included.record_count, 2);
}

#[test]
fn default_policy_excludes_disabled_people() {
    let conn = open_db_in_memory().unwrap();
    let rollover = RolloverService::new(SqliteYearRepository::new(&conn));
    assert_eq!(rollover.policy(), DisabledPersonPolicy::Exclude);
}

#[test]
fn rollover_with_no_addresses_still_creates_the_year() {
    let conn = open_db_in_memory().unwrap();
    let rollover = RolloverService::new(SqliteYearRepository::new(&conn));

    let created = rollover.initialize_next_year(2024).unwrap();

    assert_eq!(created.year.year, 2025);
    assert_eq!(created.record_count, 0);
    let years: Vec<_> = rollover
        .list_years()
        .unwrap()
        .into_iter()
        .map(|year| year.year)
        .collect();
    assert_eq!(years, vec![2025]);
    assert!(SqliteNengaLedger::new(&conn)
        .list_by_year(2025)
        .unwrap()
        .is_empty());
}

#[test]
fn years_can_be_locked_and_unlocked() {
    let conn = open_db_in_memory().unwrap();
    let rollover = RolloverService::new(SqliteYearRepository::new(&conn));
    rollover.initialize_year(2025).unwrap();

    rollover.set_year_locked(2025, true).unwrap();
    assert!(rollover.get_year(2025).unwrap().unwrap().locked);
    rollover.set_year_locked(2025, false).unwrap();
    assert!(!rollover.get_year(2025).unwrap().unwrap().locked);

    let err = rollover.set_year_locked(1999, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn failed_rollover_leaves_no_year_and_no_records() {
    let conn = open_db_in_memory().unwrap();
    for given in ["太郎", "花子", "次郎"] {
        seed_person(&conn, "山田", given, 1);
    }
    conn.execute_batch(
        "CREATE TRIGGER fail_third_nenga BEFORE INSERT ON nenga
         WHEN (SELECT COUNT(*) FROM nenga) >= 2
         BEGIN
             SELECT RAISE(ABORT, 'third insert rejected');
         END;",
    )
    .unwrap();
    let years = SqliteYearRepository::new(&conn);

    let err = years
        .initialize_year(2025, DisabledPersonPolicy::Exclude)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StorageError);
    assert!(years.list_years().unwrap().is_empty());
    assert_eq!(years.get_year(2025).unwrap(), None);
    assert_eq!(count_nenga(&conn), 0);
}
