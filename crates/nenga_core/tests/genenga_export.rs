use nenga_core::db::open_db_in_memory;
use nenga_core::{
    export_year, write_rows_atomically, AddressBookService, AddressInput, ErrorKind, ExportError,
    ExportOptions, LedgerService, RolloverService, SqliteAddressStore, SqliteNengaLedger,
    SqlitePersonRepository, SqliteYearRepository,
};
use rusqlite::Connection;

fn seed_household(conn: &Connection, given_name: &str, address1: &str) {
    let book = AddressBookService::new(
        SqlitePersonRepository::new(conn),
        SqliteAddressStore::new(conn),
    );
    let person = book.create_person("山田", given_name).unwrap();
    book.add_address(
        person.id,
        &AddressInput {
            family_name: "山田".to_string(),
            given_name: given_name.to_string(),
            joint_name1: Some("花子".to_string()),
            joint_name2: Some("一郎".to_string()),
            zipcode: "1234567".to_string(),
            address1: address1.to_string(),
            address2: Some("マンション101".to_string()),
        },
        true,
    )
    .unwrap();
}

fn columns(rows: &[nenga_core::GenengaRow]) -> Vec<Vec<String>> {
    rows.iter().map(|row| row.columns().to_vec()).collect()
}

#[test]
fn default_export_splits_zipcode_into_seven_columns() {
    let conn = open_db_in_memory().unwrap();
    seed_household(&conn, "太郎", "東京都港区1-2-3");
    RolloverService::new(SqliteYearRepository::new(&conn))
        .initialize_year(2025)
        .unwrap();

    let rows = export_year(
        &SqliteNengaLedger::new(&conn),
        2025,
        &ExportOptions::default(),
    )
    .unwrap();

    assert_eq!(
        columns(&rows),
        vec![vec![
            "1", "山田", "太郎", "花子", "東京都港区1-2-3", "マンション101", "1", "2", "3", "4",
            "5", "6", "7",
        ]]
    );
}

#[test]
fn mourning_forces_flag_off_unless_included() {
    let conn = open_db_in_memory().unwrap();
    seed_household(&conn, "太郎", "港区1");
    seed_household(&conn, "次郎", "港区2");
    RolloverService::new(SqliteYearRepository::new(&conn))
        .initialize_year(2025)
        .unwrap();
    let ledger = LedgerService::new(SqliteNengaLedger::new(&conn));
    let first = ledger.list_by_year(2025).unwrap()[0].id;
    ledger.apply_bulk_action(2025, "mourning_1", [first]).unwrap();
    ledger.apply_bulk_action(2025, "printing_2", [first]).unwrap();

    let excluded = export_year(&SqliteNengaLedger::new(&conn), 2025, &ExportOptions::default())
        .unwrap();
    let included = export_year(
        &SqliteNengaLedger::new(&conn),
        2025,
        &ExportOptions {
            exclude_mourning: false,
            ..ExportOptions::default()
        },
    )
    .unwrap();

    assert_eq!(excluded[0].columns()[0], "0");
    assert_eq!(excluded[1].columns()[0], "1");
    assert_eq!(included[0].columns()[0], "1");
}

#[test]
fn later_only_and_unsplit_zipcode() {
    let conn = open_db_in_memory().unwrap();
    seed_household(&conn, "太郎", "港区1");
    seed_household(&conn, "次郎", "港区2");
    RolloverService::new(SqliteYearRepository::new(&conn))
        .initialize_year(2025)
        .unwrap();
    let ledger = LedgerService::new(SqliteNengaLedger::new(&conn));
    let second = ledger.list_by_year(2025).unwrap()[1].id;
    ledger.apply_bulk_action(2025, "printing_2", [second]).unwrap();
    // Received status never affects the flag.
    ledger.apply_bulk_action(2025, "received_1", [second]).unwrap();

    let rows = export_year(
        &SqliteNengaLedger::new(&conn),
        2025,
        &ExportOptions {
            later_only: true,
            split_zipcode: false,
            ..ExportOptions::default()
        },
    )
    .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].columns()[0], "0");
    assert_eq!(rows[1].columns()[0], "1");
    assert_eq!(rows[1].columns().len(), 7);
    assert_eq!(rows[1].columns()[6], "1234567");
}

#[test]
fn export_of_unknown_year_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let err = export_year(&SqliteNengaLedger::new(&conn), 2030, &ExportOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn written_file_is_encoded_with_the_requested_charset() {
    let conn = open_db_in_memory().unwrap();
    seed_household(&conn, "太郎", "港区1");
    RolloverService::new(SqliteYearRepository::new(&conn))
        .initialize_year(2025)
        .unwrap();
    let rows = export_year(&SqliteNengaLedger::new(&conn), 2025, &ExportOptions::default())
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genenga.csv");

    let written = write_rows_atomically(&path, &rows, "shift_jis").unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), written);
    let (text, _, had_errors) = encoding_rs::SHIFT_JIS.decode(&bytes);
    assert!(!had_errors);
    assert!(text.starts_with("1,山田,太郎,花子,港区1,マンション101,1,2,3"));
    assert!(text.ends_with("\r\n"));
}

#[test]
fn failed_encoding_leaves_no_output_file() {
    let conn = open_db_in_memory().unwrap();
    seed_household(&conn, "太郎", "港区🎍1");
    RolloverService::new(SqliteYearRepository::new(&conn))
        .initialize_year(2025)
        .unwrap();
    let rows = export_year(&SqliteNengaLedger::new(&conn), 2025, &ExportOptions::default())
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genenga.csv");

    let err = write_rows_atomically(&path, &rows, "shift_jis").unwrap_err();

    assert!(matches!(err, ExportError::Unrepresentable { character: '🎍', .. }));
    assert_eq!(err.kind(), ErrorKind::EncodingError);
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn failed_export_keeps_previous_file_intact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genenga.csv");
    std::fs::write(&path, b"previous").unwrap();

    let err = write_rows_atomically(&path, &[], "utf-16").unwrap_err();

    assert!(matches!(err, ExportError::UnsupportedEncoding(_)));
    assert_eq!(std::fs::read(&path).unwrap(), b"previous");
}
