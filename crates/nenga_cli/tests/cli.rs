use assert_cmd::Command;
use chrono::{Datelike, Local};
use nenga_core::{
    open_db, AddressBookService, AddressInput, SqliteAddressStore, SqlitePersonRepository,
};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn nenga_cmd(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nenga").unwrap();
    cmd.env("NENGA_LOG_DIR", temp.path().join("logs"))
        .env("NENGA_LOG_LEVEL", "info")
        .env_remove("NENGA_DB")
        .arg("--db")
        .arg(temp.path().join("nenga.sqlite3"));
    cmd
}

fn seed_household(db: &Path) {
    let conn = open_db(db).unwrap();
    let book = AddressBookService::new(
        SqlitePersonRepository::new(&conn),
        SqliteAddressStore::new(&conn),
    );
    let person = book.create_person("山田", "太郎").unwrap();
    book.add_address(
        person.id,
        &AddressInput {
            family_name: "山田".to_string(),
            given_name: "太郎".to_string(),
            joint_name1: Some("花子".to_string()),
            zipcode: "123-4567".to_string(),
            address1: "東京都港区1-2-3".to_string(),
            ..AddressInput::default()
        },
        true,
    )
    .unwrap();
}

#[test]
fn initdb_creates_the_database() {
    let temp = TempDir::new().unwrap();

    nenga_cmd(&temp)
        .arg("initdb")
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized database"));

    assert!(temp.path().join("nenga.sqlite3").exists());
    assert!(temp.path().join("logs").is_dir());
}

#[test]
fn nextyear_twice_exits_with_already_initialized() {
    let temp = TempDir::new().unwrap();
    let next_year = Local::now().year() + 1;

    nenga_cmd(&temp).arg("initdb").assert().success();
    nenga_cmd(&temp)
        .arg("nextyear")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("initialized year {next_year}")));
    nenga_cmd(&temp)
        .arg("nextyear")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn genenga_writes_rolled_over_households() {
    let temp = TempDir::new().unwrap();
    let next_year = Local::now().year() + 1;
    seed_household(&temp.path().join("nenga.sqlite3"));
    let output = temp.path().join("genenga.csv");

    nenga_cmd(&temp).arg("--nodbecho").arg("nextyear").assert().success();
    nenga_cmd(&temp)
        .args(["genenga", "--year", &next_year.to_string(), "-o"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported 1 row(s)"));

    let csv = std::fs::read_to_string(&output).unwrap();
    assert_eq!(csv, "1,山田,太郎,花子,東京都港区1-2-3,,1,2,3,4,5,6,7\r\n");
}

#[test]
fn genenga_nosplit_zipcode_keeps_one_column() {
    let temp = TempDir::new().unwrap();
    let next_year = Local::now().year() + 1;
    seed_household(&temp.path().join("nenga.sqlite3"));
    let output = temp.path().join("genenga.csv");

    nenga_cmd(&temp).arg("nextyear").assert().success();
    nenga_cmd(&temp)
        .args(["genenga", "--nosplit-zipcode", "--later-only", "--year"])
        .arg(next_year.to_string())
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&output).unwrap();
    assert_eq!(csv, "0,山田,太郎,花子,東京都港区1-2-3,,1234567\r\n");
}

#[test]
fn genenga_for_unknown_year_exits_with_not_found() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("genenga.csv");

    nenga_cmd(&temp).arg("initdb").assert().success();
    nenga_cmd(&temp)
        .args(["genenga", "--year", "1999", "-o"])
        .arg(&output)
        .assert()
        .code(5);
    assert!(!output.exists());
}

#[test]
fn genenga_with_unknown_encoding_exits_with_invalid_argument() {
    let temp = TempDir::new().unwrap();
    let next_year = Local::now().year() + 1;
    let output = temp.path().join("genenga.csv");

    nenga_cmd(&temp).arg("nextyear").assert().success();
    nenga_cmd(&temp)
        .args(["genenga", "--encoding", "klingon", "--year"])
        .arg(next_year.to_string())
        .arg("-o")
        .arg(&output)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unsupported output encoding"));
    assert!(!output.exists());
}

#[test]
fn genenga_requires_an_output_path() {
    let temp = TempDir::new().unwrap();

    nenga_cmd(&temp).arg("genenga").assert().code(2);
}
