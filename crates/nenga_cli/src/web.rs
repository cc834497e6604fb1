//! JSON view layer served by `nenga webapp`.
//!
//! # Responsibility
//! - Map HTTP routes onto address book, rollover and ledger services.
//! - Translate `ErrorKind` into HTTP status codes.
//!
//! # Invariants
//! - Handlers call core services only; no SQL lives here.
//! - Each request opens its own connection on the blocking pool.

use crate::commands::CliResult;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use nenga_core::{
    open_db_with_options, Address, AddressBookService, AddressId, AddressInput, DbError,
    EntityRef, ErrorKind, LedgerService, NengaEntry, NengaId, OpenOptions, Person, PersonId,
    RepoError, RolloverService, SqliteAddressStore, SqliteNengaLedger, SqlitePersonRepository,
    SqliteYearRepository, Year, YearNumber,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    db_path: Arc<PathBuf>,
    open_options: OpenOptions,
    debug: bool,
}

#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
}

type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::new(value.kind(), value.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        Self::new(ErrorKind::StorageError, value.to_string())
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyInitialized | ErrorKind::InUse => StatusCode::CONFLICT,
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::EncodingError => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::YearLocked => StatusCode::LOCKED,
    }
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not_found",
        ErrorKind::AlreadyInitialized => "already_initialized",
        ErrorKind::InUse => "in_use",
        ErrorKind::InvalidArgument => "invalid_argument",
        ErrorKind::YearLocked => "year_locked",
        ErrorKind::EncodingError => "encoding_error",
        ErrorKind::StorageError => "storage_error",
    }
}

impl AppState {
    pub fn new(db_path: PathBuf, open_options: OpenOptions, debug: bool) -> Self {
        Self {
            db_path: Arc::new(db_path),
            open_options,
            debug,
        }
    }

    async fn run<T, F>(&self, work: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> ApiResult<T> + Send + 'static,
    {
        let db_path = Arc::clone(&self.db_path);
        let options = self.open_options;
        tokio::task::spawn_blocking(move || {
            let conn = open_db_with_options(db_path.as_path(), options)?;
            work(&conn)
        })
        .await
        .map_err(|err| {
            ApiError::new(
                ErrorKind::StorageError,
                format!("request worker failed: {err}"),
            )
        })?
    }

    fn respond<T: Serialize>(&self, route: &'static str, result: ApiResult<T>) -> Response {
        match result {
            Ok(body) => (StatusCode::OK, Json(body)).into_response(),
            Err(err) => {
                let status = status_for(err.kind);
                error!(
                    "event=http_request module=web status=error route={} http_status={} error_kind={:?}",
                    route,
                    status.as_u16(),
                    err.kind
                );
                let message = if self.debug || err.kind != ErrorKind::StorageError {
                    err.message
                } else {
                    "internal storage error".to_string()
                };
                let body = json!({
                    "status": "error",
                    "kind": kind_label(err.kind),
                    "message": message,
                });
                (status, Json(body)).into_response()
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/years", get(list_years))
        .route("/people", get(list_people))
        .route("/person/add", post(add_person))
        .route("/person/:id/disabled", post(set_person_disabled))
        .route("/person/:id/address/list", get(list_addresses))
        .route("/person/:id/address/add", post(add_address))
        .route("/person/:id/address/action", post(address_action))
        .route("/nenga/list/:year", get(list_nenga).post(bulk_action))
        .route("/nenga/:id/edit", get(edit_nenga))
        .route("/year/:year/lock", post(lock_year))
        .with_state(state)
}

/// Binds `host:port` and serves until Ctrl-C.
pub async fn serve(state: AppState, host: &str, port: u16) -> CliResult<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    info!("event=webapp_start module=web status=ok addr={addr}");
    println!("nenga webapp listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("event=webapp_stop module=web status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=webapp_signal module=web status=error error={err}");
        std::future::pending::<()>().await;
    }
}

fn address_book(
    conn: &Connection,
) -> AddressBookService<SqlitePersonRepository<'_>, SqliteAddressStore<'_>> {
    AddressBookService::new(
        SqlitePersonRepository::new(conn),
        SqliteAddressStore::new(conn),
    )
}

fn rollover(conn: &Connection) -> RolloverService<SqliteYearRepository<'_>> {
    RolloverService::new(SqliteYearRepository::new(conn))
}

fn ledger(conn: &Connection) -> LedgerService<SqliteNengaLedger<'_>> {
    LedgerService::new(SqliteNengaLedger::new(conn))
}

async fn list_years(State(state): State<AppState>) -> Response {
    let result = state.run(|conn| Ok(rollover(conn).list_years()?)).await;
    state.respond("years", result)
}

#[derive(Debug, Deserialize)]
struct PeopleQuery {
    #[serde(default)]
    include_disabled: bool,
}

async fn list_people(State(state): State<AppState>, Query(query): Query<PeopleQuery>) -> Response {
    let result = state
        .run(move |conn| Ok(address_book(conn).people_overview(query.include_disabled)?))
        .await;
    state.respond("people", result)
}

#[derive(Debug, Deserialize)]
struct NewPersonBody {
    family_name: String,
    given_name: String,
}

async fn add_person(State(state): State<AppState>, Json(body): Json<NewPersonBody>) -> Response {
    let result = state
        .run(move |conn| Ok(address_book(conn).create_person(&body.family_name, &body.given_name)?))
        .await;
    state.respond("person_add", result)
}

#[derive(Debug, Deserialize)]
struct DisabledBody {
    disabled: bool,
}

async fn set_person_disabled(
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
    Json(body): Json<DisabledBody>,
) -> Response {
    let result = state
        .run(move |conn| -> ApiResult<Person> {
            let book = address_book(conn);
            book.set_person_disabled(id, body.disabled)?;
            Ok(require_person(&book, id)?)
        })
        .await;
    state.respond("person_disabled", result)
}

#[derive(Debug, Serialize)]
struct AddressListView {
    person: Person,
    addresses: Vec<Address>,
    /// Pre-filled input for a new address.
    template: AddressInput,
}

async fn list_addresses(State(state): State<AppState>, Path(id): Path<PersonId>) -> Response {
    let result = state
        .run(move |conn| {
            let book = address_book(conn);
            let person = require_person(&book, id)?;
            Ok(AddressListView {
                person,
                addresses: book.address_history(id)?,
                template: book.address_template(id)?.unwrap_or_default(),
            })
        })
        .await;
    state.respond("address_list", result)
}

#[derive(Debug, Deserialize)]
struct NewAddressBody {
    #[serde(flatten)]
    address: AddressInput,
    #[serde(default)]
    make_current: bool,
}

async fn add_address(
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
    Json(body): Json<NewAddressBody>,
) -> Response {
    let result = state
        .run(move |conn| Ok(address_book(conn).add_address(id, &body.address, body.make_current)?))
        .await;
    state.respond("address_add", result)
}

#[derive(Debug, Deserialize)]
struct AddressActionBody {
    action: String,
    address_id: AddressId,
}

async fn address_action(
    State(state): State<AppState>,
    Path(id): Path<PersonId>,
    Json(body): Json<AddressActionBody>,
) -> Response {
    let result = state
        .run(move |conn| -> ApiResult<Vec<Address>> {
            let book = address_book(conn);
            match body.action.as_str() {
                "activate" => book.set_current(id, body.address_id)?,
                "delete" => book.retire_owned(id, body.address_id)?,
                other => {
                    return Err(ApiError::new(
                        ErrorKind::InvalidArgument,
                        format!("unknown address action `{other}`; expected activate|delete"),
                    ))
                }
            }
            Ok(book.address_history(id)?)
        })
        .await;
    state.respond("address_action", result)
}

#[derive(Debug, Serialize)]
struct NengaListView {
    year: Year,
    entries: Vec<NengaEntry>,
}

async fn list_nenga(State(state): State<AppState>, Path(year): Path<YearNumber>) -> Response {
    let result = state
        .run(move |conn| {
            let loaded = rollover(conn)
                .get_year(year)?
                .ok_or(RepoError::NotFound(EntityRef::Year(year)))?;
            Ok(NengaListView {
                year: loaded,
                entries: ledger(conn).list_entries_by_year(year)?,
            })
        })
        .await;
    state.respond("nenga_list", result)
}

#[derive(Debug, Deserialize)]
struct BulkActionBody {
    /// `<field>_<value>`, e.g. `printing_2`.
    action: String,
    #[serde(default)]
    ids: Vec<NengaId>,
}

async fn bulk_action(
    State(state): State<AppState>,
    Path(year): Path<YearNumber>,
    Json(body): Json<BulkActionBody>,
) -> Response {
    let result = state
        .run(move |conn| {
            let changed = ledger(conn).apply_bulk_action(year, &body.action, body.ids)?;
            Ok(json!({ "changed": changed }))
        })
        .await;
    state.respond("nenga_bulk", result)
}

async fn edit_nenga(State(state): State<AppState>, Path(id): Path<NengaId>) -> Response {
    let result = state
        .run(move |conn| {
            Ok(ledger(conn)
                .get_entry(id)?
                .ok_or(RepoError::NotFound(EntityRef::Nenga(id)))?)
        })
        .await;
    state.respond("nenga_edit", result)
}

#[derive(Debug, Deserialize)]
struct LockBody {
    locked: bool,
}

async fn lock_year(
    State(state): State<AppState>,
    Path(year): Path<YearNumber>,
    Json(body): Json<LockBody>,
) -> Response {
    let result = state
        .run(move |conn| -> ApiResult<Year> {
            let years = rollover(conn);
            years.set_year_locked(year, body.locked)?;
            Ok(years
                .get_year(year)?
                .ok_or(RepoError::NotFound(EntityRef::Year(year)))?)
        })
        .await;
    state.respond("year_lock", result)
}

fn require_person(
    book: &AddressBookService<SqlitePersonRepository<'_>, SqliteAddressStore<'_>>,
    id: PersonId,
) -> Result<Person, RepoError> {
    book.get_person(id)?
        .ok_or(RepoError::NotFound(EntityRef::Person(id)))
}
