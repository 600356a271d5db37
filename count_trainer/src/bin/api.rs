use actix_web::{
    body::BoxBody,
    error, get,
    http::{header::ContentType, StatusCode},
    post, web, App, HttpResponse, HttpServer,
};
use count_trainer::logging::init_logging;
use count_trainer::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::result::Result;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn, Level};

/// A struct for a running count guess. The guess stays a string so that empty or non numeric input
/// gets the same validation message as in the terminal trainer.
#[derive(Debug, Deserialize)]
struct GuessRequest {
    guess: String,
}

#[derive(Debug, Deserialize)]
struct SeatsRequest {
    seats: usize,
}

#[derive(Debug, Deserialize)]
struct AdvanceRequest {
    ticket: u64,
}

/// Partial update of the preferences, fields left out keep their value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsUpdate {
    num_decks: Option<u32>,
    show_count: Option<bool>,
    show_discard_pile: Option<bool>,
    training_mode: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DrillDealResponse {
    outcome: DealOutcome,
    hint: Option<i32>,
    discard_pile: Option<Vec<Card>>,
    stats: ShoeStats,
}

/// Counters of both shoes, the drill's and the table's.
#[derive(Serialize)]
struct StatsResponse {
    drill: ShoeStats,
    table: ShoeStats,
}

#[derive(Serialize)]
struct AdvanceResponse {
    fired: bool,
    table: TableSnapshot,
}

/// An enum that will handle user facing errors
#[derive(Debug)]
enum UserError {
    InternalError,
    BadInput(String),
    Conflict(String),
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserError::InternalError => write!(f, "an internal error occured"),
            UserError::BadInput(s) => write!(f, "{}", s),
            UserError::Conflict(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for UserError {}

impl error::ResponseError for UserError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            UserError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            UserError::BadInput(_) => StatusCode::BAD_REQUEST,
            UserError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<TrainerError> for UserError {
    fn from(e: TrainerError) -> Self {
        match e {
            TrainerError::InvalidGuess { .. }
            | TrainerError::UnsupportedSeatCount(_)
            | TrainerError::UnsupportedDeckCount(_) => UserError::BadInput(e.to_string()),
            TrainerError::ActionUnavailable { .. }
            | TrainerError::RoundInProgress
            | TrainerError::StepAlreadyPending => UserError::Conflict(e.to_string()),
            TrainerError::Io(_) | TrainerError::Json(_) => {
                warn!(error = %e, "request failed");
                UserError::InternalError
            }
        }
    }
}

type AppSession = web::Data<Mutex<TrainerSession>>;

fn lock(session: &AppSession) -> Result<MutexGuard<'_, TrainerSession>, UserError> {
    session.lock().map_err(|_| UserError::InternalError)
}

#[get("/stats")]
async fn get_stats(session: AppSession) -> Result<HttpResponse, UserError> {
    let guard = lock(&session)?;
    Ok(HttpResponse::Ok().json(StatsResponse {
        drill: guard.drill_stats(),
        table: guard.table_stats(),
    }))
}

#[get("/settings")]
async fn get_settings(session: AppSession) -> Result<HttpResponse, UserError> {
    let guard = lock(&session)?;
    Ok(HttpResponse::Ok().json(guard.preferences()))
}

/// A handler that applies a partial settings update. A deck count change is validated before any
/// of the display flags are touched, so a rejected request changes nothing.
#[post("/settings")]
async fn update_settings(
    update: web::Json<SettingsUpdate>,
    session: AppSession,
) -> Result<HttpResponse, UserError> {
    let update = update.into_inner();
    let mut guard = lock(&session)?;

    if let Some(num_decks) = update.num_decks {
        guard.set_num_decks(num_decks)?;
    }
    let prefs = guard.preferences_mut();
    if let Some(flag) = update.show_count {
        prefs.show_count = flag;
    }
    if let Some(flag) = update.show_discard_pile {
        prefs.show_discard_pile = flag;
    }
    if let Some(flag) = update.training_mode {
        prefs.training_mode = flag;
    }
    Ok(HttpResponse::Ok().json(guard.preferences()))
}

#[post("/drill/deal")]
async fn drill_deal(session: AppSession) -> Result<HttpResponse, UserError> {
    let mut guard = lock(&session)?;
    let outcome = guard.drill_deal();
    let drill = guard.drill();
    let response = DrillDealResponse {
        outcome,
        hint: drill.hint(guard.preferences()),
        discard_pile: drill
            .discard_pile(guard.preferences())
            .map(|pile| pile.iter().copied().collect()),
        stats: guard.drill_stats(),
    };
    Ok(HttpResponse::Ok().json(response))
}

#[post("/drill/check")]
async fn drill_check(
    request: web::Json<GuessRequest>,
    session: AppSession,
) -> Result<HttpResponse, UserError> {
    let mut guard = lock(&session)?;
    let outcome = guard.drill_check(&request.guess)?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[post("/drill/reset")]
async fn drill_reset(session: AppSession) -> Result<HttpResponse, UserError> {
    let mut guard = lock(&session)?;
    guard.drill_reset();
    Ok(HttpResponse::Ok().json(guard.drill_stats()))
}

#[get("/table")]
async fn get_table(session: AppSession) -> Result<HttpResponse, UserError> {
    let guard = lock(&session)?;
    Ok(HttpResponse::Ok().json(guard.table().snapshot()))
}

/// A handler that starts a new round. The response carries the first pending step, clients wait
/// out its `delayMs` and post its ticket to `/table/advance`.
#[post("/table/deal")]
async fn table_deal(session: AppSession) -> Result<HttpResponse, UserError> {
    let mut guard = lock(&session)?;
    guard.table_deal()?;
    Ok(HttpResponse::Ok().json(guard.table().snapshot()))
}

#[post("/table/hit")]
async fn table_hit(session: AppSession) -> Result<HttpResponse, UserError> {
    let mut guard = lock(&session)?;
    guard.table_hit()?;
    Ok(HttpResponse::Ok().json(guard.table().snapshot()))
}

#[post("/table/stand")]
async fn table_stand(session: AppSession) -> Result<HttpResponse, UserError> {
    let mut guard = lock(&session)?;
    guard.table_stand()?;
    Ok(HttpResponse::Ok().json(guard.table().snapshot()))
}

#[post("/table/clear")]
async fn table_clear(session: AppSession) -> Result<HttpResponse, UserError> {
    let mut guard = lock(&session)?;
    guard.table_clear();
    Ok(HttpResponse::Ok().json(guard.table().snapshot()))
}

#[post("/table/seats")]
async fn table_seats(
    request: web::Json<SeatsRequest>,
    session: AppSession,
) -> Result<HttpResponse, UserError> {
    let mut guard = lock(&session)?;
    guard.table_set_seats(request.seats)?;
    Ok(HttpResponse::Ok().json(guard.table().snapshot()))
}

#[post("/table/check")]
async fn table_check(
    request: web::Json<GuessRequest>,
    session: AppSession,
) -> Result<HttpResponse, UserError> {
    let guard = lock(&session)?;
    let outcome = guard.table_check(&request.guess)?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// A handler that fires a scheduled table step. Stale tickets are answered with `fired: false`
/// and leave the table as it was.
#[post("/table/advance")]
async fn table_advance(
    request: web::Json<AdvanceRequest>,
    session: AppSession,
) -> Result<HttpResponse, UserError> {
    let mut guard = lock(&session)?;
    let fired = guard.table_fire(Ticket::from_id(request.ticket))?;
    Ok(HttpResponse::Ok().json(AdvanceResponse {
        fired,
        table: guard.table().snapshot(),
    }))
}

#[post("/shoe/reset")]
async fn shoe_reset(session: AppSession) -> Result<HttpResponse, UserError> {
    let mut guard = lock(&session)?;
    guard.reset_shoe();
    Ok(HttpResponse::Ok().json(StatsResponse {
        drill: guard.drill_stats(),
        table: guard.table_stats(),
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logging(Level::INFO);

    let address = "127.0.0.1";
    let port = 8080;

    let mut builder = TrainerConfig::new();
    if let Some(home) = std::env::var_os("HOME") {
        builder.storage_dir(PathBuf::from(home).join(".count_trainer"));
    }
    let session = TrainerSession::new(builder.build())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let session: AppSession = web::Data::new(Mutex::new(session));

    info!(address, port, "listening");
    HttpServer::new(move || {
        App::new()
            .app_data(session.clone())
            .service(get_stats)
            .service(get_settings)
            .service(update_settings)
            .service(drill_deal)
            .service(drill_check)
            .service(drill_reset)
            .service(get_table)
            .service(table_deal)
            .service(table_hit)
            .service(table_stand)
            .service(table_clear)
            .service(table_seats)
            .service(table_check)
            .service(table_advance)
            .service(shoe_reset)
    })
    .bind((address, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test as actix_test;
    use serde_json::{json, Value};

    fn app_session() -> AppSession {
        let config = TrainerConfig::new().seed(17).instant().build();
        web::Data::new(Mutex::new(TrainerSession::new(config).unwrap()))
    }

    #[test]
    fn trainer_errors_map_to_statuses() {
        let bad = UserError::from(TrainerError::UnsupportedDeckCount(3));
        assert_eq!(error::ResponseError::status_code(&bad), StatusCode::BAD_REQUEST);
        let conflict = UserError::from(TrainerError::RoundInProgress);
        assert_eq!(
            error::ResponseError::status_code(&conflict),
            StatusCode::CONFLICT
        );
        let internal = UserError::from(TrainerError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )));
        assert_eq!(
            error::ResponseError::status_code(&internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn hit_outside_a_round_is_a_conflict() {
        let app = actix_test::init_service(
            App::new()
                .app_data(app_session())
                .service(table_hit)
                .service(get_table),
        )
        .await;

        let req = actix_test::TestRequest::post().uri("/table/hit").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = actix_test::TestRequest::get().uri("/table").to_request();
        let table: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(table["phase"], "idle");
    }

    #[actix_web::test]
    async fn drill_deal_and_check() {
        let app = actix_test::init_service(
            App::new()
                .app_data(app_session())
                .service(drill_deal)
                .service(drill_check)
                .service(get_stats),
        )
        .await;

        let req = actix_test::TestRequest::post().uri("/drill/deal").to_request();
        let dealt: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(dealt["outcome"]["result"], "dealt");
        assert_eq!(dealt["discardPile"].as_array().map(|p| p.len()), Some(1));

        let req = actix_test::TestRequest::post()
            .uri("/drill/check")
            .set_json(json!({ "guess": "" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = actix_test::TestRequest::get().uri("/stats").to_request();
        let stats: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["drill"]["cardsDealt"], 1);
        assert_eq!(stats["table"]["cardsDealt"], 0);
    }
}
