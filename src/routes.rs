//! HTTP surface: `GET`/`PUT`/`PATCH`/`DELETE`/`POST` on `/matches` and
//! `/matches/{id}`. A polling REST surface rather than a push/streaming one.
//! The handlers here are thin: parse, call into `match_core` through the
//! registry, translate the result to JSON.

use actix_web::{delete, get, patch, post, put, web, HttpRequest, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::adapter::adapter_for;
use crate::answer::PlayerInfo;
use crate::auth::{authenticate, protected};
use crate::error::MatchError;
use crate::match_core::{Match, MatchFieldUpdate, MatchMeta, MatchState};
use crate::AppState;

#[derive(Serialize)]
struct Message {
    message: String,
}

fn message(text: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(Message {
        message: text.into(),
    })
}

#[derive(Deserialize)]
struct DateQuery {
    date: Option<String>,
}

#[get("/matches")]
async fn list_matches(
    data: web::Data<AppState>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse, MatchError> {
    let date = match query.date.as_deref().filter(|d| !d.is_empty()) {
        Some(raw) => match raw.parse::<NaiveDate>() {
            Ok(d) => Some(d),
            Err(_) => return Err(MatchError::BadRequest(format!("invalid date {raw}"))),
        },
        None => None,
    };
    let matches = data.registry.filter_by_date(date);
    let short: Vec<_> = matches.iter().map(|m| m.to_short()).collect();
    Ok(HttpResponse::Ok().json(short))
}

#[derive(Deserialize)]
struct ModeQuery {
    #[serde(default)]
    mode: Mode,
}

#[derive(Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
enum Mode {
    #[default]
    Short,
    Extended,
}

#[get("/matches/{match_id}")]
async fn get_match(
    data: web::Data<AppState>,
    match_id: web::Path<String>,
    query: web::Query<ModeQuery>,
) -> Result<HttpResponse, MatchError> {
    let m = data.registry.lookup(&match_id)?;
    Ok(match query.mode {
        Mode::Short => HttpResponse::Ok().json(m.to_short()),
        Mode::Extended => HttpResponse::Ok().json(m.to_extended(data.clock.as_ref())),
    })
}

#[derive(Deserialize)]
struct CreateMatchBody {
    match_type: String,
    home_team: String,
    away_team: String,
    #[serde(default = "default_rounds")]
    rounds: u32,
    #[serde(default = "default_qpr")]
    qpr: u32,
    #[serde(default)]
    tpq: Vec<f64>,
    #[serde(default = "default_ppq")]
    ppq: f64,
    #[serde(default = "default_cooldown")]
    cooldown_duration: f64,
}

fn default_rounds() -> u32 {
    1
}
fn default_qpr() -> u32 {
    5
}
fn default_ppq() -> f64 {
    1.0
}
fn default_cooldown() -> f64 {
    10.0
}

#[put("/matches/{match_id}")]
async fn create_match(
    req: HttpRequest,
    data: web::Data<AppState>,
    match_id: web::Path<String>,
    body: web::Json<CreateMatchBody>,
) -> Result<HttpResponse, MatchError> {
    let identity = protected(&req, data.introspector.as_ref(), "admin").await?;

    let match_id = match_id.into_inner();
    if match_id.trim().is_empty() {
        return Err(MatchError::BadRequest("Match ID is required".into()));
    }
    let body = body.into_inner();
    let adapter = adapter_for(&body.match_type)
        .ok_or_else(|| MatchError::BadRequest("adapter not found".into()))?;

    let tpq = if body.tpq.is_empty() {
        vec![chrono::Duration::seconds(30); body.rounds as usize]
    } else {
        body.tpq
            .into_iter()
            .map(|secs| chrono::Duration::milliseconds((secs * 1000.0) as i64))
            .collect()
    };

    let meta = MatchMeta {
        match_id: match_id.clone(),
        home_team: body.home_team,
        away_team: body.away_team,
        rounds: body.rounds,
        qpr: body.qpr,
        tpq,
        ppq: body.ppq,
        cooldown_duration: chrono::Duration::milliseconds((body.cooldown_duration * 1000.0) as i64),
    };

    let new_match = Match::new(meta, adapter)?;
    data.registry.add(new_match)?;

    log::info!(
        "Match {match_id} added successfully by {}",
        identity.user_name
    );
    Ok(HttpResponse::Created().json(Message {
        message: "Match added successfully".into(),
    }))
}

#[derive(Deserialize)]
struct UpdateMatchBody {
    state: Option<i8>,
    #[serde(flatten)]
    fields: MatchFieldUpdate,
}

#[patch("/matches/{match_id}")]
async fn update_match(
    req: HttpRequest,
    data: web::Data<AppState>,
    match_id: web::Path<String>,
    body: web::Json<UpdateMatchBody>,
) -> Result<HttpResponse, MatchError> {
    let identity = protected(&req, data.introspector.as_ref(), "admin").await?;
    let m = data.registry.lookup(&match_id)?;
    let body = body.into_inner();

    match body.state {
        Some(raw) => {
            let target = MatchState::try_from(raw)?;
            m.transition_to(target, data.clock.as_ref())?;
        }
        None => m.update_fields(body.fields)?,
    }

    log::info!(
        "Match {} updated successfully by {}",
        match_id.as_str(),
        identity.user_name
    );
    Ok(message("Successfully changed state"))
}

#[delete("/matches/{match_id}")]
async fn delete_match(
    req: HttpRequest,
    data: web::Data<AppState>,
    match_id: web::Path<String>,
) -> Result<HttpResponse, MatchError> {
    let identity = protected(&req, data.introspector.as_ref(), "admin").await?;
    data.registry.remove(&match_id)?;
    log::info!(
        "Match {} removed successfully by {}",
        match_id.as_str(),
        identity.user_name
    );
    Ok(message("Match removed successfully"))
}

#[delete("/matches")]
async fn delete_all_matches(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, MatchError> {
    let identity = protected(&req, data.introspector.as_ref(), "admin").await?;
    data.registry.clear();
    log::info!("All matches cleared by {}", identity.user_name);
    Ok(message("All matches cleared"))
}

#[derive(Deserialize)]
struct SubmitAnswerBody {
    selected_option: Option<usize>,
}

#[post("/matches/{match_id}")]
async fn submit_answer(
    req: HttpRequest,
    data: web::Data<AppState>,
    match_id: web::Path<String>,
    body: web::Json<SubmitAnswerBody>,
) -> Result<HttpResponse, MatchError> {
    let identity = authenticate(&req, data.introspector.as_ref()).await?;
    let m = data.registry.lookup(&match_id)?;

    let player_info = PlayerInfo {
        user_id: identity.user_id,
        user_name: identity.user_name,
        user_affiliation: identity.user_affiliation,
    };
    m.store_answer(player_info, body.selected_option, data.clock.as_ref())?;
    Ok(message("Answer submitted successfully"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_matches)
        .service(get_match)
        .service(create_match)
        .service(update_match)
        .service(delete_match)
        .service(delete_all_matches)
        .service(submit_answer);
}
