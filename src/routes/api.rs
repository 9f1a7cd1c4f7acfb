use actix_web::{HttpRequest, HttpResponse, Responder, get, web};
use serde_json::json;

use crate::codec;
use crate::forms::transactions::ExportParams;
use crate::repository::DieselRepository;
use crate::routes::error_response;
use crate::services::transactions;

#[get("/v1/transactions")]
pub async fn api_v1_transactions(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let query = codec::parse(req.query_string());

    match transactions::search_transactions(repo.get_ref(), &query) {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(err) => error_response(&err),
    }
}

#[get("/v1/transactions/export")]
pub async fn api_v1_transactions_export(
    req: HttpRequest,
    params: web::Query<ExportParams>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let query = codec::parse(req.query_string());

    match transactions::export_transactions(repo.get_ref(), &query, params.format) {
        Ok(data) => HttpResponse::Ok().json(data),
        Err(err) => error_response(&err),
    }
}

#[get("/v1/transactions/pending_reviews")]
pub async fn api_v1_pending_reviews(repo: web::Data<DieselRepository>) -> impl Responder {
    match transactions::count_pending_reviews(repo.get_ref()) {
        Ok(count) => HttpResponse::Ok().json(json!({ "count": count })),
        Err(err) => error_response(&err),
    }
}
