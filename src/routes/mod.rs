//! HTTP handlers and the helpers they share.

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use tera::{Context, Tera};

use crate::repository::errors::RepositoryError;
use crate::services::ServiceError;

pub mod api;
pub mod transactions;

/// Registers every page and API handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(api::api_v1_transactions_export)
            .service(api::api_v1_pending_reviews)
            .service(api::api_v1_transactions),
    )
    .service(transactions::index)
    .service(transactions::show_transactions)
    .service(transactions::filter_transactions)
    .service(transactions::clear_filters)
    .service(transactions::pending_reviews)
    .service(transactions::change_page)
    .service(transactions::change_page_count)
    .service(transactions::change_order)
    .service(transactions::export_transactions)
    .service(transactions::show_transaction);
}

/// Renders `template` or answers 500 when rendering fails.
pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template '{template}': {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// `303 See Other` to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Maps service failures onto status codes.
pub fn error_response(err: &ServiceError) -> HttpResponse {
    match err {
        ServiceError::NotFound | ServiceError::Repository(RepositoryError::NotFound) => {
            HttpResponse::NotFound().finish()
        }
        ServiceError::TypeConstraint(_) => HttpResponse::BadRequest().body(err.to_string()),
        ServiceError::Repository(_) | ServiceError::Internal(_) => {
            HttpResponse::InternalServerError().finish()
        }
    }
}
