use actix_web::http::header::{self, ContentDisposition};
use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use chrono::Local;
use tera::{Context, Tera};
use validator::Validate;

use crate::controller::runner::{LogObserver, MemoryHistory, SearchRunner};
use crate::controller::{Action, SearchController, Status, TRANSACTIONS_PATH};
use crate::domain::filter::transaction_filter_options;
use crate::domain::query::Query;
use crate::dto::transactions::TransactionsPageData;
use crate::export::{BufferedSink, ExportEmitter};
use crate::forms::transactions::{
    ExportParams, FilterForm, LocationForm, OrderForm, PageCountForm, PageForm,
};
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{error_response, redirect, render_template};
use crate::services::client::RepositoryClient;
use crate::services::transactions::load_transaction;

type ScreenRunner<'a> =
    SearchRunner<RepositoryClient<'a, DieselRepository>, MemoryHistory, LogObserver, BufferedSink>;

fn default_query(server_config: &ServerConfig) -> Query {
    Query {
        count: server_config.default_page_size,
        ..Query::default()
    }
}

fn screen_url(location: &str) -> String {
    if location.is_empty() {
        TRANSACTIONS_PATH.to_string()
    } else {
        format!("{TRANSACTIONS_PATH}?{location}")
    }
}

fn screen_runner<'a>(
    repo: &'a DieselRepository,
    location: &str,
    server_config: &ServerConfig,
) -> ScreenRunner<'a> {
    SearchRunner::new(
        SearchController::new(location, default_query(server_config)),
        RepositoryClient::new(repo),
        MemoryHistory::default(),
        LogObserver,
        ExportEmitter::new(BufferedSink::default()),
        server_config.product_name.clone(),
    )
}

/// Applies `actions` to a controller built from `location` and sends the
/// browser to wherever the controller left the URL.
fn navigate(
    location: &str,
    server_config: &ServerConfig,
    actions: impl IntoIterator<Item = Action>,
) -> HttpResponse {
    let mut controller = SearchController::new(location, default_query(server_config));
    for action in actions {
        controller.dispatch(action);
    }
    redirect(&screen_url(controller.location()))
}

#[get("/")]
pub async fn index() -> impl Responder {
    redirect(TRANSACTIONS_PATH)
}

#[get("/transactions")]
pub async fn show_transactions(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let location = req.query_string();
    let mut runner = screen_runner(repo.get_ref(), location, &server_config);
    runner.dispatch(Action::Mount).await;

    let controller = runner.controller();
    let state = controller.state();
    let data = TransactionsPageData::new(controller, location, &transaction_filter_options());

    let mut context = Context::new();
    context.insert("product_name", &server_config.product_name);
    context.insert("current_page", "transactions");
    context.insert("page", &data);
    if state.status == Status::Error {
        context.insert("error", "Could not load transactions.");
    }

    render_template(&tera, "transactions/index.html", &context)
}

#[post("/transactions/filter")]
pub async fn filter_transactions(
    body: web::Bytes,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let form = match FilterForm::from_bytes(&body) {
        Ok(form) => form,
        Err(err) => {
            log::warn!("Failed to parse filter form: {err}");
            return HttpResponse::BadRequest().body(err.to_string());
        }
    };

    let mut controller = SearchController::new(&form.location, default_query(&server_config));
    match form.confirmation(form.dates(Local::now().date_naive())) {
        Ok(confirmation) => {
            controller.dispatch(Action::FilterConfirm(confirmation));
        }
        Err(err) => {
            log::warn!("Rejected filter form: {err}");
            return HttpResponse::BadRequest().body(err.to_string());
        }
    }

    redirect(&screen_url(controller.location()))
}

#[post("/transactions/clear")]
pub async fn clear_filters(
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<LocationForm>,
) -> impl Responder {
    navigate(&form.location, &server_config, [Action::FilterClear])
}

#[post("/transactions/pending-reviews")]
pub async fn pending_reviews(
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<LocationForm>,
) -> impl Responder {
    navigate(&form.location, &server_config, [Action::PendingReviewsFilter])
}

#[post("/transactions/page")]
pub async fn change_page(
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<PageForm>,
) -> impl Responder {
    if let Err(err) = form.validate() {
        log::warn!("Failed to validate page form: {err}");
        return redirect(&screen_url(&form.location));
    }

    navigate(&form.location, &server_config, [Action::PageChange(form.page)])
}

#[post("/transactions/count")]
pub async fn change_page_count(
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<PageCountForm>,
) -> impl Responder {
    if let Err(err) = form.validate() {
        log::warn!("Failed to validate page size form: {err}");
        return redirect(&screen_url(&form.location));
    }

    navigate(
        &form.location,
        &server_config,
        [Action::PageCountChange(form.count)],
    )
}

#[post("/transactions/order")]
pub async fn change_order(
    server_config: web::Data<ServerConfig>,
    web::Form(form): web::Form<OrderForm>,
) -> impl Responder {
    if let Err(err) = form.validate() {
        log::warn!("Failed to validate order form: {err}");
        return redirect(&screen_url(&form.location));
    }
    let order = match form.sort_order() {
        Ok(order) => order,
        Err(err) => {
            log::warn!("Rejected order form: {err}");
            return redirect(&screen_url(&form.location));
        }
    };

    navigate(
        &form.location,
        &server_config,
        [Action::OrderChange(form.fields(), order)],
    )
}

#[get("/transactions/export")]
pub async fn export_transactions(
    req: HttpRequest,
    params: web::Query<ExportParams>,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let mut runner = screen_runner(repo.get_ref(), req.query_string(), &server_config);
    runner.dispatch(Action::Mount).await;
    if runner.controller().state().status == Status::Error {
        return HttpResponse::InternalServerError().finish();
    }
    runner.dispatch(Action::Export(params.format)).await;

    let (_, _, emitter) = runner.into_parts();
    match emitter.into_sink().take_last() {
        Some(download) => HttpResponse::Ok()
            .content_type(download.mime_type)
            .insert_header((
                header::CONTENT_DISPOSITION,
                ContentDisposition::attachment(download.filename),
            ))
            .body(download.bytes),
        None => {
            log::error!("Export of {} produced no file", params.format);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/transactions/{transaction_id}")]
pub async fn show_transaction(
    transaction_id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let transaction = match load_transaction(repo.get_ref(), transaction_id.into_inner()) {
        Ok(transaction) => transaction,
        Err(err) => {
            log::warn!("Failed to load transaction: {err}");
            return error_response(&err);
        }
    };

    let mut context = Context::new();
    context.insert("product_name", &server_config.product_name);
    context.insert("current_page", "transactions");
    context.insert("transaction", &transaction);
    context.insert("amount", &transaction.amount.to_string());
    context.insert("paid_amount", &transaction.paid_amount.to_string());
    context.insert("refunded_amount", &transaction.refunded_amount.to_string());

    render_template(&tera, "transactions/show.html", &context)
}
