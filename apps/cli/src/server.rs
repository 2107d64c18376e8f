//! HTTP surface: contact submissions and the address-lookup demo.
//!
//! All routes live under `/api`:
//! - `POST /api/contact` — JSON or form-encoded contact fields
//! - `GET  /api/postcodes/{code}` — address patch for a postal code
//! - `POST /api/address` — validate an address form

use actix_web::dev::Server;
use actix_web::rt::task::JoinHandle;
use actix_web::{App, Either, HttpResponse, HttpServer, get, post, web};
use serde_json::json;
use tracing::{error, info};

use contactdesk_address::{AddressFormInput, AddressLookup, validate_address_form};
use contactdesk_core::{SubmissionController, SubmissionResult};
use contactdesk_notify::Dispatcher;
use contactdesk_shared::{ContactDeskError, SubmissionInput};

/// Shared per-process state handed to every worker.
pub(crate) struct HttpState {
    pub controller: SubmissionController<Dispatcher>,
    pub lookup: AddressLookup,
}

type JsonOrForm<T> = Either<web::Json<T>, web::Form<T>>;

fn into_inner<T>(body: JsonOrForm<T>) -> T {
    match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    }
}

/// Run one submission on its own task.
///
/// actix drops a handler future when the client goes away. The spawned task
/// keeps running, so a dispatch always ends in an outcome bounded by its own
/// deadline rather than being cut off mid-request.
fn spawn_submission(
    data: web::Data<HttpState>,
    input: SubmissionInput,
) -> JoinHandle<SubmissionResult> {
    actix_web::rt::spawn(async move { data.controller.submit(input).await })
}

#[post("/contact")]
async fn contact(data: web::Data<HttpState>, body: JsonOrForm<SubmissionInput>) -> HttpResponse {
    let result = match spawn_submission(data, into_inner(body)).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "submission task failed");
            return HttpResponse::InternalServerError().json(json!({
                "ok": false,
                "error": "submission failed",
            }));
        }
    };

    if result.is_ok() {
        HttpResponse::Ok().json(&result)
    } else {
        HttpResponse::UnprocessableEntity().json(&result)
    }
}

#[get("/postcodes/{code}")]
async fn postcode(data: web::Data<HttpState>, code: web::Path<String>) -> HttpResponse {
    match data.lookup.lookup(&code).await {
        Ok(Some(found)) => HttpResponse::Ok().json(found.to_patch()),
        Ok(None) => HttpResponse::NotFound().json(json!({
            "ok": false,
            "error": "postal code not found",
        })),
        Err(ContactDeskError::Validation { message }) => HttpResponse::BadRequest().json(json!({
            "ok": false,
            "error": message,
        })),
        Err(e) => {
            error!(error = %e, "address lookup failed");
            HttpResponse::BadGateway().json(json!({
                "ok": false,
                "error": "address lookup failed",
            }))
        }
    }
}

#[post("/address")]
async fn register_address(body: JsonOrForm<AddressFormInput>) -> HttpResponse {
    match validate_address_form(&into_inner(body)) {
        Ok(form) => HttpResponse::Ok().json(json!({
            "ok": true,
            "message": "registered",
            "description": form.summary(),
        })),
        Err(errors) => HttpResponse::UnprocessableEntity().json(json!({
            "ok": false,
            "fieldErrors": errors,
        })),
    }
}

/// Register the `/api` routes.
pub(crate) fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(contact)
            .service(postcode)
            .service(register_address),
    );
}

/// Bind the HTTP server. The returned future runs until shutdown.
pub(crate) fn start_server(state: HttpState, host: &str, port: u16) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind((host, port))?
        .run();

    info!(host, port, "listening");
    Ok(server)
}
