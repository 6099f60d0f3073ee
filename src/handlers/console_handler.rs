use actix_web::http::StatusCode;
use actix_web::{web, Responder};
use log::warn;

use super::handler::page_response;
use crate::models::console_form::{ConsoleAction, ConsoleForm};
use crate::models::instance::OperationResult;
use crate::services::orchestrator::Orchestrator;

async fn index_handler() -> impl Responder {
    page_response(StatusCode::OK, &OperationResult::default())
}

async fn submit_handler(
    orchestrator: web::Data<Orchestrator>,
    form: web::Form<ConsoleForm>,
) -> impl Responder {
    match ConsoleAction::try_from(form.into_inner()) {
        Ok(action) => {
            let result = orchestrator.handle(action).await;
            page_response(StatusCode::OK, &result)
        }
        Err(missing) => {
            warn!("Rejected console submission: {}", missing);
            page_response(
                StatusCode::BAD_REQUEST,
                &OperationResult::message(format!("⚠️ {}", missing)),
            )
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(index_handler))
            .route(web::post().to(submit_handler)),
    );
}
