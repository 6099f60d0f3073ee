use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use log::info;
use std::sync::Arc;

mod config;
mod handlers;
mod models;
mod services;
mod util;

use config::Config;
use handlers::console_handler;
use services::{aws_service::AwsCompute, cloud_compute::CloudCompute, orchestrator::Orchestrator};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info,actix_web=debug"));

    let config = Config::from_env()?;

    // One provider client for the whole process; credentials are resolved once here.
    let compute: Arc<dyn CloudCompute> = Arc::new(AwsCompute::new(config.region.clone(), config.waiter)?);
    let orchestrator = Data::new(Orchestrator::new(compute));

    info!("EC2 console listening on http://{}", config.bind_address);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(orchestrator.clone())
            .configure(console_handler::configure_routes)
    })
    .bind(&config.bind_address)?
    .run()
    .await?;

    Ok(())
}
