use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use sqlx::postgres::PgPoolOptions;

use taskward::auth::TokenKeys;
use taskward::config::Config;
use taskward::mail::Mailer;
use taskward::routes::{self, health};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let token_keys = TokenKeys::from_config(&config);
    let mailer = Mailer::from_config(&config).expect("Failed to build mail transport");

    info!("Starting taskward server at {}", config.server_url());

    let bind_addr = (config.server_host.clone(), config.server_port);
    let app_pool = pool.clone();
    let result = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_pool.clone()))
            .app_data(web::Data::new(token_keys.clone()))
            .app_data(web::Data::new(mailer.clone()))
            .app_data(web::Data::new(config.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .configure(routes::config)
    })
    .bind(bind_addr)?
    .run()
    .await;

    // Server has stopped (ctrl-c or error); release the pool before exiting.
    pool.close().await;
    info!("Server stopped");

    result
}
