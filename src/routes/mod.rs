pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use crate::auth::AuthMiddleware;
use actix_web::web;

/// Wires the API routes. Login, signup and the reset-email request are open;
/// everything else sits behind the bearer-token gate. The reset-apply route
/// is gated individually since it lives under the otherwise-open /auth scope.
///
/// Literal paths are registered before `{id}` routes so they are matched
/// first.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::signup)
            .service(auth::request_reset)
            .service(
                web::resource("/resetPassword")
                    .wrap(AuthMiddleware)
                    .route(web::put().to(auth::reset_password)),
            ),
    )
    .service(
        web::scope("/users")
            .wrap(AuthMiddleware)
            .service(users::userinfo)
            .service(users::change_password)
            .service(users::update_settings)
            .service(users::get_user),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware)
            .service(tasks::create_task)
            .service(tasks::list_tasks)
            .service(tasks::search_tags)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
