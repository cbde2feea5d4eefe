use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use dotenv::dotenv;
use serde_json::json;
use sqlx::PgPool;
use taskward::auth::{AuthResponse, TokenKeys, TokenPurpose};
use taskward::config::Config;
use taskward::mail::Mailer;
use taskward::routes::{self, health};

const TEST_SECRET: &str = "integration-test-secret";
const TEST_ISSUER: &str = "taskward-test";

fn test_keys() -> TokenKeys {
    TokenKeys::new(TEST_SECRET, TEST_ISSUER)
}

/// Config for handlers that take one. The SMTP side points nowhere; tests
/// only exercise branches that bail out before a message is sent.
fn test_config() -> Config {
    Config {
        database_url: String::new(),
        server_port: 0,
        server_host: "127.0.0.1".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_issuer: TEST_ISSUER.to_string(),
        frontend_base_url: "http://localhost:3000".to_string(),
        smtp_host: "localhost".to_string(),
        smtp_port: 465,
        smtp_user: "noreply@taskward.example".to_string(),
        smtp_password: String::new(),
    }
}

/// Connects to the test database, running migrations first. Returns `None`
/// (skipping the calling test) when DATABASE_URL is not set.
async fn test_pool() -> Option<PgPool> {
    dotenv().ok();
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set; skipping DB-backed test");
            return None;
        }
    };
    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to test DB");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations on test DB");
    Some(pool)
}

async fn cleanup_user(pool: &PgPool, email: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

macro_rules! test_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(test_keys()))
                .app_data(web::Data::new(
                    Mailer::from_config(&test_config()).expect("test mailer"),
                ))
                .app_data(web::Data::new(test_config()))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(Logger::default())
                .service(health::health)
                .configure(routes::config),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_signup_and_login_flow() {
    let Some(pool) = test_pool().await else { return };
    let email = "auth_flow@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool);

    let signup_payload = json!({
        "email": email,
        "password": "Password123!",
        "givenName": "Auth",
        "lastName": "Flow"
    });
    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(&signup_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201, "signup should succeed");

    // A second signup with the same email is rejected.
    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(&signup_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400, "duplicate signup should be rejected");

    // Login with the right credentials yields a 2-hour session token.
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({ "email": email, "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200, "login should succeed");

    let auth: AuthResponse = test::read_body_json(resp).await;
    assert_eq!(auth.expires_in, 7200);

    let claims = test_keys()
        .verify(&auth.token)
        .expect("issued token should verify");
    assert_eq!(claims.purpose, TokenPurpose::Session);
    assert_eq!(claims.exp, claims.iat + 7200);

    // The token's subject is the created user's id.
    let req = test::TestRequest::get()
        .uri("/users/userinfo")
        .insert_header(("Authorization", format!("Bearer {}", auth.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let profile: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(profile["email"], email);
    assert_eq!(profile["id"], claims.sub.to_string());
    assert_eq!(profile["givenName"], "Auth");

    cleanup_user(&pool, email).await;
}

#[actix_rt::test]
async fn test_login_wrong_password_is_rejected() {
    let Some(pool) = test_pool().await else { return };
    let email = "wrong_password@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool);

    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(&json!({
            "email": email,
            "password": "Password123!",
            "givenName": "Wrong",
            "lastName": "Password"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({ "email": email, "password": "not-the-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body.get("token").is_none(), "no token on failed login");

    // Unknown account looks the same as a wrong password.
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({ "email": "nobody@example.com", "password": "whatever123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    cleanup_user(&pool, email).await;
}

#[actix_rt::test]
async fn test_signup_validation() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app!(pool);

    // Missing fields answer 401.
    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(&json!({ "email": "partial@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    // Password shorter than 8 characters answers 400.
    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(&json!({
            "email": "short_pw@example.com",
            "password": "short",
            "givenName": "Short",
            "lastName": "Password"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // An email missing "@" or "." answers 400.
    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(&json!({
            "email": "no-at-sign.example.com",
            "password": "Password123!",
            "givenName": "Bad",
            "lastName": "Email"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_reset_request_validation() {
    let Some(pool) = test_pool().await else { return };
    let email = "reset_request@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool);

    // A missing email field answers 400.
    let req = test::TestRequest::post()
        .uri("/auth/email")
        .set_json(&json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // An address with no account behind it answers 404, before any mail
    // delivery is attempted.
    let req = test::TestRequest::post()
        .uri("/auth/email")
        .set_json(&json!({ "email": email }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(
        body.get("error").is_some(),
        "unregistered email reports an error body"
    );
}

#[actix_rt::test]
async fn test_reset_token_flow_and_purpose_separation() {
    let Some(pool) = test_pool().await else { return };
    let email = "reset_flow@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool);

    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(&json!({
            "email": email,
            "password": "Password123!",
            "givenName": "Reset",
            "lastName": "Flow"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let user_id = sqlx::query_scalar::<_, uuid::Uuid>("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(&pool)
        .await
        .unwrap();

    // Issue the reset token directly, as the /auth/email handler would.
    let reset_token = test_keys().issue(user_id, TokenPurpose::Reset).unwrap();

    // A reset token is not a session credential.
    let req = test::TestRequest::get()
        .uri("/users/userinfo")
        .insert_header(("Authorization", format!("Bearer {}", reset_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401, "reset token must not grant session access");

    // Apply the reset.
    let req = test::TestRequest::put()
        .uri("/auth/resetPassword")
        .insert_header(("Authorization", format!("Bearer {}", reset_token)))
        .set_json(&json!({ "newPassword": "BrandNew456!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201, "reset should succeed with a reset token");

    // Old password no longer works, new one does.
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({ "email": email, "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({ "email": email, "password": "BrandNew456!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let auth: AuthResponse = test::read_body_json(resp).await;

    // The session token in turn cannot drive the reset endpoint.
    let req = test::TestRequest::put()
        .uri("/auth/resetPassword")
        .insert_header(("Authorization", format!("Bearer {}", auth.token)))
        .set_json(&json!({ "newPassword": "Another789!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401, "session token must not authorize a reset");

    cleanup_user(&pool, email).await;
}

#[actix_rt::test]
async fn test_change_password_flow() {
    let Some(pool) = test_pool().await else { return };
    let email = "change_pw@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool);

    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(&json!({
            "email": email,
            "password": "Password123!",
            "givenName": "Change",
            "lastName": "Password"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({ "email": email, "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let auth: AuthResponse = test::read_body_json(resp).await;
    let bearer = format!("Bearer {}", auth.token);

    // Wrong current password is rejected.
    let req = test::TestRequest::put()
        .uri("/users/changePassword")
        .insert_header(("Authorization", bearer.clone()))
        .set_json(&json!({
            "currentPassword": "not-right",
            "newPassword": "Replacement1!"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    // Correct current password succeeds.
    let req = test::TestRequest::put()
        .uri("/users/changePassword")
        .insert_header(("Authorization", bearer))
        .set_json(&json!({
            "currentPassword": "Password123!",
            "newPassword": "Replacement1!"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({ "email": email, "password": "Replacement1!" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    cleanup_user(&pool, email).await;
}

#[actix_rt::test]
async fn test_user_settings_allow_list() {
    let Some(pool) = test_pool().await else { return };
    let email = "settings@example.com";
    cleanup_user(&pool, email).await;

    let app = test_app!(pool);

    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(&json!({
            "email": email,
            "password": "Password123!",
            "givenName": "Settings",
            "lastName": "User"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&json!({ "email": email, "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let auth: AuthResponse = test::read_body_json(resp).await;
    let bearer = format!("Bearer {}", auth.token);

    let user_id = sqlx::query_scalar::<_, uuid::Uuid>("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(&pool)
        .await
        .unwrap();

    // Unknown fields (like id) are ignored; allow-listed ones apply.
    let req = test::TestRequest::put()
        .uri(&format!("/users/settings/{}", user_id))
        .insert_header(("Authorization", bearer.clone()))
        .set_json(&json!({
            "givenName": "Renamed",
            "id": uuid::Uuid::new_v4(),
            "createdAt": "1970-01-01T00:00:00Z"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let profile: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(profile["givenName"], "Renamed");
    assert_eq!(profile["lastName"], "User");
    assert_eq!(profile["id"], user_id.to_string(), "id is not caller-writable");

    // Another user's settings answer 404.
    let req = test::TestRequest::put()
        .uri(&format!("/users/settings/{}", uuid::Uuid::new_v4()))
        .insert_header(("Authorization", bearer))
        .set_json(&json!({ "givenName": "Intruder" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    cleanup_user(&pool, email).await;
}
