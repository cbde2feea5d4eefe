use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::TokenKeys;
use crate::error::AppError;

/// Bearer-token gate for the protected route scopes.
///
/// Each request passes through a single synchronous check: the Authorization
/// header is split into scheme and token, the token is verified against the
/// injected [`TokenKeys`], and the decoded claims are attached to the request
/// extensions for the downstream extractors. There is no session cache; every
/// request re-verifies the signature.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S> AuthMiddlewareService<S> {
    /// Runs the gate's state machine against a request, attaching the decoded
    /// claims to the request extensions on success.
    fn authorize(req: &ServiceRequest) -> Result<(), AppError> {
        let header_value = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("no authorization header".into()))?;

        // "Bearer <token>" splits on the first whitespace.
        let mut fragments = header_value.splitn(2, ' ');
        let scheme = fragments.next().unwrap_or_default();
        let token = fragments.next().unwrap_or_default().trim();

        if scheme != "Bearer" {
            return Err(AppError::Unauthorized("invalid token type".into()));
        }
        if token.is_empty() {
            return Err(AppError::Forbidden("no token".into()));
        }

        let keys = req
            .app_data::<web::Data<TokenKeys>>()
            .ok_or_else(|| AppError::InternalServerError("token keys not configured".into()))?;

        let claims = keys
            .verify(token)
            .ok_or_else(|| AppError::Forbidden("invalid token".into()))?;

        req.extensions_mut().insert(claims);
        Ok(())
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match Self::authorize(&req) {
            Ok(()) => Box::pin(self.service.call(req)),
            Err(app_err) => Box::pin(async move { Err(app_err.into()) }),
        }
    }
}
