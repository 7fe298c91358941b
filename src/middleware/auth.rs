use crate::services::auth_service::{Authenticators, TrustScheme};
use crate::utils::AppError;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Requires a bearer credential valid under `scheme`. On success the
/// [`Principal`](crate::services::auth_service::Principal) is available to
/// handlers as `web::ReqData<Principal>`; on failure the wrapped service is
/// never called.
pub struct AuthMiddleware {
    scheme: TrustScheme,
}

impl AuthMiddleware {
    pub fn new(scheme: TrustScheme) -> Self {
        Self { scheme }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            scheme: self.scheme,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    scheme: TrustScheme,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let scheme = self.scheme;

        Box::pin(async move {
            let Some(authenticators) = req.app_data::<web::Data<Authenticators>>().cloned() else {
                log::error!("❌ Authenticators missing from application data");
                let response = AppError::Internal("Authentication unavailable".to_string()).error_response();
                return Ok(req.into_response(response).map_into_right_body());
            };

            let authorization = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            match authenticators.authenticate(scheme, authorization.as_deref()).await {
                Ok(principal) => {
                    log::debug!("🔓 {} {} authenticated as {}", req.method(), req.path(), principal.email);
                    req.extensions_mut().insert(principal);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(err) => {
                    let response = AppError::from(err).error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
