use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header::AUTHORIZATION, StatusCode},
    Error,
};
use futures::future::LocalBoxFuture;
use log::Level;
use std::rc::Rc;
use std::time::Instant;

/// Access log middleware
///
/// One line per request with method, path, status and latency. Rejected
/// requests (4xx) are logged at `warn`, failures (5xx) at `error`. Only the
/// presence of an Authorization header is recorded, never its value.
pub struct AccessLog;

impl<S, B> Transform<S, ServiceRequest> for AccessLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessLogService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AccessLogService {
            service: Rc::new(service),
        }))
    }
}

pub struct AccessLogService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AccessLogService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let bearer = if req.headers().contains_key(AUTHORIZATION) {
            "present"
        } else {
            "absent"
        };

        let service = self.service.clone();

        Box::pin(async move {
            let res = service.call(req).await?;
            let status = res.status();

            log::log!(
                level_for(status),
                "{} {} -> {} ({}ms, authorization: {})",
                method,
                path,
                status.as_u16(),
                started.elapsed().as_millis(),
                bearer
            );

            Ok(res)
        })
    }
}

fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::Error
    } else if status.is_client_error() {
        Level::Warn
    } else {
        Level::Info
    }
}
