use std::future::{ready, Ready};
use std::io::Write;
use std::time::Instant;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use chrono::Local;
use colored::Colorize;
use env_logger::Builder;
use futures_util::future::LocalBoxFuture;
use log::{info, warn, Level};

pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService { service }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
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
        let started = Instant::now();
        let method = req.method().clone();
        let uri = req.uri().clone();
        info!("server request: {} {}", method, uri);
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status();
            let elapsed = started.elapsed().as_millis();
            if status.is_server_error() {
                warn!("server response: {} {} -> {} in {}ms", method, uri, status, elapsed);
            } else {
                info!("server response: {} {} -> {} in {}ms", method, uri, status, elapsed);
            }
            Ok(res)
        })
    }
}

pub fn init_logger() {
    Builder::from_default_env()
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "ERROR".red().bold(),
                Level::Warn => "WARN ".yellow().bold(),
                Level::Info => "INFO ".green().bold(),
                Level::Debug => "DEBUG".blue().bold(),
                Level::Trace => "TRACE".magenta().bold(),
            };
            writeln!(
                buf,
                "{} {} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                level,
                record.target(),
                record.args()
            )
        })
        .init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    #[actix_rt::test]
    async fn middleware_passes_responses_through() {
        let app = test::init_service(
            App::new()
                .wrap(LoggerMiddleware)
                .route("/ping", web::get().to(|| async { HttpResponse::Ok().body("pong") }))
                .route("/boom", web::get().to(|| async { HttpResponse::InternalServerError().finish() })),
        )
        .await;

        let ok = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(test::read_body(ok).await, "pong");

        let failed = test::call_service(&app, test::TestRequest::get().uri("/boom").to_request()).await;
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
