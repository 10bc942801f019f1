use std::future::{ready, Ready};
use std::io::Write;
use std::time::Instant;

use actix_web::{
   dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
   Error,
};
use colored::{ColoredString, Colorize};
use env_logger::Builder;
use futures_util::future::LocalBoxFuture;
use log::{info, warn, Level};

/// Method and target of one request plus when it arrived.
struct RequestLine {
   text: String,
   started: Instant,
}

impl RequestLine {
   fn open(req: &ServiceRequest) -> Self {
      let text = format!("{} {}", req.method(), req.uri());
      info!("request: {}", text);
      RequestLine { text, started: Instant::now() }
   }

   /// Errors raised by inner middleware never become a `ServiceResponse`
   /// here, so they get their own line.
   fn close<B>(&self, outcome: &Result<ServiceResponse<B>, Error>) {
      let elapsed = self.started.elapsed();
      match outcome {
         Ok(res) => info!("response: {} {} in {:?}", self.text, res.status(), elapsed),
         Err(err) => warn!(
            "response: {} {} in {:?} ({})",
            self.text,
            err.as_response_error().status_code(),
            elapsed,
            err
         ),
      }
   }
}

/// One access-log line per request and one per outcome.
pub struct AccessLog;

impl<S, B> Transform<S, ServiceRequest> for AccessLog
where
   S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
   S::Future: 'static,
   B: 'static,
{
   type Response = ServiceResponse<B>;
   type Error = Error;
   type InitError = ();
   type Transform = AccessLogService<S>;
   type Future = Ready<Result<Self::Transform, Self::InitError>>;

   fn new_transform(&self, inner: S) -> Self::Future {
      ready(Ok(AccessLogService { inner }))
   }
}

pub struct AccessLogService<S> {
   inner: S,
}

impl<S, B> Service<ServiceRequest> for AccessLogService<S>
where
   S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
   S::Future: 'static,
   B: 'static,
{
   type Response = ServiceResponse<B>;
   type Error = Error;
   type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

   forward_ready!(inner);

   fn call(&self, req: ServiceRequest) -> Self::Future {
      let line = RequestLine::open(&req);
      let pending = self.inner.call(req);
      Box::pin(async move {
         let outcome = pending.await;
         line.close(&outcome);
         outcome
      })
   }
}

fn paint(level: Level) -> ColoredString {
   let label = level.as_str();
   match level {
      Level::Error => label.red().bold(),
      Level::Warn => label.yellow().bold(),
      Level::Info => label.green().bold(),
      Level::Debug => label.blue().bold(),
      Level::Trace => label.magenta().bold(),
   }
}

/// Honors `RUST_LOG`; defaults to `info`.
pub fn init_logger() {
   Builder::new()
      .filter_level(log::LevelFilter::Info)
      .parse_default_env()
      .format(|buf, record| {
         writeln!(buf, "{} {} - {}", paint(record.level()), record.target().dimmed(), record.args())
      })
      .init()
}

#[cfg(test)]
mod tests {
   use actix_web::{http::StatusCode, test, web, App, HttpResponse};

   use super::*;
   use crate::service::auth::{jwt::TokenKeys, AuthMiddleware};

   #[actix_rt::test]
   async fn passes_responses_and_middleware_errors_through() {
      let keys = TokenKeys::new("access", "refresh", 60, 120);
      let app = test::init_service(
         App::new()
            .wrap(AuthMiddleware { keys })
            .wrap(AccessLog)
            .route("/ping", web::get().to(|| async { HttpResponse::Ok().body("pong") })),
      )
      .await;

      let req = test::TestRequest::get().uri("/ping").to_request();
      let res = app.call(req).await.unwrap();
      assert_eq!(res.status(), StatusCode::OK);

      let req = test::TestRequest::get()
         .uri("/ping")
         .insert_header(("Authorization", "Bearer garbage"))
         .to_request();
      let err = app.call(req).await.err().unwrap();
      assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
   }
}
