use crate::config::{HandlerAction, Route};
use crate::errors::{ServiceError, SyncError};
use crate::handlers::{HandlerOutput, SyncContext};
use crate::metrics_defs::REQUEST_DURATION;
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use shared::histogram;
use shared::http::{make_attachment_response, make_json_response};
use std::sync::Arc;
use std::time::Instant;

pub type ServiceResponse = Response<BoxBody<Bytes, ServiceError>>;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    detail: String,
}

fn error_response(status: StatusCode, error: &str, detail: String) -> ServiceResponse {
    make_json_response(status, &ErrorBody { error, detail })
}

/// Matches requests against the configured routes and runs the handler.
#[derive(Clone)]
pub struct Router {
    routes: Arc<Vec<Route>>,
    context: Arc<SyncContext>,
}

impl Router {
    pub fn new(routes: Vec<Route>, context: SyncContext) -> Self {
        Self {
            routes: Arc::new(routes),
            context: Arc::new(context),
        }
    }

    /// Routes an incoming request. Request bodies are ignored.
    pub async fn route<B>(&self, req: Request<B>) -> ServiceResponse {
        let Some(action) = self.find_matching_route(&req) else {
            tracing::warn!(
                method = %req.method(),
                path = %req.uri().path(),
                "No route matched"
            );
            return error_response(
                StatusCode::NOT_FOUND,
                "NotFound",
                format!("no handler for {} {}", req.method(), req.uri().path()),
            );
        };

        let started = Instant::now();
        tracing::info!(handler = action.name(), path = %req.uri().path(), "Running handler");

        let response = match self.context.execute(action).await {
            Ok(output) => Self::render(output),
            Err(e) => Self::render_error(action, e),
        };

        histogram!(
            REQUEST_DURATION,
            "handler" => action.name(),
            "status" => response.status().as_str().to_string()
        )
        .record(started.elapsed().as_secs_f64());

        response
    }

    /// Finds the first route that matches the incoming request
    fn find_matching_route<B>(&self, req: &Request<B>) -> Option<&HandlerAction> {
        self.routes
            .iter()
            .find(|route| {
                req.uri().path() == route.r#match.path
                    && route
                        .r#match
                        .method
                        .as_ref()
                        .is_none_or(|method| method == req.method())
            })
            .map(|route| &route.action)
    }

    fn render(output: HandlerOutput) -> ServiceResponse {
        match output {
            HandlerOutput::Summary(summary) => make_json_response(StatusCode::OK, &summary),
            HandlerOutput::Attachment(archive) => {
                make_attachment_response("application/zip", &archive.filename, archive.data)
            }
        }
    }

    fn render_error(action: &HandlerAction, e: SyncError) -> ServiceResponse {
        tracing::error!(handler = action.name(), error = %e, "Handler failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.class(), e.to_string())
    }
}
