pub mod config;
pub mod dictionary;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod index;
pub mod metrics_defs;
pub mod reconcile;
pub mod router;
pub mod translate;
pub mod writer;

#[cfg(test)]
mod testutils;

use crate::config::{Config, Credentials};
use crate::dictionary::HttpDictionary;
use crate::errors::ServiceError;
use crate::handlers::SyncContext;
use crate::router::{Router, ServiceResponse};
use crate::translate::{GoogleTranslator, Translator};
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::Request;
use notion::client::NotionClient;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::pin::Pin;
use std::sync::Arc;

/// Builds the provider clients and serves the handler and admin listeners
/// until either fails.
pub async fn run(config: Config, credentials: Credentials) -> Result<(), ServiceError> {
    let translator: Option<Arc<dyn Translator>> = match &credentials.translation_api_key {
        Some(key) => Some(Arc::new(GoogleTranslator::new(
            config.translation.url.clone(),
            key.clone(),
            config.translation.referer.clone(),
        ))),
        None if config.needs_translator() => {
            return Err(ServiceError::MissingCredential(config::GOOGLE_API_KEY_VAR));
        }
        None => None,
    };

    let context = SyncContext {
        source: Arc::new(NotionClient::new(&config.notion, credentials.notion_token)),
        dictionary: Arc::new(HttpDictionary::new(config.dictionary.url.clone())),
        translator,
        table_id: credentials.table_id,
        business_key: config.business_key.clone(),
    };

    let service = L10nService {
        router: Router::new(config.routes.clone(), context),
    };

    let main_task = run_http_service(&config.listener.host, config.listener.port, service);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::<_, ServiceError>::new(|| true),
    );

    tokio::try_join!(main_task, admin_task)?;
    Ok(())
}

struct L10nService {
    router: Router,
}

impl Service<Request<Incoming>> for L10nService {
    type Response = ServiceResponse;
    type Error = ServiceError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let router = self.router.clone();
        Box::pin(async move { Ok(router.route(req).await) })
    }
}
