use std::sync::Arc;

use aide::axum::ApiRouter;
use aide::openapi::OpenApi;
use anyhow::Context;
use axum::http::StatusCode;
use axum::Extension;
use log::{error, info};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use passkit_webservice::docs::{api_docs, docs_routes};
use passkit_webservice::{
    token_verifier, EndpointTable, ListOptions, LogOptions, RegistrationOptions, UpdateOptions,
    WebService,
};

use crate::demo_store::DemoStore;

mod demo_store;
mod env;

#[tokio::main]
async fn main() {
    let result = init().await;

    let exit_code = match result {
        Ok(_) => 0,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{e:#}");
            1
        }
    };

    std::process::exit(exit_code);
}

async fn init() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let unauthorized_status = env::UNAUTHORIZED_STATUS
        .parse::<u16>()
        .context("UNAUTHORIZED_STATUS is not a status code")?;
    let table = EndpointTable::v1()
        .with_unauthorized_status(StatusCode::from_u16(unauthorized_status)?)?;
    let store = DemoStore::new(env::PASS_DIRECTORY.as_str());

    let web_service = create_web_service(table, store);

    let mut api = OpenApi::default();
    let app = ApiRouter::new()
        .nest_api_service("/docs", docs_routes())
        .merge(web_service.router()?)
        .finish_api_with(&mut api, api_docs)
        .layer(Extension(Arc::new(api)))
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive());

    let address = format!("{}:{}", env::API_HOST.as_str(), env::API_PORT.as_str());
    info!("Start http server at {}", address);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_web_service(table: EndpointTable, store: Arc<DemoStore>) -> WebService {
    let mut registration = RegistrationOptions::new()
        .on_register({
            let store = store.clone();
            move |device_id, pass_type_id, serial_number| {
                let store = store.clone();
                async move { store.register(device_id, pass_type_id, serial_number).await }
            }
        })
        .on_unregister({
            let store = store.clone();
            move |device_id, pass_type_id, serial_number| {
                let store = store.clone();
                async move { store.unregister(device_id, pass_type_id, serial_number).await }
            }
        });

    let mut update = UpdateOptions::new().on_update_request({
        let store = store.clone();
        move |pass_type_id, serial_number| {
            let store = store.clone();
            async move { store.pass(pass_type_id, serial_number).await }
        }
    });

    if let Some(expected) = env::AUTHENTICATION_TOKEN.clone() {
        let verifier = token_verifier(move |token| {
            let valid = token == expected;
            async move { Ok(valid) }
        });

        registration = registration.token_verifier(verifier.clone());
        update = update.token_verifier(verifier);
    } else {
        info!("AUTHENTICATION_TOKEN is not set, tokens are not verified");
    }

    let list = ListOptions::new().on_list_retrieve(move |device_id, pass_type_id, filters| {
        let store = store.clone();
        async move { store.updatable(device_id, pass_type_id, filters).await }
    });

    let log = LogOptions::new().on_incoming_log(|logs| {
        for line in logs {
            info!(target: "wallet", "{line}");
        }
        Ok(())
    });

    WebService::new(table)
        .registration(registration)
        .update(update)
        .list(list)
        .log(log)
}
