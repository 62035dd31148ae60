#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod mail;
mod markdown;
mod openapi;
mod ratelimit;
mod route;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	config::Config,
	mail::{Mailer, SmtpMailer},
};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// Handlers that only need one dependency can extract it directly,
/// e.g. `State<Database>`.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub mailer: Arc<dyn Mailer>,
	pub config: Arc<Config>,
}

#[derive(Debug, thiserror::Error)]
enum Error {
	#[error(transparent)]
	Config(#[from] config::Error),
	#[error(transparent)]
	Trace(#[from] trace::Error),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error(transparent)]
	Mail(#[from] mail::Error),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

/// Builds the application router, including the generated API documentation.
pub fn app(state: AppState) -> Router {
	let mut api = OpenApi::default();

	let router = ApiRouter::new()
		.nest("/posts", route::posts::routes())
		.nest("/docs", route::docs::routes())
		.route("/sitemap.xml", get(route::sitemap::get_sitemap))
		.finish_api_with(&mut api, openapi::docs)
		.layer(
			ServiceBuilder::new()
				.layer(Extension(Arc::new(api)))
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new()),
		);

	let router = match state.config.rate_limit.then(ratelimit::default).flatten() {
		Some(config) => {
			ratelimit::cleanup_old_limits(&[&config]);
			router.layer(GovernorLayer { config })
		}
		None => router,
	};

	router.with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
	dotenvy::dotenv().ok();

	let config = Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(&config)?;

	let database = Database::connect(&config.database_url).await?;

	sqlx::migrate!().run(&database).await?;

	let mailer = SmtpMailer::new(&config.smtp)?;
	let address = (config.host.clone(), config.port);

	let state = State {
		database,
		mailer: Arc::new(mailer),
		config: Arc::new(config),
	};

	let listener = tokio::net::TcpListener::bind(address).await?;

	tracing::info!(address = %listener.local_addr()?, "listening");

	axum::serve(
		listener,
		app(state).into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await?;

	Ok(())
}
