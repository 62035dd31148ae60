use std::sync::Arc;

use aide::{
	axum::{
		routing::{get, get_with},
		ApiRouter, IntoApiResponse,
	},
	openapi::OpenApi,
	scalar::Scalar,
};
use axum::{response::IntoResponse, Extension};

use crate::{extract::Json, AppState};

/// Where the generated OpenAPI document is served, relative to the docs root.
const API_JSON: &str = "/private/api.json";

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.api_route(
			"/",
			get_with(
				Scalar::new(format!("/docs{API_JSON}"))
					.with_title("Blog API")
					.axum_handler(),
				|op| op.description("This documentation page."),
			),
		)
		.route(API_JSON, get(serve_api))
}

async fn serve_api(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	Json(api.as_ref()).into_response()
}
