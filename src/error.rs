use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;
use tower_governor::GovernorError;

use crate::mail;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A machine-readable description of the error.
	pub content: Cow<'a, str>,
	/// The input field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Additional context for the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	#[must_use]
	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	#[must_use]
	pub fn detail(mut self, key: &str, value: impl Serialize) -> Self {
		let details = self.details.get_or_insert_with(|| Cow::Owned(Map::new()));

		details
			.to_mut()
			.insert(key.into(), serde_json::to_value(value).unwrap_or_default());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse<'a> {
	pub errors: Vec<Message<'a>>,
}

/// Route-specific errors describe how they are presented to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;
	fn errors(&self) -> Vec<Message<'_>>;
}

/// Errors that can occur in any route.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] rejection::JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("mail error: {0}")]
	Mail(#[from] mail::Error),
	#[error("rate limit error: {0}")]
	RateLimit(#[from] tower_governor::GovernorError),
}

impl AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) => StatusCode::BAD_REQUEST,
			Self::Json(error) => error.status(),
			Self::Query(error) => error.status(),
			Self::Path(error) => error.status(),
			Self::Database(..) | Self::Mail(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::RateLimit(GovernorError::TooManyRequests { .. }) => StatusCode::TOO_MANY_REQUESTS,
			Self::RateLimit(GovernorError::Other { code, .. }) => *code,
			Self::RateLimit(GovernorError::UnableToExtractKey) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| {
						Message::new(error.code.to_string())
							.field(field.to_string())
							.detail("params", &error.params)
					})
				})
				.collect(),
			Self::Json(error) => Message::new("invalid_json")
				.detail("reason", error.body_text())
				.into_vec(),
			Self::Query(error) => Message::new("invalid_query")
				.detail("reason", error.body_text())
				.into_vec(),
			Self::Path(error) => Message::new("invalid_path")
				.detail("reason", error.body_text())
				.into_vec(),
			Self::Database(..) => Message::new("internal_error").into_vec(),
			Self::Mail(..) => Message::new("mail_error").into_vec(),
			Self::RateLimit(GovernorError::TooManyRequests { wait_time, .. }) => {
				Message::new("rate_limited")
					.detail("wait_time", wait_time)
					.into_vec()
			}
			Self::RateLimit(..) => Message::new("internal_error").into_vec(),
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		}

		let headers = match &self {
			Self::RateLimit(
				GovernorError::TooManyRequests { headers, .. } | GovernorError::Other { headers, .. },
			) => headers.clone(),
			_ => None,
		};

		let mut response = (
			status,
			Json(ErrorResponse {
				errors: self.errors(),
			}),
		)
			.into_response();

		if let Some(headers) = headers {
			response.headers_mut().extend(headers);
		}

		response
	}
}

impl OperationOutput for AppError {
	type Inner = ErrorResponse<'static>;
}

/// The error type returned by route handlers.
///
/// `E` holds the errors specific to a group of routes, while
/// everything else is an [`AppError`].
#[derive(Debug)]
pub enum RouteError<E> {
	App(AppError),
	Route(E),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<E> From<sqlx::Error> for RouteError<E> {
	fn from(error: sqlx::Error) -> Self {
		Self::App(AppError::Database(error))
	}
}

impl<E> From<validator::ValidationErrors> for RouteError<E> {
	fn from(error: validator::ValidationErrors) -> Self {
		Self::App(AppError::Validation(error))
	}
}

impl<E> From<mail::Error> for RouteError<E> {
	fn from(error: mail::Error) -> Self {
		Self::App(AppError::Mail(error))
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => (
				error.status(),
				Json(ErrorResponse {
					errors: error.errors(),
				}),
			)
				.into_response(),
		}
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = ErrorResponse<'static>;
}
