//! Application configuration loaded from environment variables.

use std::str::FromStr;

use crate::mail::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{key} has an invalid value: {value:?}")]
	Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub host: String,
	pub port: u16,
	/// Scheme and host that absolute links are built from, without a trailing slash.
	pub site_url: String,
	/// The fixed sender of outbound mail.
	pub mail_from: String,
	pub smtp: SmtpConfig,
	pub rate_limit: bool,
	/// OTLP collector endpoint. Telemetry export is disabled when unset.
	pub otel_endpoint: Option<String>,
	pub otel_sample_ratio: f64,
}

impl Config {
	/// Loads configuration from the process environment.
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads configuration using `lookup` to resolve each variable.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let port = parse(&lookup, "PORT", 3000)?;

		Ok(Self {
			database_url: lookup("DATABASE_URL").ok_or(Error::Missing("DATABASE_URL"))?,
			host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".into()),
			port,
			site_url: lookup("SITE_URL")
				.map(|url| url.trim_end_matches('/').to_owned())
				.unwrap_or_else(|| format!("http://localhost:{port}")),
			mail_from: lookup("MAIL_FROM").unwrap_or_else(|| "blog@localhost".into()),
			smtp: SmtpConfig {
				host: lookup("SMTP_HOST").unwrap_or_else(|| "localhost".into()),
				port: parse(&lookup, "SMTP_PORT", 587)?,
				username: lookup("SMTP_USERNAME"),
				password: lookup("SMTP_PASSWORD"),
				tls: parse(&lookup, "SMTP_TLS", true)?,
			},
			rate_limit: parse(&lookup, "RATE_LIMIT", true)?,
			otel_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT"),
			otel_sample_ratio: parse(&lookup, "OTEL_SAMPLE_RATIO", 1.0)?,
		})
	}
}

fn parse<T: FromStr>(
	lookup: impl Fn(&str) -> Option<String>,
	key: &'static str,
	default: T,
) -> Result<T, Error> {
	match lookup(key) {
		Some(value) => value.trim().parse().map_err(|_| Error::Invalid { key, value }),
		None => Ok(default),
	}
}
