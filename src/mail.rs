use lettre::{
	message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
	AsyncTransport, Message, Tokio1Executor,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid address: {0}")]
	Address(#[from] lettre::address::AddressError),
	#[error("failed to build message: {0}")]
	Build(#[from] lettre::error::Error),
	#[error("smtp error: {0}")]
	Smtp(#[from] lettre::transport::smtp::Error),
}

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpConfig {
	pub host: String,
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<String>,
	/// Use STARTTLS when connecting to the relay.
	pub tls: bool,
}

impl std::fmt::Debug for SmtpConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SmtpConfig")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("username", &self.username)
			.field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
			.field("tls", &self.tls)
			.finish()
	}
}

/// A plain-text message ready to be handed to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
	pub from: String,
	pub to: String,
	pub subject: String,
	pub body: String,
}

fn build_message(message: &EmailMessage) -> Result<Message, Error> {
	Ok(Message::builder()
		.from(message.from.parse::<Mailbox>()?)
		.to(message.to.parse::<Mailbox>()?)
		.subject(&message.subject)
		.body(message.body.clone())?)
}

/// Outbound mail delivery.
///
/// Failures are returned as-is; retrying is left to the transport.
#[axum::async_trait]
pub trait Mailer: Send + Sync {
	async fn send(&self, message: &EmailMessage) -> Result<(), Error>;
}

/// Delivers mail through an SMTP relay.
pub struct SmtpMailer {
	transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
	pub fn new(config: &SmtpConfig) -> Result<Self, Error> {
		let builder = if config.tls {
			AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
		} else {
			AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
		};

		let builder = builder.port(config.port);
		let builder = match (&config.username, &config.password) {
			(Some(username), Some(password)) => {
				builder.credentials(Credentials::new(username.clone(), password.clone()))
			}
			_ => builder,
		};

		Ok(Self {
			transport: builder.build(),
		})
	}
}

#[axum::async_trait]
impl Mailer for SmtpMailer {
	async fn send(&self, message: &EmailMessage) -> Result<(), Error> {
		let email = build_message(message)?;

		tracing::debug!(to = %message.to, subject = %message.subject, "sending email");
		self.transport.send(email).await?;
		tracing::info!(to = %message.to, "email sent");

		Ok(())
	}
}
