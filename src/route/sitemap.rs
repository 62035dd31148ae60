use std::fmt::Write;

use axum::{
	extract::State,
	http::header,
	response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::{error::AppError, route::posts::model, AppState};

/// A single page listed in the sitemap.
#[derive(Debug)]
pub struct Entry {
	/// The path of the page, starting with `/`.
	pub path: String,
	pub last_modified: DateTime<Utc>,
}

const CHANGE_FREQUENCY: &str = "weekly";
const PRIORITY: &str = "0.9";

/// Renders a sitemap with absolute links rooted at `site_url`.
pub fn render(site_url: &str, entries: &[Entry]) -> String {
	let mut xml = String::from(concat!(
		r#"<?xml version="1.0" encoding="UTF-8"?>"#,
		"\n",
		r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
		"\n",
	));

	for entry in entries {
		// Writing to a String cannot fail
		let _ = writeln!(
			xml,
			"<url><loc>{}</loc><lastmod>{}</lastmod><changefreq>{CHANGE_FREQUENCY}</changefreq><priority>{PRIORITY}</priority></url>",
			html_escape::encode_text(&format!("{site_url}{}", entry.path)),
			entry.last_modified.format("%Y-%m-%d"),
		);
	}

	xml.push_str("</urlset>\n");
	xml
}

/// Lists every published post, newest first.
pub async fn get_sitemap(State(state): State<AppState>) -> Result<Response, AppError> {
	let mut query = model::published();
	query.push(" ORDER BY p.publish DESC");

	let entries = query
		.build_query_as::<model::Post>()
		.fetch_all(&state.database)
		.await?
		.into_iter()
		.map(|post| Entry {
			path: post.absolute_url(),
			last_modified: post.updated_at,
		})
		.collect::<Vec<_>>();

	Ok((
		[(header::CONTENT_TYPE, "application/xml")],
		render(&state.config.site_url, &entries),
	)
		.into_response())
}
