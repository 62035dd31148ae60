use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("unknown post {slug} on {year}-{month}-{day}")]
	UnknownPostOn {
		year: i32,
		month: u32,
		day: u32,
		slug: String,
	},
	#[error("unknown tag {0}")]
	UnknownTag(String),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(get_posts, get_posts_docs))
		.api_route("/tag/:tag", get_with(get_tagged_posts, get_tagged_posts_docs))
		.api_route("/search", get_with(search_posts, search_posts_docs))
		.api_route("/stats", get_with(get_stats, get_stats_docs))
		.api_route("/latest", get_with(get_latest_posts, get_latest_posts_docs))
		.api_route(
			"/most-commented",
			get_with(get_most_commented_posts, get_most_commented_posts_docs),
		)
		.api_route(
			"/:year/:month/:day/:slug",
			get_with(get_post, get_post_docs),
		)
		.api_route(
			"/by-id/:id/share",
			get_with(get_share, get_share_docs).post_with(share_post, share_post_docs),
		)
		.api_route(
			"/by-id/:id/comment",
			post_with(create_comment, create_comment_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownPostOn { .. } | Self::UnknownTag(..) => {
				StatusCode::NOT_FOUND
			}
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownPost(post) => error::Message::new("unknown_post")
				.detail("post", post)
				.into_vec(),
			Self::UnknownPostOn {
				year,
				month,
				day,
				slug,
			} => error::Message::new("unknown_post")
				.detail("date", format!("{year:04}-{month:02}-{day:02}"))
				.detail("slug", slug)
				.into_vec(),
			Self::UnknownTag(tag) => error::Message::new("unknown_tag")
				.detail("tag", tag)
				.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use chrono::{TimeZone, Utc};

	use super::model::Status;
	use crate::test::*;

	#[test]
	fn test_share_message() {
		let config = config();
		let post = super::model::Post {
			id: uuid::Uuid::new_v4(),
			author: "admin".into(),
			title: "Notes on Rust".into(),
			slug: "notes-on-rust".into(),
			body: String::new(),
			publish: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
			created_at: Utc::now(),
			updated_at: Utc::now(),
			status: Status::Published,
			tags: Vec::new(),
		};
		let form = super::model::ShareInput {
			name: "Ada".into(),
			email: "ada@example.com".into(),
			to: "grace@example.com".into(),
			comments: Some("Worth it.".into()),
		};

		let message = super::route::share_message(&config, &post, &form);

		assert_eq!(message.from, config.mail_from);
		assert_eq!(message.to, "grace@example.com");
		assert_eq!(message.subject, "Ada recommends you read Notes on Rust");
		assert_eq!(
			message.body,
			"Read Notes on Rust at http://blog.test/posts/2024/3/9/notes-on-rust\n\nAda's comments: Worth it."
		);
	}

	#[tokio::test]
	async fn test_rejected_before_database() {
		let app = offline_app();
		let id = uuid::Uuid::new_v4();

		let response = app.get(&format!("/posts/by-id/{id}/comment")).await;

		assert_eq!(response.status_code(), 405);

		let response = app.get("/posts/by-id/not-a-uuid/share").await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<serde_json::Value>()["errors"][0]["content"],
			"invalid_path"
		);

		let response = app.get("/posts/search").add_query_param("query", " ").await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(
			response.json::<serde_json::Value>(),
			json!({ "query": null, "results": [] })
		);

		let response = app
			.post(&format!("/posts/by-id/{id}/comment"))
			.text("name=Ada")
			.await;

		assert_eq!(response.status_code(), 415);
		assert_eq!(
			response.json::<serde_json::Value>()["errors"][0]["content"],
			"invalid_json"
		);

		let response = app
			.get("/posts/most-commented")
			.add_query_param("count", "101")
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[sqlx::test]
	async fn test_drafts_are_hidden(pool: Database) {
		let author = author(&pool).await;
		let publish = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

		PostFixture::new("Draft", "draft", publish)
			.status(Status::Draft)
			.insert(&pool, author)
			.await;

		let app = app(pool);

		let response = app.get("/posts").await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<serde_json::Value>()["posts"]["count"], 0);

		let response = app.get("/posts/2024/1/2/draft").await;

		assert_eq!(response.status_code(), 404);

		let response = app.get("/posts/stats").await;

		assert_eq!(response.json::<serde_json::Value>()["total_posts"], 0);
	}

	#[sqlx::test]
	async fn test_unknown_tag(pool: Database) {
		let app = app(pool);

		let response = app.get("/posts/tag/missing").await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(
			response.json::<serde_json::Value>()["errors"][0]["content"],
			"unknown_tag"
		);
	}

	#[sqlx::test]
	async fn test_list_by_tag(pool: Database) {
		let author = author(&pool).await;
		let publish = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

		PostFixture::new("Jazz", "jazz", publish)
			.tags(&["music"])
			.insert(&pool, author)
			.await;
		PostFixture::new("Rust", "rust", publish)
			.tags(&["code"])
			.insert(&pool, author)
			.await;

		let app = app(pool);

		let body = app.get("/posts/tag/music").await.json::<serde_json::Value>();

		assert_eq!(body["tag"]["slug"], "music");
		assert_eq!(body["posts"]["count"], 1);
		assert_eq!(body["posts"]["items"][0]["slug"], "jazz");
	}

	#[sqlx::test]
	async fn test_pagination(pool: Database) {
		let author = author(&pool).await;

		for day in 1..=4 {
			let publish = Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap();

			PostFixture::new("Post", &format!("post-{day}"), publish)
				.insert(&pool, author)
				.await;
		}

		let app = app(pool);

		let first = app.get("/posts").await.json::<serde_json::Value>();
		let invalid = app
			.get("/posts")
			.add_query_param("page", "abc")
			.await
			.json::<serde_json::Value>();

		assert_eq!(first, invalid);
		assert_eq!(first["posts"]["number"], 1);
		assert_eq!(first["posts"]["num_pages"], 2);
		assert_eq!(first["posts"]["items"][0]["slug"], "post-4");

		let last = app
			.get("/posts")
			.add_query_param("page", "9999")
			.await
			.json::<serde_json::Value>();

		assert_eq!(last["posts"]["number"], 2);
		assert_eq!(last["posts"]["items"].as_array().unwrap().len(), 1);
		assert_eq!(last["posts"]["items"][0]["slug"], "post-1");
	}

	#[sqlx::test]
	async fn test_post_detail(pool: Database) {
		let author = author(&pool).await;
		let publish = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

		let post = PostFixture::new("Markdown", "markdown", publish)
			.body("**bold**")
			.insert(&pool, author)
			.await;

		comment(&pool, post, "Visible", true).await;
		comment(&pool, post, "Hidden", false).await;

		let app = app(pool);

		let body = app
			.get("/posts/2024/1/2/markdown")
			.await
			.json::<serde_json::Value>();

		assert!(body["body_html"]
			.as_str()
			.unwrap()
			.contains("<strong>bold</strong>"));
		assert_eq!(body["comments"].as_array().unwrap().len(), 1);
		assert_eq!(body["comments"][0]["name"], "Visible");
		assert!(body["comments"][0].get("email").is_none());
		assert_eq!(body["comment_form"]["name"], "");

		let response = app.get("/posts/2024/1/3/markdown").await;

		assert_eq!(response.status_code(), 404);

		let response = app.get("/posts/2024/2/30/markdown").await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_similar_posts(pool: Database) {
		let author = author(&pool).await;
		let publish = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

		PostFixture::new("A", "a", publish)
			.tags(&["x", "y", "z"])
			.insert(&pool, author)
			.await;
		PostFixture::new("B", "b", publish)
			.tags(&["x", "y"])
			.insert(&pool, author)
			.await;
		PostFixture::new("C", "c", publish)
			.tags(&["x"])
			.insert(&pool, author)
			.await;
		PostFixture::new("D", "d", publish)
			.tags(&["w"])
			.insert(&pool, author)
			.await;

		let app = app(pool);

		let body = app.get("/posts/2024/1/2/a").await.json::<serde_json::Value>();
		let similar = body["similar_posts"].as_array().unwrap();

		assert_eq!(similar.len(), 2);
		assert_eq!(similar[0]["slug"], "b");
		assert_eq!(similar[0]["same_tags"], 2);
		assert_eq!(similar[1]["slug"], "c");
		assert_eq!(similar[1]["same_tags"], 1);
	}

	#[sqlx::test]
	async fn test_comment_flow(pool: Database) {
		let author = author(&pool).await;
		let publish = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
		let post = PostFixture::new("Post", "post", publish)
			.insert(&pool, author)
			.await;

		let app = app(pool.clone());
		let path = format!("/posts/by-id/{post}/comment");

		let response = app.get(&path).await;

		assert_eq!(response.status_code(), 405);

		let response = app
			.post(&path)
			.json(&json!({
				"name": "",
				"email": "not-an-email",
				"body": "Hello",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(comment_count(&pool).await, 0);

		let response = app
			.post(&path)
			.json(&json!({
				"name": "Ada",
				"email": "ada@example.com",
				"body": "Great post!",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<serde_json::Value>();

		assert_eq!(body["comment"]["name"], "Ada");
		assert_eq!(body["comment"]["active"], true);
		assert_eq!(body["post"]["slug"], "post");
		assert_eq!(comment_count(&pool).await, 1);

		let response = app
			.post(&format!("/posts/by-id/{}/comment", uuid::Uuid::new_v4()))
			.json(&json!({
				"name": "Ada",
				"email": "ada@example.com",
				"body": "Great post!",
			}))
			.await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_incomplete_forms(pool: Database) {
		let author = author(&pool).await;
		let publish = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
		let post = PostFixture::new("Post", "post", publish)
			.insert(&pool, author)
			.await;

		let mailer = Arc::new(RecordingMailer::default());
		let app = app_with_mailer(pool.clone(), mailer.clone());

		let response = app
			.post(&format!("/posts/by-id/{}/comment", uuid::Uuid::new_v4()))
			.json(&json!({
				"email": "ada@example.com",
				"body": "No name given",
			}))
			.await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(
			response.json::<serde_json::Value>()["errors"][0]["content"],
			"unknown_post"
		);

		let response = app
			.post(&format!("/posts/by-id/{post}/comment"))
			.json(&json!({
				"email": "ada@example.com",
				"body": "No name given",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<serde_json::Value>()["errors"][0]["field"],
			"name"
		);
		assert_eq!(comment_count(&pool).await, 0);

		let response = app
			.post(&format!("/posts/by-id/{post}/share"))
			.json(&json!({
				"name": "Ada",
				"email": "ada@example.com",
			}))
			.await;

		assert_eq!(response.status_code(), 400);

		let body = response.json::<serde_json::Value>();
		let errors = body["errors"].as_array().unwrap();

		assert_eq!(errors.len(), 1);
		assert_eq!(errors[0]["field"], "to");
		assert!(mailer.sent().is_empty());
	}

	#[sqlx::test]
	async fn test_share_flow(pool: Database) {
		let author = author(&pool).await;
		let publish = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
		let post = PostFixture::new("Shared", "shared", publish)
			.insert(&pool, author)
			.await;

		let mailer = Arc::new(RecordingMailer::default());
		let app = app_with_mailer(pool, mailer.clone());
		let path = format!("/posts/by-id/{post}/share");

		let body = app.get(&path).await.json::<serde_json::Value>();

		assert_eq!(body["sent"], false);

		let response = app
			.post(&path)
			.json(&json!({
				"name": "Ada",
				"email": "ada@example.com",
				"to": "nope",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert!(mailer.sent().is_empty());

		let response = app
			.post(&path)
			.json(&json!({
				"name": "Ada",
				"email": "ada@example.com",
				"to": "grace@example.com",
				"comments": "Read this",
			}))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<serde_json::Value>()["sent"], true);

		let sent = mailer.sent();

		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].to, "grace@example.com");
		assert!(sent[0]
			.body
			.contains("http://blog.test/posts/2024/1/2/shared"));
	}

	#[sqlx::test]
	async fn test_search_ranking(pool: Database) {
		let author = author(&pool).await;
		let publish = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

		PostFixture::new("Ownership explained", "title-match", publish)
			.body("A short introduction.")
			.insert(&pool, author)
			.await;
		PostFixture::new("Borrowing", "body-match", publish)
			.body("Some words about ownership.")
			.insert(&pool, author)
			.await;
		PostFixture::new("Ownership in drafts", "draft-match", publish)
			.status(Status::Draft)
			.insert(&pool, author)
			.await;

		let app = app(pool);

		let body = app
			.get("/posts/search")
			.add_query_param("query", "ownership")
			.await
			.json::<serde_json::Value>();

		let results = body["results"].as_array().unwrap();

		assert_eq!(body["query"], "ownership");
		assert_eq!(results.len(), 1);
		assert_eq!(results[0]["slug"], "title-match");
		assert!(results[0]["rank"].as_f64().unwrap() >= 0.3);

		let body = app.get("/posts/search").await.json::<serde_json::Value>();

		assert!(body["query"].is_null());
		assert!(body["results"].as_array().unwrap().is_empty());
	}

	#[sqlx::test]
	async fn test_widgets(pool: Database) {
		let author = author(&pool).await;

		let old = PostFixture::new("Old", "old", Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap())
			.insert(&pool, author)
			.await;
		PostFixture::new("New", "new", Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
			.insert(&pool, author)
			.await;

		comment(&pool, old, "First", true).await;
		comment(&pool, old, "Second", false).await;

		let app = app(pool);

		let body = app.get("/posts/stats").await.json::<serde_json::Value>();

		assert_eq!(body["total_posts"], 2);

		let body = app
			.get("/posts/latest")
			.add_query_param("count", "1")
			.await
			.json::<serde_json::Value>();

		assert_eq!(body.as_array().unwrap().len(), 1);
		assert_eq!(body[0]["slug"], "new");

		let body = app
			.get("/posts/most-commented")
			.await
			.json::<serde_json::Value>();

		assert_eq!(body[0]["slug"], "old");
		assert_eq!(body[0]["total_comments"], 2);
		assert_eq!(body[1]["total_comments"], 0);

		let response = app
			.get("/posts/latest")
			.add_query_param("count", "0")
			.await;

		assert_eq!(response.status_code(), 400);
	}
}
