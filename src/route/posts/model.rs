pub use crate::route::model::{CountInput, IdInput, Page, PageInput};

use chrono::{DateTime, Datelike, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use crate::markdown::SafeHtml;

/// Posts shown per page when listing.
pub const PAGE_SIZE: i64 = 3;
/// The most similar posts shown alongside a post.
pub const SIMILAR_POSTS: i64 = 4;
/// Search results ranked below this are dropped.
pub const SEARCH_RANK_THRESHOLD: f32 = 0.3;

/// Every published post, newest first unless ordered otherwise.
///
/// Ends in a `WHERE` clause so that more conditions can be appended with `AND`.
const PUBLISHED_POSTS: &str = r#"
	SELECT
		p.id, u.username AS author, p.title, p.slug, p.body,
		p.publish, p.created_at, p.updated_at, p.status,
		ARRAY(
			SELECT t.name FROM tag t
			JOIN post_tag pt ON pt.tag_id = t.id
			WHERE pt.post_id = p.id
			ORDER BY t.name
		) AS tags
	FROM post p
	JOIN "user" u ON u.id = p.author_id
	WHERE p.status = 'published'
"#;

/// Weighted document the search query is ranked against.
const SEARCH_VECTOR: &str =
	"setweight(to_tsvector(published.title), 'A') || setweight(to_tsvector(published.body), 'B')";

/// Starts a query over published posts. Drafts can never be selected
/// through it, no matter what is appended.
pub fn published<'a>() -> QueryBuilder<'a, Postgres> {
	QueryBuilder::new(PUBLISHED_POSTS)
}

/// Starts a count over the same set as [`published`].
pub fn published_count<'a>() -> QueryBuilder<'a, Postgres> {
	QueryBuilder::new("SELECT COUNT(*) FROM post p WHERE p.status = 'published'")
}

/// Restricts a query started by [`published`] or [`published_count`] to a tag.
pub fn with_tag(query: &mut QueryBuilder<'_, Postgres>, tag_id: Uuid) {
	query
		.push(" AND EXISTS (SELECT 1 FROM post_tag pt WHERE pt.post_id = p.id AND pt.tag_id = ")
		.push_bind(tag_id)
		.push(")");
}

/// Published posts sharing at least one tag with `post_id`, most shared tags
/// first and newest first among ties.
pub fn similar<'a>(post_id: Uuid) -> QueryBuilder<'a, Postgres> {
	let mut query = QueryBuilder::new(
		r#"
		SELECT * FROM (
			SELECT published.*, (
				SELECT COUNT(*) FROM post_tag pt
				WHERE pt.post_id = published.id
				AND pt.tag_id IN (SELECT own.tag_id FROM post_tag own WHERE own.post_id = "#,
	);

	query
		.push_bind(post_id)
		.push(")) AS same_tags FROM (")
		.push(PUBLISHED_POSTS)
		.push(") published WHERE published.id <> ")
		.push_bind(post_id)
		.push(") similar WHERE same_tags > 0 ORDER BY same_tags DESC, publish DESC LIMIT ")
		.push_bind(SIMILAR_POSTS);

	query
}

/// Published posts ranked against a full-text query, best match first.
pub fn search<'a>(text: String) -> QueryBuilder<'a, Postgres> {
	let mut query = QueryBuilder::new("SELECT * FROM (SELECT published.*, ts_rank(");

	query
		.push(SEARCH_VECTOR)
		.push(", plainto_tsquery(")
		.push_bind(text)
		.push(")) AS rank FROM (")
		.push(PUBLISHED_POSTS)
		.push(") published) ranked WHERE rank >= ")
		.push_bind(SEARCH_RANK_THRESHOLD)
		.push(" ORDER BY rank DESC, publish DESC");

	query
}

/// Published posts with the most comments, active or not.
pub fn most_commented<'a>(count: i64) -> QueryBuilder<'a, Postgres> {
	let mut query = QueryBuilder::new(
		r#"
		SELECT published.*, (
			SELECT COUNT(*) FROM comment c WHERE c.post_id = published.id
		) AS total_comments
		FROM ("#,
	);

	query
		.push(PUBLISHED_POSTS)
		.push(") published ORDER BY total_comments DESC, publish DESC LIMIT ")
		.push_bind(count);

	query
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Status {
	Draft,
	Published,
}

/// A single blog post.
#[derive(Debug, Serialize, JsonSchema, FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	pub id: Uuid,
	/// The username of the author.
	pub author: String,
	pub title: String,
	/// URL-safe name of the post, unique for its publish date.
	pub slug: String,
	/// The content of the post in Markdown format.
	pub body: String,
	/// When the post was (or will be) published.
	pub publish: DateTime<Utc>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub status: Status,
	/// Names of the tags on the post, sorted.
	pub tags: Vec<String>,
}

impl Post {
	/// The path of the post's detail page.
	pub fn absolute_url(&self) -> String {
		format!(
			"/posts/{}/{}/{}/{}",
			self.publish.year(),
			self.publish.month(),
			self.publish.day(),
			self.slug
		)
	}
}

/// A tag that posts can be filtered by.
#[derive(Debug, Serialize, JsonSchema, FromRow)]
pub struct Tag {
	#[serde(skip)]
	pub id: Uuid,
	pub name: String,
	pub slug: String,
}

/// A reader's comment on a post.
///
/// Missing fields deserialize as empty so that they are reported by validation.
#[model]
#[derive(Debug, Default, Deserialize, Serialize, JsonSchema, Validate, FromRow)]
#[serde(default)]
pub struct Comment {
	/// The unique identifier of the comment.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The post that was commented on.
	#[serde(skip_deserializing)]
	pub post_id: Uuid,
	/// The name shown next to the comment.
	#[validate(length(min = 1, max = 80))]
	pub name: String,
	/// The commenter's email address. Never shown to other readers.
	#[serde(skip_serializing)]
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1))]
	pub body: String,
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	#[serde(skip_deserializing)]
	pub updated_at: DateTime<Utc>,
	/// Inactive comments are hidden by moderators.
	#[serde(skip_deserializing)]
	pub active: bool,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(default)]
pub struct ShareInput {
	/// The name of the person sharing the post.
	#[validate(length(min = 1, max = 25))]
	pub name: String,
	/// The email address of the person sharing the post.
	#[validate(email)]
	pub email: String,
	/// The email address to send the post to.
	#[validate(email)]
	pub to: String,
	/// An optional note included in the email.
	pub comments: Option<String>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct DateSlugInput {
	pub year: i32,
	pub month: u32,
	pub day: u32,
	pub slug: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct TagInput {
	/// The slug of the tag.
	pub tag: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct SearchInput {
	/// The text to search for. Searching is skipped when absent or blank.
	pub query: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PostList {
	/// The tag the posts were filtered by, if any.
	pub tag: Option<Tag>,
	pub posts: Page<Post>,
}

#[derive(Debug, Serialize, JsonSchema, FromRow)]
pub struct SimilarPost {
	#[serde(flatten)]
	#[sqlx(flatten)]
	pub post: Post,
	/// The number of tags shared with the post being viewed.
	pub same_tags: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PostDetail {
	#[serde(flatten)]
	pub post: Post,
	/// The body rendered from Markdown.
	pub body_html: SafeHtml,
	/// Active comments, oldest first.
	pub comments: Vec<Comment>,
	/// An empty form for submitting a new comment.
	pub comment_form: CommentInput,
	pub similar_posts: Vec<SimilarPost>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ShareOutput {
	pub post: Post,
	pub form: ShareInput,
	/// Whether the email was sent.
	pub sent: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CommentOutput {
	pub post: Post,
	pub comment: Comment,
}

#[derive(Debug, Serialize, JsonSchema, FromRow)]
pub struct SearchResult {
	#[serde(flatten)]
	#[sqlx(flatten)]
	pub post: Post,
	/// How well the post matches the query.
	pub rank: f32,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchOutput {
	pub query: Option<String>,
	pub results: Vec<SearchResult>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Stats {
	/// The number of published posts.
	pub total_posts: i64,
}

#[derive(Debug, Serialize, JsonSchema, FromRow)]
pub struct CommentedPost {
	#[serde(flatten)]
	#[sqlx(flatten)]
	pub post: Post,
	pub total_comments: i64,
}
