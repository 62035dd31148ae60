use axum::extract::State;
use chrono::NaiveDate;
use macros::route;
use uuid::Uuid;
use validator::Validate;

use crate::{
	config::Config,
	extract::{Json, Path, Query, Submission},
	mail::EmailMessage,
	markdown,
	openapi::tag,
	route::model::Paginator,
	AppState, Database,
};

use super::{model, Error, RouteError};

/// Fetches a published post by its unique id.
async fn published_post(database: &Database, id: Uuid) -> Result<model::Post, RouteError> {
	let mut query = model::published();
	query.push(" AND p.id = ").push_bind(id);

	let post = query
		.build_query_as::<model::Post>()
		.fetch_optional(database)
		.await?;

	Ok(post.ok_or(Error::UnknownPost(id))?)
}

async fn list(
	database: &Database,
	tag: Option<model::Tag>,
	page: Option<&str>,
) -> Result<model::PostList, RouteError> {
	let mut count_query = model::published_count();

	if let Some(tag) = &tag {
		model::with_tag(&mut count_query, tag.id);
	}

	let count: i64 = count_query
		.build_query_scalar()
		.fetch_one(database)
		.await?;

	let paginator = Paginator::new(count, model::PAGE_SIZE);
	let number = paginator.page_number(page);

	let mut query = model::published();

	if let Some(tag) = &tag {
		model::with_tag(&mut query, tag.id);
	}

	query
		.push(" ORDER BY p.publish DESC LIMIT ")
		.push_bind(paginator.limit())
		.push(" OFFSET ")
		.push_bind(paginator.offset(number));

	let posts = query
		.build_query_as::<model::Post>()
		.fetch_all(database)
		.await?;

	Ok(model::PostList {
		tag,
		posts: paginator.page(number, posts),
	})
}

/// Builds the email sent when a reader shares a post.
pub(super) fn share_message(
	config: &Config,
	post: &model::Post,
	form: &model::ShareInput,
) -> EmailMessage {
	let url = format!("{}{}", config.site_url, post.absolute_url());

	EmailMessage {
		from: config.mail_from.clone(),
		to: form.to.clone(),
		subject: format!("{} recommends you read {}", form.name, post.title),
		body: format!(
			"Read {} at {}\n\n{}'s comments: {}",
			post.title,
			url,
			form.name,
			form.comments.as_deref().unwrap_or_default()
		),
	}
}

/// Get posts
/// Returns a page of published posts, newest first.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(database): State<Database>,
	Query(input): Query<model::PageInput>,
) -> Result<Json<model::PostList>, RouteError> {
	Ok(Json(list(&database, None, input.page.as_deref()).await?))
}

/// Get posts by tag
/// Returns a page of published posts with the given tag, newest first.
#[route(tag = tag::POST)]
pub async fn get_tagged_posts(
	State(database): State<Database>,
	Path(path): Path<model::TagInput>,
	Query(input): Query<model::PageInput>,
) -> Result<Json<model::PostList>, RouteError> {
	let tag = sqlx::query_as::<_, model::Tag>("SELECT id, name, slug FROM tag WHERE slug = $1")
		.bind(&path.tag)
		.fetch_optional(&database)
		.await?
		.ok_or_else(|| Error::UnknownTag(path.tag.clone()))?;

	Ok(Json(list(&database, Some(tag), input.page.as_deref()).await?))
}

/// Get single post
/// Returns a published post by its publish date and slug, along with its active
/// comments and the posts most similar to it.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	Path(path): Path<model::DateSlugInput>,
) -> Result<Json<model::PostDetail>, RouteError> {
	let unknown = || Error::UnknownPostOn {
		year: path.year,
		month: path.month,
		day: path.day,
		slug: path.slug.clone(),
	};

	let date = NaiveDate::from_ymd_opt(path.year, path.month, path.day).ok_or_else(unknown)?;

	let mut query = model::published();
	query
		.push(" AND p.slug = ")
		.push_bind(path.slug.clone())
		.push(" AND (p.publish AT TIME ZONE 'UTC')::date = ")
		.push_bind(date);

	let post = query
		.build_query_as::<model::Post>()
		.fetch_optional(&database)
		.await?
		.ok_or_else(unknown)?;

	let comments = sqlx::query_as::<_, model::Comment>(
		r#"
			SELECT * FROM comment
			WHERE post_id = $1 AND active
			ORDER BY created_at ASC
		"#,
	)
	.bind(post.id)
	.fetch_all(&database)
	.await?;

	let similar_posts = model::similar(post.id)
		.build_query_as::<model::SimilarPost>()
		.fetch_all(&database)
		.await?;

	Ok(Json(model::PostDetail {
		body_html: markdown::render(&post.body),
		post,
		comments,
		comment_form: model::CommentInput::default(),
		similar_posts,
	}))
}

/// Get share form
/// Returns a published post along with an empty form for sharing it by email.
#[route(tag = tag::SHARE)]
pub async fn get_share(
	State(database): State<Database>,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::ShareOutput>, RouteError> {
	let post = published_post(&database, path.id).await?;

	Ok(Json(model::ShareOutput {
		post,
		form: model::ShareInput::default(),
		sent: false,
	}))
}

/// Share post
/// Recommends a published post to someone by email. Nothing is sent if the form is invalid.
#[route(tag = tag::SHARE)]
pub async fn share_post(
	State(state): State<AppState>,
	Path(path): Path<model::IdInput>,
	Submission(form): Submission<model::ShareInput>,
) -> Result<Json<model::ShareOutput>, RouteError> {
	let post = published_post(&state.database, path.id).await?;

	form.validate()?;

	let message = share_message(&state.config, &post, &form);

	state.mailer.send(&message).await?;
	tracing::info!(post = %post.id, "post shared by email");

	Ok(Json(model::ShareOutput {
		post,
		form,
		sent: true,
	}))
}

/// Create comment
/// Adds a comment to a published post. Nothing is stored if the form is invalid.
#[route(tag = tag::COMMENT)]
pub async fn create_comment(
	State(database): State<Database>,
	Path(path): Path<model::IdInput>,
	Submission(form): Submission<model::CommentInput>,
) -> Result<Json<model::CommentOutput>, RouteError> {
	let post = published_post(&database, path.id).await?;

	form.validate()?;

	let comment = sqlx::query_as::<_, model::Comment>(
		r#"
			INSERT INTO comment (post_id, name, email, body)
			VALUES ($1, $2, $3, $4)
			RETURNING *
		"#,
	)
	.bind(post.id)
	.bind(&form.name)
	.bind(&form.email)
	.bind(&form.body)
	.fetch_one(&database)
	.await?;

	tracing::info!(post = %post.id, comment = %comment.id, "comment created");

	Ok(Json(model::CommentOutput { post, comment }))
}

/// Search posts
/// Returns published posts matching the query, best match first. Titles weigh more than bodies.
#[route(tag = tag::POST)]
pub async fn search_posts(
	State(database): State<Database>,
	Query(input): Query<model::SearchInput>,
) -> Result<Json<model::SearchOutput>, RouteError> {
	let Some(query) = input.query.filter(|query| !query.trim().is_empty()) else {
		return Ok(Json(model::SearchOutput {
			query: None,
			results: Vec::new(),
		}));
	};

	let results = model::search(query.clone())
		.build_query_as::<model::SearchResult>()
		.fetch_all(&database)
		.await?;

	Ok(Json(model::SearchOutput {
		query: Some(query),
		results,
	}))
}

/// Get post stats
/// Returns the number of published posts.
#[route(tag = tag::WIDGET)]
pub async fn get_stats(State(database): State<Database>) -> Result<Json<model::Stats>, RouteError> {
	let total_posts: i64 = model::published_count()
		.build_query_scalar()
		.fetch_one(&database)
		.await?;

	Ok(Json(model::Stats { total_posts }))
}

/// Get latest posts
/// Returns the most recently published posts.
#[route(tag = tag::WIDGET)]
pub async fn get_latest_posts(
	State(database): State<Database>,
	Query(input): Query<model::CountInput>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let mut query = model::published();
	query
		.push(" ORDER BY p.publish DESC LIMIT ")
		.push_bind(input.count);

	let posts = query
		.build_query_as::<model::Post>()
		.fetch_all(&database)
		.await?;

	Ok(Json(posts))
}

/// Get most commented posts
/// Returns the published posts with the most comments, along with their comment count.
#[route(tag = tag::WIDGET)]
pub async fn get_most_commented_posts(
	State(database): State<Database>,
	Query(input): Query<model::CountInput>,
) -> Result<Json<Vec<model::CommentedPost>>, RouteError> {
	let posts = model::most_commented(input.count)
		.build_query_as::<model::CommentedPost>()
		.fetch_all(&database)
		.await?;

	Ok(Json(posts))
}
