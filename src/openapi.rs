use std::borrow::Cow;

use aide::{openapi::Tag, transform::TransformOpenApi};

use crate::{error, extract::Json};

pub mod tag {
	pub const POST: &str = "Post";
	pub const SHARE: &str = "Share";
	pub const COMMENT: &str = "Comment";
	pub const WIDGET: &str = "Widget";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Blog API")
		.summary("A blog with posts, tags, comments and full-text search")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Listing, reading and searching published posts".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::SHARE.into(),
			description: Some("Recommending posts by email".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::COMMENT.into(),
			description: Some("Reader comments".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::WIDGET.into(),
			description: Some("Small summaries for page sidebars".into()),
			..Default::default()
		})
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse {
				errors: vec![error::Message {
					content: "error message".into(),
					field: Some("optional field".into()),
					details: Some(Cow::Owned({
						let mut map = error::Map::new();
						map.insert("key".into(), serde_json::json!("value"));
						map
					})),
				}],
			})
		})
}
