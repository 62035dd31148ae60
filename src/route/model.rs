use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
fn five() -> i64 {
	5
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct PageInput {
	/// The page number to return (1-indexed).
	///
	/// Anything that is not an integer returns the first page, and
	/// integers outside of the available range return the last page.
	pub page: Option<String>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct CountInput {
	/// The maximum number of items to return.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "five")]
	pub count: i64,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: Uuid,
}

/// Splits `count` items into pages of `per_page` items.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
	count: i64,
	per_page: i64,
}

impl Paginator {
	pub fn new(count: i64, per_page: i64) -> Self {
		Self {
			count: count.max(0),
			per_page: per_page.max(1),
		}
	}

	/// The number of pages, which is always at least one.
	pub fn num_pages(&self) -> i64 {
		((self.count + self.per_page - 1) / self.per_page).max(1)
	}

	/// Resolves a raw page parameter into a valid page number.
	pub fn page_number(&self, raw: Option<&str>) -> i64 {
		let num_pages = self.num_pages();

		match raw.map(|raw| raw.trim().parse::<i64>()) {
			Some(Ok(number)) if (1..=num_pages).contains(&number) => number,
			Some(Ok(_)) => num_pages,
			Some(Err(_)) | None => 1,
		}
	}

	pub fn offset(&self, number: i64) -> i64 {
		(number - 1) * self.per_page
	}

	pub fn limit(&self) -> i64 {
		self.per_page
	}

	pub fn page<T>(&self, number: i64, items: Vec<T>) -> Page<T> {
		let num_pages = self.num_pages();

		Page {
			items,
			number,
			num_pages,
			count: self.count,
			has_next: number < num_pages,
			has_previous: number > 1,
		}
	}
}

/// A single page of results.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Page<T> {
	pub items: Vec<T>,
	/// The page number (1-indexed).
	pub number: i64,
	pub num_pages: i64,
	/// The total number of items across all pages.
	pub count: i64,
	pub has_next: bool,
	pub has_previous: bool,
}
