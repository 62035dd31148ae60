use pulldown_cmark::{html, Options, Parser};
use schemars::JsonSchema;
use serde::Serialize;

/// HTML that is trusted to be embedded in a page without escaping.
///
/// Nothing is sanitized on the way in, so only author-controlled
/// content should be rendered into one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct SafeHtml(String);

#[cfg(test)]
impl SafeHtml {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Renders Markdown into HTML.
pub fn render(text: &str) -> SafeHtml {
	let parser = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
	let mut output = String::with_capacity(text.len() * 3 / 2);

	html::push_html(&mut output, parser);
	SafeHtml(output)
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_render_bold() {
		let html = render("**bold**");

		assert!(html.as_str().contains("<strong>bold</strong>"));
	}

	#[test]
	fn test_render_is_not_escaped_when_serialized() {
		let html = render("*hi*");

		assert_eq!(
			serde_json::to_value(&html).unwrap(),
			serde_json::json!("<p><em>hi</em></p>\n")
		);
	}

	#[test]
	fn test_render_passes_raw_html_through() {
		let html = render("<span>raw</span>");

		assert!(html.as_str().contains("<span>raw</span>"));
	}
}
