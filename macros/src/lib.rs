mod model;
mod route;

use proc_macro::TokenStream;

/// Instruments a route handler with a tracing span and creates its documentation
/// function, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the summary, the rest becomes the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates a new struct, `XInput`, holding the fields of the model that a client submits.
/// Fields with #[serde(skip_deserializing)] or #[serde(skip)] are skipped, and all
/// other fields are included verbatim (including attributes), except that
/// #[serde(skip_serializing)] is dropped.
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
