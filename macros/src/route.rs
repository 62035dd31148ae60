use darling::{ast, FromMeta};
use proc_macro::TokenStream;
use quote::{format_ident, quote};

#[derive(FromMeta)]
struct RouteArgs {
	#[darling(multiple)]
	tag: Vec<syn::Expr>,
}

pub fn from_input(args: TokenStream, input: TokenStream) -> TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into()) {
		Ok(x) => x,
		Err(e) => return e.into_compile_error().into(),
	};

	let args = match RouteArgs::from_list(&args) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let function = syn::parse_macro_input!(input as syn::ItemFn);
	let Some((summary, description)) = extract_doc_comment(&function.attrs) else {
		return syn::Error::new_spanned(
			&function.sig.ident,
			"routes need a doc comment with a summary line followed by a description",
		)
		.to_compile_error()
		.into();
	};

	let fn_name = format_ident!("{}_docs", function.sig.ident);
	let fn_vis = &function.vis;
	let tags = args.tag.iter();

	quote! {
		#[tracing::instrument(name = #summary, skip_all)]
		#function

		#fn_vis fn #fn_name(op: aide::transform::TransformOperation) -> aide::transform::TransformOperation {
			op.description(#description).summary(#summary)
				#(
					.tag(#tags)
				)*
		}
	}
	.into()
}

/// Splits the doc comment into its first line (the summary) and the rest (the description).
fn extract_doc_comment(attrs: &[syn::Attribute]) -> Option<(String, String)> {
	let lines = attrs
		.iter()
		.filter_map(|attr| match &attr.meta {
			syn::Meta::NameValue(doc) if doc.path.is_ident("doc") => match &doc.value {
				syn::Expr::Lit(syn::ExprLit {
					lit: syn::Lit::Str(literal),
					..
				}) => Some(literal.value().trim().to_owned()),
				_ => None,
			},
			_ => None,
		})
		.skip_while(String::is_empty)
		.collect::<Vec<_>>();

	let (summary, rest) = lines.split_first()?;
	let description = rest
		.iter()
		.filter(|line| !line.is_empty())
		.map(String::as_str)
		.collect::<Vec<_>>()
		.join(" ");

	if description.is_empty() {
		return None;
	}

	Some((summary.clone(), description))
}
