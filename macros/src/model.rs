use darling::{ast, FromDeriveInput, FromField};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::Meta;

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,
}

/// Returns true if `attr` is a `#[serde(...)]` attribute containing one of `flags`.
fn is_serde_flag(attr: &syn::Attribute, flags: &[&str]) -> bool {
	let Meta::List(ref list) = attr.meta else {
		return false;
	};

	if !list.path.is_ident("serde") {
		return false;
	}

	list.tokens.to_token_stream().into_iter().any(|token| {
		matches!(token, TokenTree::Ident(ref ident) if flags.iter().any(|flag| ident == flag))
	})
}

pub fn from_input(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;
	let input_ident = format_ident!("{}Input", ident);

	let attrs = &receiver.attrs;

	let fields = match receiver.data.take_struct() {
		Some(fields) => fields,
		None => {
			return syn::Error::new_spanned(ident, "expected a struct with named fields")
				.to_compile_error()
				.into()
		}
	};

	let fields = fields.iter().filter_map(|field| {
		let ident = field.ident.as_ref()?;
		let ty = &field.ty;
		let vis = &field.vis;

		// Fields the client cannot set are left out entirely
		if field
			.attrs
			.iter()
			.any(|attr| is_serde_flag(attr, &["skip_deserializing", "skip"]))
		{
			return None;
		}

		// Inputs are echoed back as forms, so nothing is hidden on the way out
		let attrs = field
			.attrs
			.iter()
			.filter(|attr| !is_serde_flag(attr, &["skip_serializing"]));

		Some(quote! {
			#(#attrs)*
			#vis #ident: #ty,
		})
	});

	quote! {
		#input

		#(#attrs)*
		#vis struct #input_ident #generics {
			#(
				#fields
			)*
		}
	}
	.into()
}
