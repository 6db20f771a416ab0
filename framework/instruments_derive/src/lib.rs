use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, FnArg, ImplItemFn, LitStr, Pat};

/// Time an async method and report it as an operation.
///
/// The method must take `self` by reference, return a `Result` and live on a type with a
/// `reporter: Arc<breeze_instruments::Reporter>` field. The operation id defaults to the method
/// name, optionally with a `prefix`, or can be set with `operation_id`.
///
/// ```ignore
/// #[breeze_instrument(prefix = "http_")]
/// pub async fn get(&self, url: &str) -> Result<HttpResponse, HttpClientError> { .. }
/// ```
#[proc_macro_attribute]
pub fn breeze_instrument(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut prefix: Option<LitStr> = None;
    let mut operation_id: Option<LitStr> = None;
    let args_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("prefix") {
            prefix = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("operation_id") {
            operation_id = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("expected `prefix` or `operation_id`"))
        }
    });
    parse_macro_input!(args with args_parser);

    let outer = parse_macro_input!(input as ImplItemFn);
    match expand(outer, prefix, operation_id) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(
    outer: ImplItemFn,
    prefix: Option<LitStr>,
    operation_id: Option<LitStr>,
) -> syn::Result<proc_macro2::TokenStream> {
    if outer.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &outer.sig,
            "breeze_instrument can only be used on async functions",
        ));
    }

    let fn_name = outer.sig.ident.clone();
    let operation_id = match operation_id {
        Some(id) => id.value(),
        None => format!(
            "{}{}",
            prefix.map(|p| p.value()).unwrap_or_default(),
            fn_name
        ),
    };

    let mut has_receiver = false;
    let mut forwarded = Vec::new();
    for arg in &outer.sig.inputs {
        match arg {
            FnArg::Receiver(_) => has_receiver = true,
            FnArg::Typed(pat_type) => match pat_type.pat.as_ref() {
                Pat::Ident(pat_ident) => forwarded.push(pat_ident.ident.clone()),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "breeze_instrument requires plain identifiers as arguments",
                    ))
                }
            },
        }
    }
    if !has_receiver {
        return Err(syn::Error::new_spanned(
            &outer.sig,
            "breeze_instrument requires a `self` receiver with a `reporter` field",
        ));
    }

    // The original body moves into a private method so that `?` and `return` keep their meaning.
    let inner_name = format_ident!("__breeze_instrumented_{}", fn_name);
    let mut inner = outer.clone();
    inner.attrs.retain(|attr| !attr.path().is_ident("doc"));
    inner.vis = syn::Visibility::Inherited;
    inner.sig.ident = inner_name.clone();

    let mut wrapper = outer;
    wrapper.block = syn::parse_quote!({
        let operation_record = ::breeze_instruments::OperationRecord::new(#operation_id);
        let result = self.#inner_name(#(#forwarded),*).await;
        ::breeze_instruments::report_operation(self.reporter.clone(), operation_record, &result);
        result
    });

    Ok(quote! {
        #[doc(hidden)]
        #inner

        #wrapper
    })
}
