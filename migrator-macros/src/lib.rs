use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, ImplItem, ImplItemFn, ItemImpl, Stmt,
    Variant, Visibility,
};

/// Procedural macro that turns an enum into an FFI-safe migrator error
///
/// This macro automatically:
/// 1. Adds `#[derive(Debug, thiserror::Error, uniffi::Error)]` and `#[uniffi(flat_error)]`
/// 2. Adds a `Generic { message: String }` variant if not already present
/// 3. Implements `From<anyhow::Error>` for the error type, keeping the cause chain
///
/// # Usage
///
/// ```rust,ignore
/// #[migrator_error]
/// pub enum StorageProbeError {
///     #[error("marker missing after {attempts} attempts")]
///     MarkerMissing { attempts: u32 },
/// }
/// ```
#[proc_macro_attribute]
pub fn migrator_error(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(
            &input,
            "migrator_error can only be applied to enums",
        )
        .to_compile_error()
        .into();
    };

    let enum_name = &input.ident;
    let visibility = &input.vis;
    let generics = &input.generics;

    // Derives and uniffi attributes are re-emitted below
    let attrs: Vec<_> = input
        .attrs
        .iter()
        .filter(|attr| {
            !attr.path().is_ident("derive") && !attr.path().is_ident("uniffi")
        })
        .collect();

    let mut variants = data_enum.variants.clone();
    let has_generic = variants.iter().any(|variant| variant.ident == "Generic");
    if !has_generic {
        let generic_variant: Variant = syn::parse_quote! {
            /// A generic error that can wrap any anyhow error.
            #[error("Generic error: {message}")]
            Generic {
                /// The error message from the wrapped error.
                message: String
            }
        };
        variants.push(generic_variant);
    }

    quote! {
        #[derive(Debug, thiserror::Error, uniffi::Error)]
        #[uniffi(flat_error)]
        #(#attrs)*
        #visibility enum #enum_name #generics {
            #variants
        }

        impl #generics From<anyhow::Error> for #enum_name #generics {
            fn from(err: anyhow::Error) -> Self {
                Self::Generic {
                    message: Self::describe_anyhow(&err),
                }
            }
        }

        impl #generics #enum_name #generics {
            /// Renders an anyhow error with its cause chain appended.
            fn describe_anyhow(err: &anyhow::Error) -> String {
                let mut message = err.to_string();
                let chain: Vec<String> = err.chain().skip(1).map(|e| e.to_string()).collect();
                if !chain.is_empty() {
                    message.push_str(" (caused by: ");
                    message.push_str(&chain.join(" -> "));
                    message.push(')');
                }
                message
            }
        }
    }
    .into()
}

/// Procedural macro that wraps `uniffi::export` and automatically injects logging context
///
/// This macro automatically:
/// 1. Forwards the attribute to `#[uniffi::export]`
/// 2. Injects `let _migrator_logger_ctx = crate::primitives::logger::LogContext::new("TypeName");`
///    at the start of every `pub fn`. Async bodies are additionally run inside
///    `LOG_CONTEXT.scope(..)`, so the context follows the task and never touches the thread.
/// 3. Adds `async_runtime = "tokio"` if any public function is async
///
/// # Usage
///
/// ```rust,ignore
/// #[migrator_export]
/// impl MigrationCoordinator {
///     pub async fn migrate(&self) -> Result<bool, MigrationError> {
///         // logs are prefixed with [Migrator][MigrationCoordinator]
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn migrator_export(args: TokenStream, input: TokenStream) -> TokenStream {
    let input_impl = parse_macro_input!(input as ItemImpl);

    let type_name = match &*input_impl.self_ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map_or_else(|| "Unknown".to_string(), |segment| segment.ident.to_string()),
        _ => "Unknown".to_string(),
    };

    let has_async_functions = has_async_functions_in_impl(&input_impl.items);

    let new_items = input_impl
        .items
        .iter()
        .map(|item| match item {
            ImplItem::Fn(method) if matches!(method.vis, Visibility::Public(_)) => {
                let mut new_method = method.clone();
                inject_logging_context(&mut new_method, &type_name);
                ImplItem::Fn(new_method)
            }
            _ => item.clone(),
        })
        .collect();

    let new_impl = ItemImpl {
        items: new_items,
        ..input_impl
    };

    let args = with_tokio_runtime(proc_macro2::TokenStream::from(args), has_async_functions);

    quote! {
        #[uniffi::export(#args)]
        #new_impl
    }
    .into()
}

/// Appends `async_runtime = "tokio"` to the export arguments when needed
fn with_tokio_runtime(
    args: proc_macro2::TokenStream,
    has_async_functions: bool,
) -> proc_macro2::TokenStream {
    if !has_async_functions {
        args
    } else if args.is_empty() {
        quote! { async_runtime = "tokio" }
    } else {
        quote! { #args, async_runtime = "tokio" }
    }
}

/// Check if any public functions in the impl items are async
fn has_async_functions_in_impl(impl_items: &[ImplItem]) -> bool {
    impl_items.iter().any(|item| {
        if let ImplItem::Fn(method) = item {
            matches!(method.vis, Visibility::Public(_))
                && method.sig.asyncness.is_some()
        } else {
            false
        }
    })
}

fn inject_logging_context(method: &mut ImplItemFn, type_name: &str) {
    if method.sig.asyncness.is_some() {
        // The guard lives across awaits, so it must sit in a task-local scope of its own
        let block = &method.block;
        method.block = syn::parse_quote! {{
            crate::primitives::logger::LOG_CONTEXT
                .scope(::std::cell::RefCell::new(None), async move {
                    let _migrator_logger_ctx =
                        crate::primitives::logger::LogContext::new(#type_name);
                    #block
                })
                .await
        }};
        return;
    }

    let context_stmt: Stmt = syn::parse_quote! {
        let _migrator_logger_ctx = crate::primitives::logger::LogContext::new(#type_name);
    };

    method.block.stmts.insert(0, context_stmt);
}
