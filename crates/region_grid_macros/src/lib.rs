use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn, LitInt};

/// Time a function when the calling crate is built with `perf_stats`.
///
/// The body is wrapped with a guard that logs `[PERF] name: elapsed` through
/// `tracing::info!` on exit if the call took longer than the threshold.
/// Without the feature the guard is compiled out entirely.
///
/// ```ignore
/// #[profile]        // logs above 1ms
/// fn recompute_chunk(&mut self, chunk: ChunkId) { ... }
///
/// #[profile(5)]     // logs above 5ms
/// fn flush(&mut self) { ... }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        match syn::parse::<LitInt>(attr) {
            Ok(lit) => match lit.base10_parse() {
                Ok(value) => value,
                Err(err) => return err.to_compile_error().into(),
            },
            Err(err) => return err.to_compile_error().into(),
        }
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                struct ProfileGuard {
                    name: &'static str,
                    start: std::time::Instant,
                }
                impl Drop for ProfileGuard {
                    fn drop(&mut self) {
                        let elapsed = self.start.elapsed();
                        if elapsed.as_millis() >= #threshold_ms {
                            ::tracing::info!("[PERF] {}: {:?}", self.name, elapsed);
                        }
                    }
                }
                ProfileGuard {
                    name: #fn_name_str,
                    start: std::time::Instant::now(),
                }
            };

            #block
        }
    };

    output.into()
}
