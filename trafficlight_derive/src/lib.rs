use proc_macro::{self, TokenStream};
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

/// Derives `Cyclic` for a field-less enum.
///
/// Variants are visited in declaration order: the first one is the initial state and the last one wraps
/// around to the first.
#[proc_macro_derive(Cyclic)]
pub fn derive_cyclic(input: TokenStream) -> TokenStream {
    let DeriveInput { ident, data, .. } = parse_macro_input!(input);

    let variants = match data {
        Data::Enum(data) => data.variants,
        Data::Struct(_) => {
            return quote! {
                compile_error!("Cyclic can only be derived for enums");
            }
            .into();
        }
        Data::Union(_) => {
            return quote! {
                compile_error!("Cyclic cannot be derived for unions");
            }
            .into();
        }
    };

    if variants.is_empty() {
        return quote! {
            compile_error!("Cyclic requires at least one variant");
        }
        .into();
    }
    if variants.len() > 256 {
        return quote! {
            compile_error!("Cyclic supports at most 256 variants");
        }
        .into();
    }
    if variants
        .iter()
        .any(|variant| !matches!(variant.fields, Fields::Unit))
    {
        return quote! {
            compile_error!("Cyclic variants must not carry data");
        }
        .into();
    }

    let names: Vec<_> = variants.iter().map(|variant| &variant.ident).collect();
    let count = names.len();
    let first = names[0];
    let successors: Vec<_> = names.iter().cycle().skip(1).take(count).collect();
    let indices: Vec<u8> = (0..count).map(|i| i as u8).collect();

    let output = quote! {
        impl Cyclic for #ident {
            const COUNT: usize = #count;

            fn initial() -> Self {
                #ident::#first
            }

            fn next(self) -> Self {
                match self {
                    #( #ident::#names => #ident::#successors, )*
                }
            }

            fn index(self) -> u8 {
                match self {
                    #( #ident::#names => #indices, )*
                }
            }

            fn from_index(index: u8) -> Option<Self> {
                match index {
                    #( #indices => Some(#ident::#names), )*
                    _ => None,
                }
            }
        }
    };
    output.into()
}
