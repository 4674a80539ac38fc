use heck::ToSnakeCase;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    bracketed, parenthesized, parse::Parse, parse::ParseStream, parse_macro_input,
    punctuated::Punctuated, DeriveInput, Expr, Ident, LitBool, Token, Type,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Lifetime {
    Singleton,
    Scoped,
    Transient,
}

impl Lifetime {
    const VALID_LIFETIMES: &'static [&'static str] = &["singleton", "scoped", "transient"];

    fn suggest_similar(input: &str) -> Vec<&'static str> {
        let mut suggestions: Vec<(&str, f64)> = Self::VALID_LIFETIMES
            .iter()
            .map(|&lt| (lt, strsim::jaro_winkler(input, lt)))
            .filter(|(_, score)| *score > 0.6)
            .collect();

        suggestions.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        suggestions.into_iter().take(2).map(|(lt, _)| lt).collect()
    }

    fn from_ident(ident: &Ident) -> syn::Result<Self> {
        match ident.to_string().as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "scoped" => Ok(Lifetime::Scoped),
            "transient" => Ok(Lifetime::Transient),
            other => {
                let suggestions = Self::suggest_similar(other);
                let error_msg = if suggestions.is_empty() {
                    format!("unknown lifetime '{other}', expected one of: singleton, scoped, transient")
                } else {
                    format!(
                        "unknown lifetime '{other}', did you mean: {}?",
                        suggestions.join(", ")
                    )
                };
                Err(syn::Error::new_spanned(ident, error_msg))
            }
        }
    }

    fn tokens(self) -> proc_macro2::TokenStream {
        match self {
            Lifetime::Singleton => quote! { ::svckit::ServiceLifetime::Singleton },
            Lifetime::Scoped => quote! { ::svckit::ServiceLifetime::Scoped },
            Lifetime::Transient => quote! { ::svckit::ServiceLifetime::Transient },
        }
    }
}

#[derive(Debug, Clone, Default)]
struct HostedCfg {
    run_immediately: bool,
}

/// Everything the three attributes can carry; each attribute accepts a subset.
#[derive(Default)]
struct RegistrationConfig {
    key: Option<Type>,
    lifetime: Option<Lifetime>,
    as_self: Option<bool>,
    implements: Vec<Type>,
    ctor: Option<Expr>,
    hosted: Option<HostedCfg>,
}

#[derive(Clone, Copy, PartialEq)]
enum AttrKind {
    Service,
    HostedService,
    Injectable,
}

impl AttrKind {
    fn name(self) -> &'static str {
        match self {
            AttrKind::Service => "service",
            AttrKind::HostedService => "hosted_service",
            AttrKind::Injectable => "injectable",
        }
    }

    fn params(self) -> &'static [&'static str] {
        match self {
            AttrKind::Service => &["key", "lifetime", "as_self", "implements", "ctor", "hosted"],
            AttrKind::HostedService => &["run_immediately", "implements", "ctor"],
            AttrKind::Injectable => &["implements", "ctor"],
        }
    }
}

fn suggest_param(kind: AttrKind, input: &str) -> Option<&'static str> {
    kind.params()
        .iter()
        .map(|&p| (p, strsim::jaro_winkler(input, p)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(p, _)| p)
}

fn parse_bool_flag(input: ParseStream) -> syn::Result<bool> {
    if input.peek(Token![=]) {
        input.parse::<Token![=]>()?;
        let lit: LitBool = input.parse().map_err(|e| {
            syn::Error::new(e.span(), "expected a bool literal (true/false) or a bare flag")
        })?;
        Ok(lit.value)
    } else {
        Ok(true)
    }
}

fn parse_hosted_list(input: ParseStream) -> syn::Result<HostedCfg> {
    let mut cfg = HostedCfg::default();
    if !input.peek(syn::token::Paren) {
        return Ok(cfg);
    }
    let content;
    parenthesized!(content in input);
    while !content.is_empty() {
        let ident: Ident = content.parse()?;
        if ident == "run_immediately" {
            cfg.run_immediately = parse_bool_flag(&content)?;
        } else {
            return Err(syn::Error::new_spanned(
                ident,
                "expected hosted args: run_immediately[=true|false]",
            ));
        }
        if content.is_empty() {
            break;
        }
        content.parse::<Token![,]>()?;
    }
    Ok(cfg)
}

/// `dyn HostedService` (any path, any extra bounds) in an `implements` list.
fn names_hosted_service(ty: &Type) -> bool {
    let bounds = match ty {
        Type::TraitObject(obj) => &obj.bounds,
        Type::Paren(p) => return names_hosted_service(&p.elem),
        Type::Group(g) => return names_hosted_service(&g.elem),
        _ => return false,
    };
    bounds.iter().any(|b| match b {
        syn::TypeParamBound::Trait(t) => t
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "HostedService"),
        _ => false,
    })
}

fn type_tokens(ty: &Type) -> String {
    quote!(#ty).to_string()
}

impl RegistrationConfig {
    /// Hosted marker present, or `HostedService` declared as a capability.
    fn builds_hosted_service(&self) -> bool {
        self.hosted.is_some() || self.implements.iter().any(names_hosted_service)
    }

    fn parse_for(kind: AttrKind, input: ParseStream) -> syn::Result<Self> {
        let mut cfg = RegistrationConfig::default();
        if kind == AttrKind::HostedService {
            cfg.hosted = Some(HostedCfg::default());
        }

        let mut seen: Vec<String> = Vec::new();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            let param = ident.to_string();

            if !kind.params().contains(&param.as_str()) {
                let msg = match suggest_param(kind, &param) {
                    Some(s) => format!(
                        "unknown `{}` parameter '{param}', did you mean `{s}`?",
                        kind.name()
                    ),
                    None => format!(
                        "unknown `{}` parameter '{param}', expected one of: {}",
                        kind.name(),
                        kind.params().join(", ")
                    ),
                };
                return Err(syn::Error::new_spanned(ident, msg));
            }
            if seen.contains(&param) {
                return Err(syn::Error::new_spanned(
                    ident,
                    format!("duplicate `{param}` parameter"),
                ));
            }
            seen.push(param.clone());

            match param.as_str() {
                "key" => {
                    input.parse::<Token![=]>()?;
                    cfg.key = Some(input.parse()?);
                }
                "lifetime" => {
                    input.parse::<Token![=]>()?;
                    let value: Ident = input.parse().map_err(|e| {
                        syn::Error::new(
                            e.span(),
                            "lifetime must be an identifier, e.g. lifetime = scoped",
                        )
                    })?;
                    cfg.lifetime = Some(Lifetime::from_ident(&value)?);
                }
                "as_self" => {
                    cfg.as_self = Some(parse_bool_flag(input)?);
                }
                "implements" => {
                    input.parse::<Token![=]>()?;
                    let content;
                    bracketed!(content in input);
                    let types: Punctuated<Type, Token![,]> =
                        content.parse_terminated(Type::parse, Token![,])?;
                    cfg.implements = types.into_iter().collect();
                }
                "ctor" => {
                    input.parse::<Token![=]>()?;
                    let expr: Expr = input.parse()?;
                    if let Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(s),
                        ..
                    }) = &expr
                    {
                        return Err(syn::Error::new_spanned(
                            s,
                            "ctor must be a Rust expression, not a string literal. \
                 Use: ctor = MyType::new()  (with parentheses), \
                 or:  ctor = Default::default()",
                        ));
                    }
                    cfg.ctor = Some(expr);
                }
                "hosted" => {
                    cfg.hosted = Some(parse_hosted_list(input)?);
                }
                "run_immediately" => {
                    let value = parse_bool_flag(input)?;
                    cfg.hosted = Some(HostedCfg {
                        run_immediately: value,
                    });
                }
                _ => unreachable!("parameter list checked above"),
            }

            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }

        if let Some(ctor) = &cfg.ctor {
            if !cfg.builds_hosted_service() {
                return Err(syn::Error::new_spanned(
                    ctor,
                    "ctor only builds hosted services; add `hosted` or implement `dyn HostedService`",
                ));
            }
        }

        Ok(cfg)
    }
}

struct ServiceArgs(RegistrationConfig);
struct HostedServiceArgs(RegistrationConfig);
struct InjectableArgs(RegistrationConfig);

impl Parse for ServiceArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        RegistrationConfig::parse_for(AttrKind::Service, input).map(Self)
    }
}

impl Parse for HostedServiceArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        RegistrationConfig::parse_for(AttrKind::HostedService, input).map(Self)
    }
}

impl Parse for InjectableArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        RegistrationConfig::parse_for(AttrKind::Injectable, input).map(Self)
    }
}

/// Register a type with an explicit service marker.
///
/// ```ignore
/// #[service(key = dyn PaymentGateway, lifetime = scoped, as_self = false)]
/// pub struct PaymentService;
/// ```
///
/// `implements` lists the capabilities (trait objects) the type provides, in
/// declaration order; each entry is checked at compile time. An explicit
/// `key` is checked the same way and appended to the capabilities when not
/// already listed. `hosted(...)` additionally registers the type as a hosted
/// service, built with `ctor` or `Default::default()`.
#[proc_macro_attribute]
pub fn service(attr: TokenStream, item: TokenStream) -> TokenStream {
    let ServiceArgs(config) = parse_macro_input!(attr as ServiceArgs);
    let input = parse_macro_input!(item as DeriveInput);
    expand(AttrKind::Service, config, input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Register a type as a hosted service; the type must implement
/// `svckit::HostedService`.
///
/// ```ignore
/// #[derive(Default)]
/// #[hosted_service(run_immediately)]
/// pub struct TestHostService;
/// ```
#[proc_macro_attribute]
pub fn hosted_service(attr: TokenStream, item: TokenStream) -> TokenStream {
    let HostedServiceArgs(config) = parse_macro_input!(attr as HostedServiceArgs);
    let input = parse_macro_input!(item as DeriveInput);
    expand(AttrKind::HostedService, config, input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Make a type visible to naming conventions without a service marker.
///
/// Listing `dyn HostedService` in `implements` also registers the type as a
/// hosted service, built with `ctor` or `Default::default()`.
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let InjectableArgs(config) = parse_macro_input!(attr as InjectableArgs);
    let input = parse_macro_input!(item as DeriveInput);
    expand(AttrKind::Injectable, config, input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn expand(
    kind: AttrKind,
    config: RegistrationConfig,
    input: DeriveInput,
) -> syn::Result<proc_macro2::TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            format!(
                "#[{}] requires a concrete type; generic types cannot be registered",
                kind.name()
            ),
        ));
    }

    let struct_ident = input.ident.clone();
    let self_tokens = struct_ident.to_string();

    // `key = Self` means the type itself
    let key: Option<Type> = config.key.as_ref().map(|k| match k {
        Type::Path(p) if p.qself.is_none() && p.path.is_ident("Self") => {
            syn::parse_quote!(#struct_ident)
        }
        other => other.clone(),
    });

    // An explicit key other than the type itself is a capability too
    let mut capabilities = config.implements.clone();
    if let Some(key) = &key {
        let key_tokens = type_tokens(key);
        if key_tokens != self_tokens && !capabilities.iter().any(|c| type_tokens(c) == key_tokens) {
            capabilities.push(key.clone());
        }
    }

    // Compile-time capability assertions: `Arc<T>` must unsize to each capability
    let cap_asserts = capabilities.iter().enumerate().map(|(i, cap)| {
        let fn_name = format_ident!("__svckit_require_capability_{}", i);
        quote! {
            const _: () = {
                #[allow(dead_code)]
                fn #fn_name(
                    this: ::std::sync::Arc<#struct_ident>,
                ) -> ::std::sync::Arc<#cap> {
                    this
                }
            };
        }
    });

    let implements = capabilities.iter().map(|cap| {
        quote! { .implements::<#cap>() }
    });

    let service_marker = if kind == AttrKind::Service {
        let key = match &key {
            Some(key) => quote! { ::core::option::Option::Some(::svckit::TypeKey::of::<#key>()) },
            None => quote! { ::core::option::Option::None },
        };
        let lifetime = config.lifetime.unwrap_or(Lifetime::Singleton).tokens();
        let as_self = config.as_self.unwrap_or(true);
        quote! {
            .with_service(::svckit::ServiceMarker {
                key: #key,
                lifetime: #lifetime,
                as_self: #as_self,
            })
        }
    } else {
        quote! {}
    };

    let hosted_marker = match &config.hosted {
        Some(hosted) => {
            let run_immediately = hosted.run_immediately;
            quote! {
                .with_hosted(::svckit::HostedServiceMarker {
                    run_immediately: #run_immediately,
                })
            }
        }
        None => quote! {},
    };

    // Factory for either hosted trigger: the marker or the declared capability
    let (hosted_assert, hosted_factory) = if config.builds_hosted_service() {
        let constructor = match &config.ctor {
            Some(expr) => quote! { #expr },
            None => quote! { <#struct_ident as ::core::default::Default>::default() },
        };
        (
            quote! {
                const _: () = {
                    #[allow(dead_code, non_snake_case)]
                    fn __svckit_require_HostedService_impl()
                    where
                        #struct_ident: ::svckit::contracts::HostedService,
                    {}
                };
            },
            quote! {
                .with_hosted_factory(|| {
                    let service: #struct_ident = #constructor;
                    ::std::sync::Arc::new(service)
                        as ::std::sync::Arc<dyn ::svckit::contracts::HostedService>
                })
            },
        )
    } else {
        (quote! {}, quote! {})
    };

    let struct_name_snake = struct_ident.to_string().to_snake_case();
    let registrator_name = format_ident!("__{}_candidate", struct_name_snake);

    Ok(quote! {
        #input

        // Compile-time capability assertions (better errors if trait impls are missing)
        #(#cap_asserts)*
        #hosted_assert

        #[doc(hidden)]
        fn #registrator_name() -> ::svckit::Candidate {
            ::svckit::Candidate::of::<#struct_ident>()
                #(#implements)*
                #service_marker
                #hosted_marker
                #hosted_factory
        }

        ::svckit::inventory::submit! {
            ::svckit::assembly::CandidateRegistrator::new(module_path!(), #registrator_name)
        }
    })
}
