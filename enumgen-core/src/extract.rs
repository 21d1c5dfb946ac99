//! Metadata extraction: resolved candidate → description record.
//!
//! The record is the pure value handed to the emitter and to the description
//! cache. Extraction is a fold over the declaration's attribute and member
//! lists with no dependency on mutable or identity-based state, so re-running
//! it on an unchanged declaration yields a bit-for-bit-equal record — which is
//! what makes equality-based incremental caching correct.

use serde::{Deserialize, Serialize};
use syn::{punctuated::Punctuated, Expr, ExprLit, ExprUnary, Lit, Meta, Token, UnOp, Visibility};

use crate::filter::Candidate;
use crate::symbols::{MarkerIdentity, SymbolTable};

/// Underlying storage type recorded when the declaration does not name one.
pub const DEFAULT_UNDERLYING_TYPE: &str = "i32";

/// Marker option overriding the generated extension name.
pub const OPTION_CLASS_NAME: &str = "extension_class_name";

/// Marker option overriding the generated extension namespace.
pub const OPTION_CLASS_NAMESPACE: &str = "extension_class_namespace";

/// Integer storage types recognized inside `#[repr(..)]`.
const REPR_INT_TYPES: &[&str] = &[
    "i8", "u8", "i16", "u16", "i32", "u32", "i64", "u64", "isize", "usize",
];

/// One enum member with its compile-time constant value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

/// Normalized, value-comparable description of one opted-in enum declaration.
///
/// Never mutated after construction. Field-wise equality (including
/// element-wise `members` equality) is the sole basis for re-emission
/// decisions, so every field must be derived from the declaration alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumToGenerate {
    /// Name of the generated extension unit, `<Name>Extensions` by default
    pub output_name: String,
    /// Fully-qualified identity of the source declaration
    pub declared_qualified_name: String,
    /// Namespace of the generated unit, the enclosing module path by default
    pub output_namespace: String,
    /// Whether the declaration is `pub`
    pub is_public: bool,
    /// Whether the bit-flags marker is present
    pub has_flags: bool,
    /// Declared storage type, `i32` when unspecified
    pub underlying_type: String,
    /// Members in declaration order; only compile-time-constant values
    pub members: Vec<EnumMember>,
}

/// Recoverable per-candidate skip.
///
/// Signals an analysis-environment inconsistency, not a user error; the
/// orchestrator logs it as a diagnostic and continues with other candidates.
#[derive(Debug, Clone)]
pub struct ExtractSkip {
    pub message: String,
}

/// Accumulator for the attribute fold.
#[derive(Default)]
struct MarkerOverrides {
    name: Option<String>,
    namespace: Option<String>,
    has_flags: bool,
}

/// Produce exactly one description record for a resolved candidate.
pub fn extract_enum(
    candidate: &Candidate,
    symbols: &SymbolTable,
) -> Result<EnumToGenerate, ExtractSkip> {
    let declared_qualified_name = symbols.resolve_candidate(candidate).ok_or_else(|| ExtractSkip {
        message: format!(
            "could not resolve declared symbol for enum `{}`",
            candidate.item.ident
        ),
    })?;

    let declared_name = candidate.item.ident.to_string();

    let overrides = candidate
        .item
        .attrs
        .iter()
        .fold(MarkerOverrides::default(), |mut acc, attr| {
            match symbols.resolve_attribute(candidate.file, attr.path()) {
                Some(MarkerIdentity::Flags) => acc.has_flags = true,
                Some(MarkerIdentity::EnumExtensions) => apply_marker_arguments(attr, &mut acc),
                // Unresolvable or unrelated decoration: silently absent.
                None => {}
            }
            acc
        });

    Ok(EnumToGenerate {
        output_name: overrides
            .name
            .unwrap_or_else(|| format!("{declared_name}Extensions")),
        declared_qualified_name,
        output_namespace: overrides
            .namespace
            .unwrap_or_else(|| candidate.module_path.join("::")),
        is_public: matches!(candidate.item.vis, Visibility::Public(_)),
        has_flags: overrides.has_flags,
        underlying_type: underlying_type(candidate),
        members: constant_members(candidate),
    })
}

/// Read the marker's named arguments, later occurrences of a key winning.
///
/// Only non-empty string values override the defaults; anything else leaves
/// the default in place. Malformed argument lists are ignored entirely.
fn apply_marker_arguments(attr: &syn::Attribute, acc: &mut MarkerOverrides) {
    let Meta::List(list) = &attr.meta else {
        return;
    };
    let Ok(nested) = list.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated) else {
        return;
    };

    for meta in &nested {
        let Meta::NameValue(nv) = meta else { continue };
        let Some(value) = string_value(&nv.value).filter(|s| !s.is_empty()) else {
            continue;
        };
        if nv.path.is_ident(OPTION_CLASS_NAME) {
            acc.name = Some(value);
        } else if nv.path.is_ident(OPTION_CLASS_NAMESPACE) {
            acc.namespace = Some(value);
        }
    }
}

fn string_value(expr: &Expr) -> Option<String> {
    if let Expr::Lit(ExprLit {
        lit: Lit::Str(s), ..
    }) = expr
    {
        Some(s.value())
    } else {
        None
    }
}

/// Declared storage type from `#[repr(..)]`, defaulting to `i32`.
fn underlying_type(candidate: &Candidate) -> String {
    for attr in &candidate.item.attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        let Meta::List(list) = &attr.meta else {
            continue;
        };
        let Ok(nested) = list.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
        else {
            continue;
        };
        for meta in &nested {
            if let Meta::Path(p) = meta {
                if let Some(ident) = p.get_ident() {
                    let name = ident.to_string();
                    if REPR_INT_TYPES.contains(&name.as_str()) {
                        return name;
                    }
                }
            }
        }
    }
    DEFAULT_UNDERLYING_TYPE.to_string()
}

/// Members in declaration order, keeping only compile-time-constant values.
///
/// An explicit integer literal anchors the running value; an implicit member
/// takes previous + 1. A non-literal discriminant is skipped and poisons
/// implicit successors until the next explicit literal.
fn constant_members(candidate: &Candidate) -> Vec<EnumMember> {
    let mut members = Vec::with_capacity(candidate.item.variants.len());
    let mut next: Option<i64> = Some(0);

    for variant in &candidate.item.variants {
        match &variant.discriminant {
            Some((_, expr)) => match const_int(expr) {
                Some(value) => {
                    members.push(EnumMember {
                        name: variant.ident.to_string(),
                        value,
                    });
                    next = value.checked_add(1);
                }
                None => next = None,
            },
            None => {
                if let Some(value) = next {
                    members.push(EnumMember {
                        name: variant.ident.to_string(),
                        value,
                    });
                    next = value.checked_add(1);
                }
            }
        }
    }

    members
}

/// Evaluate an integer-literal discriminant, including negated literals.
fn const_int(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse::<i64>().ok(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => {
            if let Expr::Lit(ExprLit {
                lit: Lit::Int(lit), ..
            }) = expr.as_ref()
            {
                lit.base10_parse::<i64>().ok().map(|v| -v)
            } else {
                None
            }
        }
        _ => None,
    }
}
