//! Typed value codec.
//!
//! Turns strongly typed property values into `(value text, type tag,
//! structural subtype)` triples and back:
//! - [`TypeTag`] - generic type written to the `type` attribute
//! - [`StructuralSubtype`] - fixed-arity numeric structure (`structure_type`)
//! - [`Value`] with [`encode`] / [`decode`]
//!
//! Decoding is total: malformed text yields `None` and the caller treats the
//! property as unset.

mod type_tag;
mod value;

pub use type_tag::*;
pub use value::*;
