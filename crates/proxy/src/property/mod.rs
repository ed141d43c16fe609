//! Declarative property system
//!
//! A [`PropertySchema`] maps each declared name to a [`PropertyDef`]: its
//! [`PropertyType`] coercion rule, optional default, optional custom accessors
//! and whether writes are mirrored to the native object. Writes and reads on a
//! [`Proxy`](crate::Proxy) are resolved through this table.

pub mod color;
mod def;
pub mod font;
mod schema;
mod types;

pub use def::{DefaultValue, Getter, Mirror, PropertyDef, Setter};
pub use schema::PropertySchema;
pub use types::PropertyType;
