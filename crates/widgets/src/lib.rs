//! Concrete proxy types.
//!
//! Each widget declares its descriptor table on top of [`widget_schema`] and
//! customizes the [`ProxyKind`](trellis_proxy::ProxyKind) hooks where native
//! behavior differs from plain property mirroring.

pub mod picker;
pub mod widget;

pub use picker::{NATIVE_TYPE as PICKER_TYPE, Picker, PickerKind};
pub use widget::widget_schema;
