//! Script-side proxies for native objects.
//!
//! Application code holds [`Proxy`] handles; every native effect goes through
//! the [`CommandChannel`] the proxy was created on. The channel batches
//! fire-and-forget operations, answers blocking reads through the host client
//! and routes inbound notifications back to proxies via the
//! [`ProxyRegistry`].
//!
//! ```ignore
//! let (client, log) = RecordingClient::new();
//! let channel = CommandChannel::new(client, &BridgeConfig::default());
//! let kind = Rc::new(ProxyType::new("Label", schema));
//! let label = Proxy::create(&channel, kind, properties([("text", "hi")]))?;
//! label.on("tap", |event| tracing::info!(id = %event.target().cid(), "tapped"))?;
//! channel.process()?;
//! ```

pub mod channel;
pub mod diagnostics;
pub mod error;
pub mod object;
pub mod property;
pub mod registry;
pub mod value;

pub use channel::CommandChannel;
pub use diagnostics::Diagnostics;
pub use error::{BridgeError, Diagnostic, Result};
pub use object::{Event, Lifecycle, ListenerId, Proxy, ProxyKind, ProxyType};
pub use property::{PropertyDef, PropertySchema, PropertyType};
pub use registry::ProxyRegistry;
pub use value::{Callback, PropertyBag, Value, properties};
pub use trellis_rpc::ProxyId;
