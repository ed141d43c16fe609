//! Wire protocol between script-side proxies and the native host.
//!
//! This crate provides the protocol-level primitives of the bridge:
//! * [`Operation`]: the six outbound operation kinds, addressed by [`ProxyId`]
//! * [`Notify`]: asynchronous inbound event delivery
//! * [`NativeClient`]: the seam behind which the native host lives
//! * [`NotifyQueue`]: buffer for notifications until the next processing point
//! * [`StreamClient`]: a line-framed JSON transport over any reader/writer pair
//! * [`RecordingClient`]: an in-process stub that records every operation

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod protocol;
pub mod queue;
pub mod recording;
pub mod stream;

pub use error::{Result, TransportError};
pub use protocol::{
	CounterIdGen, IdAllocator, NativeClient, Notify, OpKind, Operation, Properties, ProxyId,
	WireValue,
};
pub use queue::{NotifyQueue, NotifySender};
pub use recording::{CallLog, RecordingClient};
pub use stream::StreamClient;
