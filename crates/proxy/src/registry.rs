//! Identifier to proxy lookup.
//!
//! The registry holds weak back-references only. Application code owns its
//! proxies; dropping the last handle frees the proxy even if it was never
//! disposed, after which lookups for its identifier report "not found".

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap as HashMap;
use trellis_rpc::ProxyId;

use crate::object::{Proxy, ProxyInner};

/// Non-owning map from [`ProxyId`] to live [`Proxy`].
#[derive(Debug, Clone, Default)]
pub struct ProxyRegistry {
	entries: Rc<RefCell<HashMap<ProxyId, Weak<ProxyInner>>>>,
}

/// Raised when an identifier is registered while a live proxy holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyRegistered(pub ProxyId);

impl ProxyRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Associates `id` with `proxy`.
	///
	/// A stale entry whose proxy has been dropped is replaced silently.
	pub fn register(&self, id: ProxyId, proxy: &Proxy) -> Result<(), AlreadyRegistered> {
		let mut entries = self.entries.borrow_mut();
		if let Some(existing) = entries.get(&id)
			&& existing.strong_count() > 0
		{
			return Err(AlreadyRegistered(id));
		}
		tracing::trace!(id = %id, "registry.register");
		entries.insert(id, proxy.downgrade());
		Ok(())
	}

	/// Returns the live proxy for `id`, or `None` if it was disposed, dropped
	/// or never registered.
	pub fn find(&self, id: &ProxyId) -> Option<Proxy> {
		let found = self
			.entries
			.borrow()
			.get(id)
			.and_then(Weak::upgrade)
			.map(Proxy::from_inner);
		if found.is_none() {
			self.prune(id);
		}
		found
	}

	/// Unregisters `id`. Removing an unknown identifier is a no-op.
	pub fn remove(&self, id: &ProxyId) {
		if self.entries.borrow_mut().remove(id).is_some() {
			tracing::trace!(id = %id, "registry.remove");
		}
	}

	/// Returns true if a live proxy is registered under `id`.
	pub fn contains(&self, id: &ProxyId) -> bool {
		self.entries
			.borrow()
			.get(id)
			.is_some_and(|weak| weak.strong_count() > 0)
	}

	/// Number of entries whose proxy is still alive.
	pub fn len(&self) -> usize {
		self.entries
			.borrow()
			.values()
			.filter(|weak| weak.strong_count() > 0)
			.count()
	}

	/// Returns true if no live proxy is registered.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn prune(&self, id: &ProxyId) {
		let mut entries = self.entries.borrow_mut();
		if entries.get(id).is_some_and(|weak| weak.strong_count() == 0) {
			entries.remove(id);
		}
	}
}
