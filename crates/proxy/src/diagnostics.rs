//! Single reporting path for recoverable errors.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::error::Diagnostic;

/// Funnel for [`Diagnostic`]s.
///
/// Every report is logged at warn level and kept in a bounded history so that
/// hosts and tests can inspect what was rejected.
#[derive(Debug)]
pub struct Diagnostics {
	history: RefCell<VecDeque<Diagnostic>>,
	capacity: usize,
	total: Cell<u64>,
}

impl Diagnostics {
	/// Creates a funnel retaining up to `capacity` recent reports.
	pub fn new(capacity: usize) -> Self {
		Self {
			history: RefCell::new(VecDeque::with_capacity(capacity.min(64))),
			capacity,
			total: Cell::new(0),
		}
	}

	/// Reports a diagnostic.
	pub fn emit(&self, diagnostic: Diagnostic) {
		tracing::warn!(diagnostic = %diagnostic, "proxy.diagnostic");
		self.total.set(self.total.get() + 1);
		if self.capacity == 0 {
			return;
		}
		let mut history = self.history.borrow_mut();
		if history.len() == self.capacity {
			history.pop_front();
		}
		history.push_back(diagnostic);
	}

	/// Returns retained diagnostics, oldest first.
	pub fn recent(&self) -> Vec<Diagnostic> {
		self.history.borrow().iter().cloned().collect()
	}

	/// Removes and returns retained diagnostics.
	pub fn take(&self) -> Vec<Diagnostic> {
		self.history.borrow_mut().drain(..).collect()
	}

	/// Total reports since creation, including ones evicted from history.
	pub fn total(&self) -> u64 {
		self.total.get()
	}
}
