/// Lifecycle state of a proxy.
///
/// Transitions are `Constructing -> Live -> Disposed`; `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
	/// Identifier allocated and registered; initial properties being applied.
	Constructing,
	/// Fully created and usable.
	Live,
	/// Destroyed. Native operations fail fast.
	Disposed,
}

impl Lifecycle {
	/// Returns true if native operations may still be issued.
	pub fn is_open(self) -> bool {
		!matches!(self, Lifecycle::Disposed)
	}
}
