use crate::{
	diff::{check_depth, reconcile},
	load::load_node,
	Host, Options, Result, VNode,
};
use hashbrown::{hash_map::Entry, HashMap};
use tracing::{info, instrument, trace, warn};

/// Renders [`VNode`] trees into containers of one [`Host`], remembering the last tree per container.
///
/// Each container holds (at most) one root live node at child index 0, which this type owns by position.
/// Don't put anything else into a container before its first render, other than content adopted with [`Renderer::hydrate`].
///
/// # Correct Use
///
/// Between renders, live nodes under a container must only be changed through this [`Renderer`].
/// See [`diff`](`crate::diff`#correct-use).
#[derive(Debug)]
pub struct Renderer<H: Host> {
	host: H,
	options: Options,
	previous: HashMap<H::Key, VNode>,
}

impl<H: Host> Renderer<H> {
	pub fn new(host: H) -> Self {
		Self::with_options(host, Options::default())
	}

	pub fn with_options(host: H, options: Options) -> Self {
		Self {
			host,
			options,
			previous: HashMap::new(),
		}
	}

	pub fn host(&self) -> &H {
		&self.host
	}

	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	pub fn options(&self) -> Options {
		self.options
	}

	pub fn into_host(self) -> H {
		self.host
	}

	/// The tree most recently rendered into `container`, if any.
	pub fn previous(&mut self, container: &H::Node) -> Option<&VNode> {
		let key = self.host.container_key(container);
		self.previous.get(&key)
	}

	/// Patches `container`'s root slot from the previously rendered tree to `vnode`.
	///
	/// # Errors
	///
	/// - [`Error::DepthLimitReached`](`crate::Error::DepthLimitReached`) if `vnode` is nested deeper than [`Options::depth_limit`].
	///   This is checked before anything is patched, so the live tree and previous tree stay as they were.
	/// - Anything else [`reconcile`] reports. The live tree may then be partially patched, so the container's root
	///   live node is removed and the previous tree forgotten. The next render mounts from scratch.
	#[instrument(skip(self, vnode))]
	pub fn render(&mut self, vnode: VNode, container: &H::Node) -> Result<()> {
		check_depth(&vnode, self.options.depth_limit)?;

		let key = self.host.container_key(container);
		let old = self.previous.get(&key);
		trace!(first = old.is_none(), "Rendering.");

		let result = reconcile(&mut self.host, container, Some(&vnode), old, 0, self.options.depth_limit);
		if let Err(error) = &result {
			warn!(%error, "Render failed. Clearing the container for a fresh mount.");
			self.previous.remove(&key);
			if self.host.child_count(container) > 0 {
				self.host.remove_child(container, 0);
			}
		}
		self.host.finish();
		result?;

		self.previous.insert(key, vnode);
		info!("Rendered into {} container(s) so far.", self.previous.len());
		Ok(())
	}

	/// Removes the root live node from `container` and forgets its previous tree, and lets the host forget the container.
	///
	/// Unmounting a container that was never rendered into is a no-op.
	///
	/// # Errors
	///
	/// [`Error::IndexOutOfRange`](`crate::Error::IndexOutOfRange`) if the container's root node has vanished.
	#[instrument(skip(self))]
	pub fn unmount(&mut self, container: &H::Node) -> Result<()> {
		let key = self.host.container_key(container);
		let old = match self.previous.get(&key) {
			Some(old) => old,
			None => {
				trace!("Nothing to unmount.");
				return Ok(());
			}
		};

		let result = reconcile(&mut self.host, container, None, Some(old), 0, self.options.depth_limit);
		self.host.finish();
		result?;

		self.previous.remove(&key);
		self.host.forget_container(container);
		Ok(())
	}

	/// Adopts the live node already at `container`'s root slot as the previous tree,
	/// so that the next [`render`](`Renderer::render`) patches it instead of appending next to it.
	///
	/// Returns whether a tree was adopted. Containers that already have a previous tree, or no children at all, are left alone.
	///
	/// Listeners and value slots can't be read back, so props of these kinds are (re)applied by the next render.
	///
	/// # Errors
	///
	/// See [`load_node`].
	#[instrument(skip(self))]
	pub fn hydrate(&mut self, container: &H::Node) -> Result<bool> {
		let key = self.host.container_key(container);
		let vacant = match self.previous.entry(key) {
			Entry::Occupied(_) => {
				warn!("Container was already rendered into. Not hydrating.");
				return Ok(false);
			}
			Entry::Vacant(vacant) => vacant,
		};

		let root = match self.host.child_at(container, 0) {
			Some(root) => root,
			None => return Ok(false),
		};
		if self.host.child_count(container) > 1 {
			warn!("Container has more than one child. Only the first one is adopted.");
		}

		let vnode = load_node(&self.host, &root, self.options.depth_limit)?;
		vacant.insert(vnode);
		Ok(true)
	}
}

impl<H: Host + Default> Default for Renderer<H> {
	fn default() -> Self {
		Self::new(H::default())
	}
}
