use std::marker::PhantomData;
use std::time::Duration;

use super::{ConnectStatus, Socket};
use crate::addr::SockAddr;
use crate::backend::{Backend, Native};

// ============================================================================
// Shared Configuration Structs
// ============================================================================

/// Buffer size configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferConfig {
	pub recv: Option<usize>,
	pub send: Option<usize>,
}

impl BufferConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn recv(mut self, size: usize) -> Self {
		self.recv = Some(size);
		self
	}

	pub fn send(mut self, size: usize) -> Self {
		self.send = Some(size);
		self
	}

	pub fn both(mut self, size: usize) -> Self {
		self.recv = Some(size);
		self.send = Some(size);
		self
	}

	fn apply<B: Backend>(&self, socket: &Socket<B>) -> std::io::Result<()> {
		if let Some(size) = self.recv {
			socket.set_recv_buffer_size(size)?;
		}
		if let Some(size) = self.send {
			socket.set_send_buffer_size(size)?;
		}
		Ok(())
	}
}

/// Address reuse configuration.
#[derive(Debug, Clone, Copy)]
pub struct ReuseConfig {
	pub addr: bool,
}

impl Default for ReuseConfig {
	fn default() -> Self {
		Self {
			addr: true, // listeners restart onto ports still in TIME_WAIT
		}
	}
}

impl ReuseConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn addr(mut self, enable: bool) -> Self {
		self.addr = enable;
		self
	}

	fn apply<B: Backend>(&self, socket: &Socket<B>) -> std::io::Result<()> {
		if self.addr {
			socket.set_reuse_address(true)?;
		}
		Ok(())
	}
}

// ============================================================================
// Listener Builder
// ============================================================================

/// Builder for listening sockets.
///
/// # Example
/// ```ignore
/// use sockplex::{ListenerBuilder, BufferConfig, SockAddr};
///
/// let listener = ListenerBuilder::<sockplex::Posix>::new()
///     .buffers(BufferConfig::new().both(65536))
///     .nonblocking(true)
///     .backlog(16)
///     .bind(&SockAddr::new_v4([0, 0, 0, 0], 21))?;
/// ```
pub struct ListenerBuilder<B: Backend = Native> {
	reuse: ReuseConfig,
	buffers: BufferConfig,
	linger: Option<Option<Duration>>,
	backlog: i32,
	nonblocking: bool,
	_backend: PhantomData<B>,
}

impl<B: Backend> Default for ListenerBuilder<B> {
	fn default() -> Self {
		Self::new()
	}
}

impl<B: Backend> ListenerBuilder<B> {
	pub fn new() -> Self {
		Self {
			reuse: ReuseConfig::default(),
			buffers: BufferConfig::default(),
			linger: None,
			backlog: 128,
			nonblocking: false,
			_backend: PhantomData,
		}
	}

	/// Set address reuse options.
	pub fn reuse(mut self, config: ReuseConfig) -> Self {
		self.reuse = config;
		self
	}

	/// Set buffer sizes.
	pub fn buffers(mut self, config: BufferConfig) -> Self {
		self.buffers = config;
		self
	}

	/// Set SO_LINGER. Fails at `bind` on backends without it.
	pub fn linger(mut self, linger: Option<Duration>) -> Self {
		self.linger = Some(linger);
		self
	}

	/// Set listen backlog. Default: 128.
	pub fn backlog(mut self, backlog: i32) -> Self {
		self.backlog = backlog;
		self
	}

	/// Set non-blocking mode.
	pub fn nonblocking(mut self, enable: bool) -> Self {
		self.nonblocking = enable;
		self
	}

	/// Creates, configures, binds and starts listening.
	pub fn bind(self, addr: &SockAddr) -> std::io::Result<Socket<B>> {
		let mut socket = Socket::<B>::create_in(addr.family())?;

		self.reuse.apply(&socket)?;
		self.buffers.apply(&socket)?;
		if let Some(linger) = self.linger {
			socket.set_linger(linger)?;
		}
		if self.nonblocking {
			socket.set_nonblocking(true)?;
		}

		socket.bind(addr)?;
		socket.listen(self.backlog)?;
		Ok(socket)
	}
}

// ============================================================================
// Connector Builder
// ============================================================================

/// Builder for outgoing connections.
///
/// # Example
/// ```ignore
/// use sockplex::{ConnectorBuilder, ConnectStatus, SockAddr};
///
/// let (conn, status) = ConnectorBuilder::<sockplex::Posix>::new()
///     .nonblocking(true)
///     .connect(&SockAddr::new_v4([127, 0, 0, 1], 2121))?;
/// ```
pub struct ConnectorBuilder<B: Backend = Native> {
	buffers: BufferConfig,
	linger: Option<Option<Duration>>,
	nonblocking: bool,
	_backend: PhantomData<B>,
}

impl<B: Backend> Default for ConnectorBuilder<B> {
	fn default() -> Self {
		Self::new()
	}
}

impl<B: Backend> ConnectorBuilder<B> {
	pub fn new() -> Self {
		Self {
			buffers: BufferConfig::default(),
			linger: None,
			nonblocking: false,
			_backend: PhantomData,
		}
	}

	/// Set buffer sizes.
	pub fn buffers(mut self, config: BufferConfig) -> Self {
		self.buffers = config;
		self
	}

	/// Set SO_LINGER. Fails at `connect` on backends without it.
	pub fn linger(mut self, linger: Option<Duration>) -> Self {
		self.linger = Some(linger);
		self
	}

	/// Connect without blocking; the status tells whether it finished.
	pub fn nonblocking(mut self, enable: bool) -> Self {
		self.nonblocking = enable;
		self
	}

	/// Creates, configures and connects.
	pub fn connect(self, addr: &SockAddr) -> std::io::Result<(Socket<B>, ConnectStatus)> {
		let mut socket = Socket::<B>::create_in(addr.family())?;

		self.buffers.apply(&socket)?;
		if let Some(linger) = self.linger {
			socket.set_linger(linger)?;
		}
		if self.nonblocking {
			socket.set_nonblocking(true)?;
		}

		let status = socket.connect(addr)?;
		Ok((socket, status))
	}
}
