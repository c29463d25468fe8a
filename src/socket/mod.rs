mod builder;
mod handle;
mod io;
mod lifecycle;
mod options;

pub use self::builder::{BufferConfig, ConnectorBuilder, ListenerBuilder, ReuseConfig};
pub use self::handle::OwnedHandle;

use std::os::fd::{AsRawFd, RawFd};

use log::info;

use crate::addr::SockAddr;
use crate::backend::{Backend, Native};

/// A stream socket on backend `B`.
///
/// Created by [`Socket::create`] (fresh descriptor) or [`Socket::accept`]
/// (descriptor plus both addresses). Dropping it closes the descriptor.
///
/// A socket becomes either a listener or a connection end, never both;
/// the two flags only drive the teardown log lines.
pub struct Socket<B: Backend = Native> {
	handle: OwnedHandle<B>,
	local: Option<SockAddr>,
	peer: Option<SockAddr>,
	listening: bool,
	connected: bool,
}

/// Direction for [`Socket::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
	Read,      // SHUT_RD
	Write,     // SHUT_WR
	ReadWrite, // SHUT_RDWR
}

impl Shutdown {
	#[inline]
	pub(crate) fn raw(self) -> libc::c_int {
		match self {
			Shutdown::Read => libc::SHUT_RD,
			Shutdown::Write => libc::SHUT_WR,
			Shutdown::ReadWrite => libc::SHUT_RDWR,
		}
	}
}

/// Outcome of a connect that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStatus {
	/// The connection is established.
	Connected,

	/// Non-blocking connect started. Poll for `WRITABLE`, then check
	/// [`Socket::take_error`] to learn whether it succeeded.
	InProgress,
}

impl<B: Backend> Socket<B> {
	fn from_handle(handle: OwnedHandle<B>) -> Self {
		Self {
			handle,
			local: None,
			peer: None,
			listening: false,
			connected: false,
		}
	}

	fn from_accepted(handle: OwnedHandle<B>, local: Option<SockAddr>, peer: SockAddr) -> Self {
		Self {
			handle,
			local,
			peer: Some(peer),
			listening: false,
			connected: true,
		}
	}

	/// Local address, once bound or accepted.
	pub fn local_addr(&self) -> Option<&SockAddr> {
		self.local.as_ref()
	}

	/// Peer address, once connected or accepted.
	pub fn peer_addr(&self) -> Option<&SockAddr> {
		self.peer.as_ref()
	}

	pub fn is_listening(&self) -> bool {
		self.listening
	}

	pub fn is_connected(&self) -> bool {
		self.connected
	}

	/// Name of the backend this socket runs on.
	pub fn backend(&self) -> &'static str {
		B::NAME
	}
}

impl<B: Backend> AsRawFd for Socket<B> {
	#[inline]
	fn as_raw_fd(&self) -> RawFd {
		self.handle.as_raw_fd()
	}
}

impl<B: Backend> Drop for Socket<B> {
	fn drop(&mut self) {
		if self.listening {
			if let Some(local) = &self.local {
				info!("Stop listening on {local}");
			} else {
				info!("Stop listening");
			}
		}

		if self.connected {
			if let Some(peer) = &self.peer {
				info!("Closing connection to {peer}");
			}
		}
		// handle drops after this and closes the descriptor
	}
}

impl<B: Backend> std::fmt::Debug for Socket<B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Socket")
			.field("handle", &self.handle)
			.field("local", &self.local)
			.field("peer", &self.peer)
			.field("listening", &self.listening)
			.field("connected", &self.connected)
			.finish()
	}
}
