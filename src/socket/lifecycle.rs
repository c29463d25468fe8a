use std::os::fd::AsRawFd;

use log::{debug, error, info};

use super::{ConnectStatus, OwnedHandle, Shutdown, Socket};
use crate::addr::{Family, SockAddr};
use crate::backend::Backend;
use crate::error::SocketError;

/// Logs a fatal socket error and converts it for the caller.
fn fail(err: SocketError) -> std::io::Error {
	error!("{err}");
	err.into()
}

/// Rejects families the build or the backend cannot handle.
fn check_family<B: Backend>(family: Family) -> Result<(), SocketError> {
	let supported = match family {
		Family::Inet => true,
		Family::Inet6 => B::CAPS.ipv6,
	};
	if family.compiled_in() && supported {
		Ok(())
	} else {
		Err(SocketError::InvalidAddress {
			reason: "address family not supported by this build",
		})
	}
}

impl<B: Backend> Socket<B> {
	/// Creates an IPv4 stream socket.
	pub fn create() -> std::io::Result<Self> {
		Self::create_in(Family::Inet)
	}

	/// Creates a stream socket for `family`.
	pub fn create_in(family: Family) -> std::io::Result<Self> {
		check_family::<B>(family).map_err(fail)?;

		let fd = B::socket(family).map_err(|errno| fail(SocketError::Create { errno }))?;
		// SAFETY: freshly returned by the backend, owned by nobody else.
		let handle = unsafe { OwnedHandle::from_raw(fd) };

		debug!("created {} socket fd={fd} ({:?})", B::NAME, family);
		Ok(Self::from_handle(handle))
	}

	/// Binds to `addr`.
	///
	/// With port 0 the assigned port is read back from the system, so
	/// [`Socket::local_addr`] always reports the real port.
	pub fn bind(&mut self, addr: &SockAddr) -> std::io::Result<()> {
		check_family::<B>(addr.family()).map_err(fail)?;

		B::bind(self.fd(), addr).map_err(|errno| {
			fail(SocketError::Bind {
				errno,
				addr: addr.to_string(),
			})
		})?;

		if addr.port() == 0 {
			match B::local_name(self.fd()) {
				Ok(bound) => self.local = Some(bound),
				Err(errno) => {
					error!("{}", SocketError::GetOption { errno, option: "getsockname" });
					self.local = Some(*addr);
				}
			}
		} else {
			self.local = Some(*addr);
		}

		Ok(())
	}

	/// Marks the socket as a listener.
	pub fn listen(&mut self, backlog: i32) -> std::io::Result<()> {
		debug_assert!(!self.connected, "a connection end cannot become a listener");

		B::listen(self.fd(), backlog)
			.map_err(|errno| fail(SocketError::Listen { errno, backlog }))?;

		self.listening = true;
		if let Some(local) = &self.local {
			info!("Listening on {local}");
		}
		Ok(())
	}

	/// Connects to `addr`.
	///
	/// On a non-blocking socket this usually returns
	/// [`ConnectStatus::InProgress`]: the peer is already recorded and the
	/// socket counts as connected, but the caller must wait for writability.
	pub fn connect(&mut self, addr: &SockAddr) -> std::io::Result<ConnectStatus> {
		debug_assert!(!self.listening, "a listener cannot connect");

		match B::connect(self.fd(), addr) {
			Ok(()) => {
				self.peer = Some(*addr);
				self.connected = true;
				info!("Connected to {addr}");
				Ok(ConnectStatus::Connected)
			}
			Err(errno) if errno.is_in_progress() => {
				self.peer = Some(*addr);
				self.connected = true;
				info!("Connecting to {addr}");
				Ok(ConnectStatus::InProgress)
			}
			Err(errno) => Err(fail(SocketError::Connect {
				errno,
				addr: addr.to_string(),
			})),
		}
	}

	/// Accepts one pending connection.
	///
	/// The new socket carries this listener's local address and the peer's
	/// address. On a non-blocking listener with nothing pending the error
	/// kind is `WouldBlock`: no connection is ready, nothing went wrong.
	pub fn accept(&self) -> std::io::Result<Socket<B>> {
		let (fd, peer) = B::accept(self.fd()).map_err(|errno| {
			let err = SocketError::Accept { errno };
			if errno.is_would_block() {
				err.into()
			} else {
				fail(err)
			}
		})?;
		// SAFETY: freshly returned by accept.
		let handle = unsafe { OwnedHandle::from_raw(fd) };

		let local = self.local.or_else(|| B::local_name(fd).ok());

		info!("Accepted connection from {peer}");
		Ok(Socket::from_accepted(handle, local, peer))
	}

	/// Shuts down one or both directions of the connection.
	pub fn shutdown(&self, how: Shutdown) -> std::io::Result<()> {
		B::shutdown(self.fd(), how).map_err(|errno| fail(SocketError::Shutdown { errno }))
	}

	#[inline]
	pub(crate) fn fd(&self) -> libc::c_int {
		self.handle.as_raw_fd()
	}
}
