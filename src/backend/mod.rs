//! Native networking stacks behind one contract.
//!
//! Each backend is a zero-sized marker implementing [`Backend`] with
//! associated functions only. Every primitive reports failure as an
//! [`Errno`], whatever the stack's own convention is (errno vs. negative
//! return code). The `Socket` layer checks [`Capabilities`] before calling
//! anything a backend lacks.
//!
//! - `Posix`: BSD sockets, native `poll`
//! - `Console`: `net_*` API with negative return codes, select emulation
//! - `Embedded`: small IP stack, `closesocket` and `select` only

mod console;
mod embedded;
mod posix;

pub use self::console::Console;
pub use self::embedded::Embedded;
pub use self::posix::Posix;

use std::os::fd::RawFd;
use std::time::Duration;

use crate::addr::{Family, SockAddr};
use crate::error::Errno;
use crate::socket::Shutdown;

/// The backend selected for this build.
#[cfg(feature = "backend-console")]
pub type Native = Console;

#[cfg(all(feature = "backend-embedded", not(feature = "backend-console")))]
pub type Native = Embedded;

#[cfg(not(any(feature = "backend-console", feature = "backend-embedded")))]
pub type Native = Posix;

/// What a backend can do natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
	pub ipv6: bool,
	/// MSG_OOB on recv.
	pub out_of_band: bool,
	pub linger: bool,
	pub at_mark: bool,
	/// SO_ERROR readback.
	pub so_error: bool,
	pub native_poll: bool,
}

/// How a backend toggles non-blocking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonBlockingStyle {
	/// `fcntl(F_GETFL)` / `fcntl(F_SETFL, flags | O_NONBLOCK)`
	Fcntl,
	/// `ioctl(FIONBIO, &enable)`
	Ioctl,
}

impl NonBlockingStyle {
	pub fn option_name(self) -> &'static str {
		match self {
			NonBlockingStyle::Fcntl => "O_NONBLOCK",
			NonBlockingStyle::Ioctl => "FIONBIO",
		}
	}
}

/// Integer-valued SOL_SOCKET options every backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntOption {
	ReuseAddr,
	RecvBuffer,
	SendBuffer,
}

impl IntOption {
	pub fn name(self) -> &'static str {
		match self {
			IntOption::ReuseAddr => "SO_REUSEADDR",
			IntOption::RecvBuffer => "SO_RCVBUF",
			IntOption::SendBuffer => "SO_SNDBUF",
		}
	}

	#[inline]
	pub(crate) fn raw(self) -> (libc::c_int, libc::c_int) {
		match self {
			IntOption::ReuseAddr => (libc::SOL_SOCKET, libc::SO_REUSEADDR),
			IntOption::RecvBuffer => (libc::SOL_SOCKET, libc::SO_RCVBUF),
			IntOption::SendBuffer => (libc::SOL_SOCKET, libc::SO_SNDBUF),
		}
	}
}

/// Contract every native stack satisfies.
pub trait Backend: Sized + 'static {
	/// Short name used in log and error messages.
	const NAME: &'static str;
	const CAPS: Capabilities;
	const NONBLOCKING: NonBlockingStyle;

	/// Allocates one stream socket.
	fn socket(family: Family) -> Result<RawFd, Errno>;

	fn close(fd: RawFd) -> Result<(), Errno>;

	fn bind(fd: RawFd, addr: &SockAddr) -> Result<(), Errno>;

	/// Reads back the bound address (getsockname).
	fn local_name(fd: RawFd) -> Result<SockAddr, Errno>;

	fn listen(fd: RawFd, backlog: i32) -> Result<(), Errno>;

	/// Accepts one connection, returning its descriptor and the peer address.
	fn accept(fd: RawFd) -> Result<(RawFd, SockAddr), Errno>;

	fn connect(fd: RawFd, addr: &SockAddr) -> Result<(), Errno>;

	fn shutdown(fd: RawFd, how: Shutdown) -> Result<(), Errno>;

	fn recv(fd: RawFd, buf: &mut [u8], oob: bool) -> Result<usize, Errno>;

	fn send(fd: RawFd, buf: &[u8]) -> Result<usize, Errno>;

	fn set_nonblocking(fd: RawFd, nonblocking: bool) -> Result<(), Errno>;

	fn set_int_option(fd: RawFd, option: IntOption, value: libc::c_int) -> Result<(), Errno>;

	/// `None` disables lingering.
	fn set_linger(_fd: RawFd, _linger: Option<Duration>) -> Result<(), Errno> {
		Err(Errno(libc::ENOSYS))
	}

	fn at_mark(_fd: RawFd) -> Result<bool, Errno> {
		Err(Errno(libc::ENOSYS))
	}

	/// Reads and clears the pending socket error.
	fn take_error(_fd: RawFd) -> Result<Option<Errno>, Errno> {
		Err(Errno(libc::ENOSYS))
	}

	/// Descriptor-set readiness wait. `None` timeout waits indefinitely.
	fn select(
		nfds: libc::c_int,
		read: &mut libc::fd_set,
		write: &mut libc::fd_set,
		except: &mut libc::fd_set,
		timeout: Option<&mut libc::timeval>,
	) -> Result<usize, Errno>;

	/// Readiness multiplexing with `poll(2)` semantics.
	///
	/// Defaults to the select emulation; backends with a native call override it.
	fn poll(fds: &mut [libc::pollfd], timeout_ms: libc::c_int) -> Result<usize, Errno> {
		crate::poll::emulate::poll::<Self>(fds, timeout_ms)
	}
}

/// Maps a syscall-style `-1`/errno result.
#[inline]
pub(crate) fn check(rc: libc::c_int) -> Result<libc::c_int, Errno> {
	if rc == -1 { Err(Errno::last()) } else { Ok(rc) }
}

/// Same as [`check`] for size-returning calls.
#[inline]
pub(crate) fn check_len(rc: libc::ssize_t) -> Result<usize, Errno> {
	if rc < 0 { Err(Errno::last()) } else { Ok(rc as usize) }
}

/// Sets an int option through `setsockopt`.
pub(crate) fn setsockopt_int(fd: RawFd, option: IntOption, value: libc::c_int) -> libc::c_int {
	let (level, name) = option.raw();
	unsafe {
		libc::setsockopt(
			fd,
			level,
			name,
			&value as *const _ as *const libc::c_void,
			std::mem::size_of::<libc::c_int>() as libc::socklen_t,
		)
	}
}

/// Reads and clears SO_ERROR.
pub(crate) fn so_error(fd: RawFd) -> Result<Option<Errno>, Errno> {
	let mut error: libc::c_int = 0;
	let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
	check(unsafe {
		libc::getsockopt(
			fd,
			libc::SOL_SOCKET,
			libc::SO_ERROR,
			&mut error as *mut _ as *mut libc::c_void,
			&mut len,
		)
	})?;
	Ok((error != 0).then_some(Errno(error)))
}

/// Runs `getsockname`/`accept`-style calls that fill an address.
pub(crate) fn with_storage<F>(f: F) -> Result<(libc::c_int, SockAddr), Errno>
where
	F: FnOnce(*mut libc::sockaddr, *mut libc::socklen_t) -> Result<libc::c_int, Errno>,
{
	let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
	let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
	let rc = f(&mut storage as *mut _ as *mut libc::sockaddr, &mut len)?;
	let addr = SockAddr::from_storage(&storage, len).ok_or(Errno(libc::EAFNOSUPPORT))?;
	Ok((rc, addr))
}

/// Toggles FIONBIO.
pub(crate) fn ioctl_nonblocking(fd: RawFd, nonblocking: bool) -> libc::c_int {
	let mut enable: libc::c_int = nonblocking as libc::c_int;
	unsafe { libc::ioctl(fd, libc::FIONBIO as _, &mut enable as *mut libc::c_int) }
}

/// Converts a millisecond timeout into a timeval.
pub(crate) fn timeval_from_ms(timeout_ms: libc::c_int) -> libc::timeval {
	libc::timeval {
		tv_sec: (timeout_ms / 1000) as libc::time_t,
		tv_usec: ((timeout_ms % 1000) * 1000) as libc::suseconds_t,
	}
}
