//! Readiness multiplexing over a caller-supplied set of sockets.
//!
//! The caller owns the `PollInfo` slice; the multiplexer fills each
//! entry's `revents` in place. Backends without a native `poll` go
//! through [`emulate::poll`], which keeps the exact same conventions.

pub(crate) mod emulate;

use std::os::fd::AsRawFd;
use std::time::Duration;

use bitflags::bitflags;
use log::{error, trace};

use crate::backend::{Backend, Native};
use crate::error::SocketError;
use crate::socket::Socket;

bitflags! {
	/// Requested and returned readiness conditions.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct Events: u16 {
		const READABLE = 1 << 0;
		const WRITABLE = 1 << 1;
		/// Urgent (out-of-band) data pending.
		const PRIORITY = 1 << 2;
		const ERROR = 1 << 3;
		const HANGUP = 1 << 4;
	}
}

impl Events {
	pub(crate) fn to_poll(self) -> libc::c_short {
		let mut bits = 0;
		if self.contains(Events::READABLE) {
			bits |= libc::POLLIN;
		}
		if self.contains(Events::WRITABLE) {
			bits |= libc::POLLOUT;
		}
		if self.contains(Events::PRIORITY) {
			bits |= libc::POLLPRI;
		}
		bits
	}

	pub(crate) fn from_poll(bits: libc::c_short) -> Self {
		let mut events = Events::empty();
		if bits & libc::POLLIN != 0 {
			events |= Events::READABLE;
		}
		if bits & libc::POLLOUT != 0 {
			events |= Events::WRITABLE;
		}
		if bits & libc::POLLPRI != 0 {
			events |= Events::PRIORITY;
		}
		if bits & (libc::POLLERR | libc::POLLNVAL) != 0 {
			events |= Events::ERROR;
		}
		if bits & libc::POLLHUP != 0 {
			events |= Events::HANGUP;
		}
		events
	}
}

/// One entry of a multiplexing call.
///
/// Borrows the socket for the duration of the call; `revents` is
/// overwritten by [`Socket::poll`].
pub struct PollInfo<'a, B: Backend = Native> {
	pub socket: &'a Socket<B>,
	pub events: Events,
	pub revents: Events,
}

impl<'a, B: Backend> PollInfo<'a, B> {
	pub fn new(socket: &'a Socket<B>, events: Events) -> Self {
		Self {
			socket,
			events,
			revents: Events::empty(),
		}
	}
}

/// Clamps a timeout to the millisecond range `poll` accepts.
fn timeout_ms(timeout: Duration) -> libc::c_int {
	timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int
}

impl<B: Backend> Socket<B> {
	/// Waits until at least one entry is ready or `timeout` elapses.
	///
	/// Returns the number of ready entries, `0` on timeout. An empty set
	/// returns `0` without calling into the backend.
	pub fn poll(info: &mut [PollInfo<'_, B>], timeout: Duration) -> std::io::Result<usize> {
		if info.is_empty() {
			return Ok(0);
		}

		let mut fds: Vec<libc::pollfd> = info
			.iter()
			.map(|entry| libc::pollfd {
				fd: entry.socket.as_raw_fd(),
				events: entry.events.to_poll(),
				revents: 0,
			})
			.collect();

		let ready = match B::poll(&mut fds, timeout_ms(timeout)) {
			Ok(ready) => ready,
			Err(errno) => {
				let err = SocketError::Poll { errno };
				error!("{err}");
				return Err(err.into());
			}
		};

		for (entry, pfd) in info.iter_mut().zip(&fds) {
			entry.revents = Events::from_poll(pfd.revents);
		}

		trace!("poll: {ready} of {} ready ({})", info.len(), B::NAME);
		Ok(ready)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn requested_bits_translate_to_poll_flags() {
		assert_eq!(Events::READABLE.to_poll(), libc::POLLIN);
		assert_eq!((Events::READABLE | Events::WRITABLE).to_poll(), libc::POLLIN | libc::POLLOUT);
		// ERROR and HANGUP are output-only.
		assert_eq!((Events::ERROR | Events::HANGUP).to_poll(), 0);
	}

	#[test]
	fn returned_flags_translate_to_events() {
		assert_eq!(Events::from_poll(libc::POLLOUT), Events::WRITABLE);
		assert_eq!(Events::from_poll(libc::POLLNVAL), Events::ERROR);
		assert_eq!(
			Events::from_poll(libc::POLLIN | libc::POLLHUP),
			Events::READABLE | Events::HANGUP
		);
	}

	#[test]
	fn timeout_saturates() {
		assert_eq!(timeout_ms(Duration::from_millis(1500)), 1500);
		assert_eq!(timeout_ms(Duration::from_secs(u64::MAX)), libc::c_int::MAX);
	}
}
