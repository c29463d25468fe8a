use crate::backend::{Backend, timeval_from_ms};
use crate::error::Errno;

/// `poll(2)` built on a backend's `select`.
///
/// Same contract as the native call: fills every `revents`, returns the
/// number of entries with at least one condition, `0` on timeout. `POLLPRI`
/// maps to the except set. A negative timeout waits indefinitely.
/// Descriptors below zero are ignored.
pub(crate) fn poll<B: Backend>(
	fds: &mut [libc::pollfd],
	timeout_ms: libc::c_int,
) -> Result<usize, Errno> {
	if fds.is_empty() {
		return Ok(0);
	}

	let mut read: libc::fd_set = unsafe { std::mem::zeroed() };
	let mut write: libc::fd_set = unsafe { std::mem::zeroed() };
	let mut except: libc::fd_set = unsafe { std::mem::zeroed() };

	unsafe {
		libc::FD_ZERO(&mut read);
		libc::FD_ZERO(&mut write);
		libc::FD_ZERO(&mut except);
	}

	let mut max_fd = -1;
	for pfd in fds.iter() {
		if pfd.fd < 0 {
			continue;
		}
		if pfd.fd as usize >= libc::FD_SETSIZE as usize {
			return Err(Errno(libc::EINVAL));
		}
		unsafe {
			if pfd.events & libc::POLLIN != 0 {
				libc::FD_SET(pfd.fd, &mut read);
			}
			if pfd.events & libc::POLLOUT != 0 {
				libc::FD_SET(pfd.fd, &mut write);
			}
			// The except set of a stream socket means urgent data, not an error.
			if pfd.events & libc::POLLPRI != 0 {
				libc::FD_SET(pfd.fd, &mut except);
			}
		}
		max_fd = max_fd.max(pfd.fd);
	}

	let mut tv = timeval_from_ms(timeout_ms.max(0));
	let timeout = (timeout_ms >= 0).then_some(&mut tv);

	B::select(max_fd + 1, &mut read, &mut write, &mut except, timeout)?;

	let mut count = 0;
	for pfd in fds.iter_mut() {
		pfd.revents = 0;
		if pfd.fd < 0 {
			continue;
		}

		unsafe {
			if libc::FD_ISSET(pfd.fd, &read) {
				pfd.revents |= libc::POLLIN;
			}
			if libc::FD_ISSET(pfd.fd, &write) {
				pfd.revents |= libc::POLLOUT;
			}
			if libc::FD_ISSET(pfd.fd, &except) {
				pfd.revents |= libc::POLLPRI;
			}
		}

		// An entry with several conditions still counts once.
		if pfd.revents != 0 {
			count += 1;
		}
	}

	Ok(count)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::Posix;
	use std::os::fd::AsRawFd;
	use std::os::unix::net::UnixStream;

	fn pollfd(fd: libc::c_int, events: libc::c_short) -> libc::pollfd {
		libc::pollfd { fd, events, revents: 0 }
	}

	#[test]
	fn empty_set_returns_zero() {
		assert_eq!(poll::<Posix>(&mut [], 1000), Ok(0));
	}

	#[test]
	fn matches_native_poll_for_readable_and_idle_sockets() {
		use std::io::Write;
		let (mut a, b) = UnixStream::pair().unwrap();
		let (_c, d) = UnixStream::pair().unwrap();
		a.write_all(b"x").unwrap();

		let mut emulated = [
			pollfd(b.as_raw_fd(), libc::POLLIN),
			pollfd(d.as_raw_fd(), libc::POLLIN),
		];
		let mut native = emulated;

		let n_emulated = poll::<Posix>(&mut emulated, 0).unwrap();
		let n_native = <Posix as Backend>::poll(&mut native, 0).unwrap();

		assert_eq!(n_emulated, 1);
		assert_eq!(n_native, 1);
		assert_eq!(emulated[0].revents, libc::POLLIN);
		assert_eq!(native[0].revents, libc::POLLIN);
		assert_eq!(emulated[1].revents, 0);
		assert_eq!(native[1].revents, 0);
	}

	#[test]
	fn readable_and_writable_entry_counts_once() {
		use std::io::Write;
		let (mut a, b) = UnixStream::pair().unwrap();
		a.write_all(b"x").unwrap();

		let mut fds = [pollfd(b.as_raw_fd(), libc::POLLIN | libc::POLLOUT)];
		assert_eq!(poll::<Posix>(&mut fds, 0).unwrap(), 1);
		assert_eq!(fds[0].revents, libc::POLLIN | libc::POLLOUT);
	}

	#[test]
	fn urgent_data_only_reported_when_requested() {
		use std::net::{TcpListener, TcpStream};
		let listener = TcpListener::bind("127.0.0.1:0").unwrap();
		let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
		let (server, _) = listener.accept().unwrap();

		let rc = unsafe { libc::send(client.as_raw_fd(), b"!".as_ptr().cast(), 1, libc::MSG_OOB) };
		assert_eq!(rc, 1);
		let mut wait = [pollfd(server.as_raw_fd(), libc::POLLPRI)];
		assert_eq!(<Posix as Backend>::poll(&mut wait, 1000).unwrap(), 1);

		let mut emulated = [pollfd(server.as_raw_fd(), libc::POLLIN)];
		let mut native = emulated;
		let n_native = <Posix as Backend>::poll(&mut native, 0).unwrap();
		assert_eq!(poll::<Posix>(&mut emulated, 0).unwrap(), n_native);
		assert_eq!(emulated[0].revents, native[0].revents);
		assert_eq!(emulated[0].revents & (libc::POLLERR | libc::POLLPRI), 0);

		let mut emulated = [pollfd(server.as_raw_fd(), libc::POLLPRI)];
		assert_eq!(poll::<Posix>(&mut emulated, 0).unwrap(), 1);
		assert_eq!(emulated[0].revents, libc::POLLPRI);
	}

	#[test]
	fn negative_descriptors_are_skipped() {
		let mut fds = [pollfd(-1, libc::POLLIN)];
		assert_eq!(poll::<Posix>(&mut fds, 0).unwrap(), 0);
		assert_eq!(fds[0].revents, 0);
	}
}
