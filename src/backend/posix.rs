use std::os::fd::RawFd;
use std::time::Duration;

use super::{
	Backend, Capabilities, IntOption, NonBlockingStyle, check, check_len, setsockopt_int, so_error,
	with_storage,
};
use crate::addr::{Family, SockAddr};
use crate::error::Errno;
use crate::socket::Shutdown;

/// From <linux/sockios.h>; libc does not export it for Linux.
const SIOCATMARK: libc::Ioctl = 0x8905;

/// BSD-socket stack: errno convention, fcntl flags, native `poll`.
#[derive(Debug, Clone, Copy)]
pub struct Posix;

impl Backend for Posix {
	const NAME: &'static str = "posix";
	const CAPS: Capabilities = Capabilities {
		ipv6: true,
		out_of_band: true,
		linger: true,
		at_mark: true,
		so_error: true,
		native_poll: true,
	};
	const NONBLOCKING: NonBlockingStyle = NonBlockingStyle::Fcntl;

	fn socket(family: Family) -> Result<RawFd, Errno> {
		check(unsafe { libc::socket(family.raw(), libc::SOCK_STREAM | libc::SOCK_CLOEXEC, 0) })
	}

	fn close(fd: RawFd) -> Result<(), Errno> {
		check(unsafe { libc::close(fd) }).map(drop)
	}

	fn bind(fd: RawFd, addr: &SockAddr) -> Result<(), Errno> {
		check(unsafe { libc::bind(fd, addr.as_ptr(), addr.len()) }).map(drop)
	}

	fn local_name(fd: RawFd) -> Result<SockAddr, Errno> {
		with_storage(|ptr, len| check(unsafe { libc::getsockname(fd, ptr, len) }))
			.map(|(_, addr)| addr)
	}

	fn listen(fd: RawFd, backlog: i32) -> Result<(), Errno> {
		check(unsafe { libc::listen(fd, backlog) }).map(drop)
	}

	fn accept(fd: RawFd) -> Result<(RawFd, SockAddr), Errno> {
		let mut accepted = -1;
		let result = with_storage(|ptr, len| {
			accepted = check(unsafe { libc::accept4(fd, ptr, len, libc::SOCK_CLOEXEC) })?;
			Ok(accepted)
		});
		match result {
			Ok(pair) => Ok(pair),
			Err(errno) => {
				// Accepted but the peer address was unusable; don't leak the descriptor.
				if accepted >= 0 {
					unsafe { libc::close(accepted) };
				}
				Err(errno)
			}
		}
	}

	fn connect(fd: RawFd, addr: &SockAddr) -> Result<(), Errno> {
		check(unsafe { libc::connect(fd, addr.as_ptr(), addr.len()) }).map(drop)
	}

	fn shutdown(fd: RawFd, how: Shutdown) -> Result<(), Errno> {
		check(unsafe { libc::shutdown(fd, how.raw()) }).map(drop)
	}

	fn recv(fd: RawFd, buf: &mut [u8], oob: bool) -> Result<usize, Errno> {
		let flags = if oob { libc::MSG_OOB } else { 0 };
		check_len(unsafe {
			libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), flags)
		})
	}

	fn send(fd: RawFd, buf: &[u8]) -> Result<usize, Errno> {
		// MSG_NOSIGNAL: a broken pipe is reported as EPIPE instead of raising SIGPIPE.
		check_len(unsafe {
			libc::send(fd, buf.as_ptr() as *const libc::c_void, buf.len(), libc::MSG_NOSIGNAL)
		})
	}

	fn set_nonblocking(fd: RawFd, nonblocking: bool) -> Result<(), Errno> {
		let flags = check(unsafe { libc::fcntl(fd, libc::F_GETFL) })?;
		let new_flags = if nonblocking {
			flags | libc::O_NONBLOCK
		} else {
			flags & !libc::O_NONBLOCK
		};
		check(unsafe { libc::fcntl(fd, libc::F_SETFL, new_flags) }).map(drop)
	}

	fn set_int_option(fd: RawFd, option: IntOption, value: libc::c_int) -> Result<(), Errno> {
		check(setsockopt_int(fd, option, value)).map(drop)
	}

	fn set_linger(fd: RawFd, linger: Option<Duration>) -> Result<(), Errno> {
		let val = match linger {
			None => libc::linger { l_onoff: 0, l_linger: 0 },
			Some(time) => libc::linger {
				l_onoff: 1,
				l_linger: time.as_secs().min(libc::c_int::MAX as u64) as libc::c_int,
			},
		};
		check(unsafe {
			libc::setsockopt(
				fd,
				libc::SOL_SOCKET,
				libc::SO_LINGER,
				&val as *const _ as *const libc::c_void,
				std::mem::size_of::<libc::linger>() as libc::socklen_t,
			)
		})
		.map(drop)
	}

	fn at_mark(fd: RawFd) -> Result<bool, Errno> {
		// sockatmark(3) is this ioctl.
		let mut mark: libc::c_int = 0;
		check(unsafe { libc::ioctl(fd, SIOCATMARK, &mut mark as *mut libc::c_int) })?;
		Ok(mark != 0)
	}

	fn take_error(fd: RawFd) -> Result<Option<Errno>, Errno> {
		so_error(fd)
	}

	fn select(
		nfds: libc::c_int,
		read: &mut libc::fd_set,
		write: &mut libc::fd_set,
		except: &mut libc::fd_set,
		timeout: Option<&mut libc::timeval>,
	) -> Result<usize, Errno> {
		let tv = timeout.map_or(std::ptr::null_mut(), |tv| tv as *mut libc::timeval);
		check(unsafe { libc::select(nfds, read, write, except, tv) }).map(|n| n as usize)
	}

	fn poll(fds: &mut [libc::pollfd], timeout_ms: libc::c_int) -> Result<usize, Errno> {
		check(unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) })
			.map(|n| n as usize)
	}
}
