use std::os::fd::RawFd;

use super::{
	Backend, Capabilities, IntOption, NonBlockingStyle, check, check_len, ioctl_nonblocking,
	setsockopt_int, so_error, with_storage,
};
use crate::addr::{Family, SockAddr};
use crate::error::Errno;
use crate::socket::Shutdown;

/// Lightweight embedded IP stack.
///
/// Sets errno like POSIX but has no `fcntl`, no `poll`, no `SO_LINGER` and no
/// urgent-data support. Descriptors are released with `closesocket`.
#[derive(Debug, Clone, Copy)]
pub struct Embedded;

#[inline]
fn closesocket(fd: RawFd) -> libc::c_int {
	unsafe { libc::close(fd) }
}

impl Backend for Embedded {
	const NAME: &'static str = "embedded";
	const CAPS: Capabilities = Capabilities {
		ipv6: false,
		out_of_band: false,
		linger: false,
		at_mark: false,
		so_error: true,
		native_poll: false,
	};
	const NONBLOCKING: NonBlockingStyle = NonBlockingStyle::Ioctl;

	fn socket(family: Family) -> Result<RawFd, Errno> {
		check(unsafe { libc::socket(family.raw(), libc::SOCK_STREAM, 0) })
	}

	fn close(fd: RawFd) -> Result<(), Errno> {
		check(closesocket(fd)).map(drop)
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
			accepted = check(unsafe { libc::accept(fd, ptr, len) })?;
			Ok(accepted)
		});
		if result.is_err() && accepted >= 0 {
			closesocket(accepted);
		}
		result
	}

	fn connect(fd: RawFd, addr: &SockAddr) -> Result<(), Errno> {
		check(unsafe { libc::connect(fd, addr.as_ptr(), addr.len()) }).map(drop)
	}

	fn shutdown(fd: RawFd, how: Shutdown) -> Result<(), Errno> {
		check(unsafe { libc::shutdown(fd, how.raw()) }).map(drop)
	}

	fn recv(fd: RawFd, buf: &mut [u8], _oob: bool) -> Result<usize, Errno> {
		check_len(unsafe { libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0) })
	}

	fn send(fd: RawFd, buf: &[u8]) -> Result<usize, Errno> {
		check_len(unsafe {
			libc::send(fd, buf.as_ptr() as *const libc::c_void, buf.len(), libc::MSG_NOSIGNAL)
		})
	}

	fn set_nonblocking(fd: RawFd, nonblocking: bool) -> Result<(), Errno> {
		check(ioctl_nonblocking(fd, nonblocking)).map(drop)
	}

	fn set_int_option(fd: RawFd, option: IntOption, value: libc::c_int) -> Result<(), Errno> {
		check(setsockopt_int(fd, option, value)).map(drop)
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
}
