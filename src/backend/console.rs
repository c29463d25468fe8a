use std::os::fd::RawFd;

use super::{Backend, Capabilities, IntOption, NonBlockingStyle, timeval_from_ms};
use crate::addr::{Family, SockAddr};
use crate::error::Errno;
use crate::socket::Shutdown;

/// Console network API: `net_*` calls returning `-errno`, ioctl-style
/// non-blocking, no native `poll`.
#[derive(Debug, Clone, Copy)]
pub struct Console;

/// Maps a `net_*` result: negative values carry the error code.
#[inline]
fn net_check(rc: libc::c_int) -> Result<libc::c_int, Errno> {
	if rc < 0 { Err(Errno::from_negative(rc)) } else { Ok(rc) }
}

impl Backend for Console {
	const NAME: &'static str = "console";
	const CAPS: Capabilities = Capabilities {
		ipv6: false,
		out_of_band: false,
		linger: false,
		at_mark: false,
		so_error: false,
		native_poll: false,
	};
	const NONBLOCKING: NonBlockingStyle = NonBlockingStyle::Ioctl;

	fn socket(family: Family) -> Result<RawFd, Errno> {
		net_check(net::net_socket(family.raw(), libc::SOCK_STREAM, 0))
	}

	fn close(fd: RawFd) -> Result<(), Errno> {
		net_check(net::net_close(fd)).map(drop)
	}

	fn bind(fd: RawFd, addr: &SockAddr) -> Result<(), Errno> {
		net_check(net::net_bind(fd, addr.as_ptr(), addr.len())).map(drop)
	}

	fn local_name(fd: RawFd) -> Result<SockAddr, Errno> {
		super::with_storage(|ptr, len| net_check(net::net_getsockname(fd, ptr, len)))
			.map(|(_, addr)| addr)
	}

	fn listen(fd: RawFd, backlog: i32) -> Result<(), Errno> {
		net_check(net::net_listen(fd, backlog)).map(drop)
	}

	fn accept(fd: RawFd) -> Result<(RawFd, SockAddr), Errno> {
		let mut accepted = -1;
		let result = super::with_storage(|ptr, len| {
			accepted = net_check(net::net_accept(fd, ptr, len))?;
			Ok(accepted)
		});
		if result.is_err() && accepted >= 0 {
			let _ = net::net_close(accepted);
		}
		result
	}

	fn connect(fd: RawFd, addr: &SockAddr) -> Result<(), Errno> {
		net_check(net::net_connect(fd, addr.as_ptr(), addr.len())).map(drop)
	}

	fn shutdown(fd: RawFd, how: Shutdown) -> Result<(), Errno> {
		net_check(net::net_shutdown(fd, how.raw())).map(drop)
	}

	fn recv(fd: RawFd, buf: &mut [u8], _oob: bool) -> Result<usize, Errno> {
		net_check(net::net_recv(fd, buf, 0)).map(|n| n as usize)
	}

	fn send(fd: RawFd, buf: &[u8]) -> Result<usize, Errno> {
		net_check(net::net_send(fd, buf, 0)).map(|n| n as usize)
	}

	fn set_nonblocking(fd: RawFd, nonblocking: bool) -> Result<(), Errno> {
		let mut enable: libc::c_int = nonblocking as libc::c_int;
		net_check(net::net_ioctl(fd, libc::FIONBIO as _, &mut enable)).map(drop)
	}

	fn set_int_option(fd: RawFd, option: IntOption, value: libc::c_int) -> Result<(), Errno> {
		let (level, name) = option.raw();
		net_check(net::net_setsockopt(fd, level, name, value)).map(drop)
	}

	fn select(
		nfds: libc::c_int,
		read: &mut libc::fd_set,
		write: &mut libc::fd_set,
		except: &mut libc::fd_set,
		timeout: Option<&mut libc::timeval>,
	) -> Result<usize, Errno> {
		net_check(net::net_select(nfds, read, write, except, timeout)).map(|n| n as usize)
	}
}

/// The `net_*` entry points.
///
/// Hosted builds route them to the host stack, translating errno into the
/// negative return codes the console library hands back.
mod net {
	use super::timeval_from_ms;

	#[inline]
	fn rc(ret: libc::c_int) -> libc::c_int {
		if ret < 0 { -crate::error::errno() } else { ret }
	}

	#[inline]
	fn rc_len(ret: libc::ssize_t) -> libc::c_int {
		if ret < 0 {
			-crate::error::errno()
		} else {
			ret.min(libc::c_int::MAX as libc::ssize_t) as libc::c_int
		}
	}

	pub(super) fn net_socket(
		domain: libc::c_int,
		ty: libc::c_int,
		protocol: libc::c_int,
	) -> libc::c_int {
		rc(unsafe { libc::socket(domain, ty, protocol) })
	}

	pub(super) fn net_close(fd: libc::c_int) -> libc::c_int {
		rc(unsafe { libc::close(fd) })
	}

	pub(super) fn net_bind(
		fd: libc::c_int,
		addr: *const libc::sockaddr,
		len: libc::socklen_t,
	) -> libc::c_int {
		rc(unsafe { libc::bind(fd, addr, len) })
	}

	pub(super) fn net_getsockname(
		fd: libc::c_int,
		addr: *mut libc::sockaddr,
		len: *mut libc::socklen_t,
	) -> libc::c_int {
		rc(unsafe { libc::getsockname(fd, addr, len) })
	}

	pub(super) fn net_listen(fd: libc::c_int, backlog: libc::c_int) -> libc::c_int {
		rc(unsafe { libc::listen(fd, backlog) })
	}

	pub(super) fn net_accept(
		fd: libc::c_int,
		addr: *mut libc::sockaddr,
		len: *mut libc::socklen_t,
	) -> libc::c_int {
		rc(unsafe { libc::accept(fd, addr, len) })
	}

	pub(super) fn net_connect(
		fd: libc::c_int,
		addr: *const libc::sockaddr,
		len: libc::socklen_t,
	) -> libc::c_int {
		rc(unsafe { libc::connect(fd, addr, len) })
	}

	pub(super) fn net_shutdown(fd: libc::c_int, how: libc::c_int) -> libc::c_int {
		rc(unsafe { libc::shutdown(fd, how) })
	}

	pub(super) fn net_recv(fd: libc::c_int, buf: &mut [u8], flags: libc::c_int) -> libc::c_int {
		rc_len(unsafe { libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), flags) })
	}

	pub(super) fn net_send(fd: libc::c_int, buf: &[u8], flags: libc::c_int) -> libc::c_int {
		rc_len(unsafe {
			libc::send(
				fd,
				buf.as_ptr() as *const libc::c_void,
				buf.len(),
				flags | libc::MSG_NOSIGNAL,
			)
		})
	}

	pub(super) fn net_ioctl(
		fd: libc::c_int,
		request: libc::Ioctl,
		arg: &mut libc::c_int,
	) -> libc::c_int {
		rc(unsafe { libc::ioctl(fd, request, arg as *mut libc::c_int) })
	}

	pub(super) fn net_setsockopt(
		fd: libc::c_int,
		level: libc::c_int,
		name: libc::c_int,
		value: libc::c_int,
	) -> libc::c_int {
		rc(unsafe {
			libc::setsockopt(
				fd,
				level,
				name,
				&value as *const _ as *const libc::c_void,
				std::mem::size_of::<libc::c_int>() as libc::socklen_t,
			)
		})
	}

	pub(super) fn net_select(
		nfds: libc::c_int,
		read: &mut libc::fd_set,
		write: &mut libc::fd_set,
		except: &mut libc::fd_set,
		timeout: Option<&mut libc::timeval>,
	) -> libc::c_int {
		// net_select always takes a timeval; an unbounded wait becomes the longest one.
		let mut forever = timeval_from_ms(libc::c_int::MAX);
		let tv = match timeout {
			Some(tv) => tv as *mut libc::timeval,
			None => &mut forever as *mut libc::timeval,
		};
		rc(unsafe { libc::select(nfds, read, write, except, tv) })
	}
}
