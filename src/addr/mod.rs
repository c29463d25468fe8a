//! Socket address value.
//!
//! `SockAddr` wraps a `sockaddr_storage` and a length. It is copied freely and
//! hands its raw pointer straight to the backend primitives; the system call
//! that consumes it is the one that rejects malformed input.
//! - `ipv4`: `sockaddr_in` conversions
//! - `ipv6`: `sockaddr_in6` conversions

mod ipv4;
mod ipv6;

use std::fmt;
use std::net::{IpAddr, SocketAddr, SocketAddrV6};

/// Address family of a `SockAddr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
	Inet,
	Inet6,
}

impl Family {
	/// Returns the libc constant for this address family.
	#[inline]
	pub fn raw(self) -> libc::c_int {
		match self {
			Family::Inet => libc::AF_INET,
			Family::Inet6 => libc::AF_INET6,
		}
	}

	/// True when IPv6 support was compiled in.
	#[inline]
	pub(crate) fn compiled_in(self) -> bool {
		match self {
			Family::Inet => true,
			Family::Inet6 => cfg!(feature = "ipv6"),
		}
	}
}

/// A socket address: family tag, raw address bytes and port.
///
/// The port is kept in network order inside the storage; `port()` returns host order.
/// Equality compares the populated bytes, never a resolved hostname.
#[derive(Clone, Copy)]
pub struct SockAddr {
	storage: libc::sockaddr_storage,
	len: libc::socklen_t,
}

impl SockAddr {
	/// Creates an IPv4 address.
	pub fn new_v4(ip: [u8; 4], port: u16) -> Self {
		let raw = ipv4::to_raw(ip, port);
		// SAFETY: sockaddr_in fits in sockaddr_storage.
		unsafe { Self::copy_from(&raw as *const _ as *const libc::sockaddr, ipv4::LEN) }
	}

	/// Creates an IPv6 address with scope ID 0.
	pub fn new_v6(ip: [u8; 16], port: u16) -> Self {
		Self::new_v6_scoped(ip, port, 0)
	}

	/// Creates an IPv6 address with an explicit scope ID (link-local addresses).
	pub fn new_v6_scoped(ip: [u8; 16], port: u16, scope_id: u32) -> Self {
		let raw = ipv6::to_raw(ip, port, scope_id);
		// SAFETY: sockaddr_in6 fits in sockaddr_storage.
		unsafe { Self::copy_from(&raw as *const _ as *const libc::sockaddr, ipv6::LEN) }
	}

	/// Creates from a raw family-tagged sockaddr.
	///
	/// Returns `None` for families other than AF_INET/AF_INET6 or a short length.
	///
	/// # Safety
	/// `addr` must point to at least `len` readable bytes.
	pub unsafe fn from_raw(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self> {
		if (len as usize) < std::mem::size_of::<libc::sa_family_t>() {
			return None;
		}
		let family = unsafe { (*addr).sa_family } as libc::c_int;
		let needed = match family {
			libc::AF_INET => ipv4::LEN,
			libc::AF_INET6 => ipv6::LEN,
			_ => return None,
		};
		if len < needed {
			return None;
		}
		Some(unsafe { Self::copy_from(addr, needed) })
	}

	/// Wraps storage filled in by a system call (getsockname, accept).
	pub(crate) fn from_storage(
		storage: &libc::sockaddr_storage,
		len: libc::socklen_t,
	) -> Option<Self> {
		// SAFETY: the storage is sizeof(sockaddr_storage) bytes.
		unsafe { Self::from_raw(storage as *const _ as *const libc::sockaddr, len) }
	}

	unsafe fn copy_from(addr: *const libc::sockaddr, len: libc::socklen_t) -> Self {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		unsafe {
			std::ptr::copy_nonoverlapping(
				addr as *const u8,
				&mut storage as *mut _ as *mut u8,
				len as usize,
			);
		}
		Self { storage, len }
	}

	pub fn family(&self) -> Family {
		match self.storage.ss_family as libc::c_int {
			libc::AF_INET6 => Family::Inet6,
			_ => Family::Inet,
		}
	}

	/// Returns the port in host order.
	pub fn port(&self) -> u16 {
		match self.family() {
			Family::Inet => ipv4::port(self.as_in()),
			Family::Inet6 => ipv6::port(self.as_in6()),
		}
	}

	pub fn ip(&self) -> IpAddr {
		match self.family() {
			Family::Inet => IpAddr::V4(ipv4::ip(self.as_in()).into()),
			Family::Inet6 => IpAddr::V6(ipv6::ip(self.as_in6()).into()),
		}
	}

	/// Textual presentation of the address, without port.
	pub fn name(&self) -> String {
		self.ip().to_string()
	}

	/// Converts to the std type, keeping the IPv6 scope ID.
	pub fn to_std(&self) -> SocketAddr {
		match self.family() {
			Family::Inet => SocketAddr::new(self.ip(), self.port()),
			Family::Inet6 => {
				let raw = self.as_in6();
				let ip = ipv6::ip(raw).into();
				SocketAddr::V6(SocketAddrV6::new(ip, ipv6::port(raw), 0, ipv6::scope_id(raw)))
			}
		}
	}

	#[inline]
	pub fn as_ptr(&self) -> *const libc::sockaddr {
		&self.storage as *const _ as *const libc::sockaddr
	}

	#[inline]
	pub fn len(&self) -> libc::socklen_t {
		self.len
	}

	fn as_in(&self) -> &libc::sockaddr_in {
		// SAFETY: family is AF_INET, storage is aligned for every sockaddr type.
		unsafe { &*(self.as_ptr() as *const libc::sockaddr_in) }
	}

	fn as_in6(&self) -> &libc::sockaddr_in6 {
		// SAFETY: family is AF_INET6.
		unsafe { &*(self.as_ptr() as *const libc::sockaddr_in6) }
	}

	fn bytes(&self) -> &[u8] {
		// SAFETY: len never exceeds sizeof(sockaddr_storage).
		unsafe { std::slice::from_raw_parts(self.as_ptr() as *const u8, self.len as usize) }
	}
}

impl PartialEq for SockAddr {
	fn eq(&self, other: &Self) -> bool {
		self.bytes() == other.bytes()
	}
}

impl Eq for SockAddr {}

impl From<SocketAddr> for SockAddr {
	fn from(addr: SocketAddr) -> Self {
		match addr {
			SocketAddr::V4(v4) => Self::new_v4(v4.ip().octets(), v4.port()),
			SocketAddr::V6(v6) => Self::new_v6_scoped(v6.ip().octets(), v6.port(), v6.scope_id()),
		}
	}
}

impl fmt::Display for SockAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}]:{}", self.name(), self.port())
	}
}

impl fmt::Debug for SockAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SockAddr")
			.field("family", &self.family())
			.field("addr", &self.to_std())
			.finish()
	}
}
