/// Size of `sockaddr_in6`.
pub(super) const LEN: libc::socklen_t =
	std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t;

/// Builds the raw sockaddr_in6 for syscalls.
pub(super) fn to_raw(ip: [u8; 16], port: u16, scope_id: u32) -> libc::sockaddr_in6 {
	libc::sockaddr_in6 {
		sin6_family: libc::AF_INET6 as libc::sa_family_t,
		sin6_port: port.to_be(),
		sin6_flowinfo: 0,
		sin6_addr: libc::in6_addr {
			s6_addr: ip,
		},
		sin6_scope_id: scope_id,
	}
}

pub(super) fn ip(raw: &libc::sockaddr_in6) -> [u8; 16] {
	raw.sin6_addr.s6_addr
}

pub(super) fn port(raw: &libc::sockaddr_in6) -> u16 {
	u16::from_be(raw.sin6_port)
}

pub(super) fn scope_id(raw: &libc::sockaddr_in6) -> u32 {
	raw.sin6_scope_id
}
