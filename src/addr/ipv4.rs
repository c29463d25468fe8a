/// Size of `sockaddr_in`, passed alongside the pointer to bind/connect.
pub(super) const LEN: libc::socklen_t = std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;

/// Builds the raw sockaddr_in for syscalls.
pub(super) fn to_raw(ip: [u8; 4], port: u16) -> libc::sockaddr_in {
	libc::sockaddr_in {
		sin_family: libc::AF_INET as libc::sa_family_t,
		sin_port: port.to_be(),
		sin_addr: libc::in_addr {
			s_addr: u32::from_be_bytes(ip).to_be(),
		},
		sin_zero: [0; 8],
	}
}

pub(super) fn ip(raw: &libc::sockaddr_in) -> [u8; 4] {
	raw.sin_addr.s_addr.to_ne_bytes()
}

pub(super) fn port(raw: &libc::sockaddr_in) -> u16 {
	u16::from_be(raw.sin_port)
}

/*
Layout of sockaddr_in:
- sin_family: AF_INET
- sin_port: port in network byte order (big-endian)
- sin_addr: IP address in network byte order
- sin_zero: padding up to sizeof(sockaddr)

s_addr already holds the bytes in network order, so to_ne_bytes() yields the
octets as they appear on the wire.
*/
