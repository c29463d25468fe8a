use std::fmt;

/// A platform error code, normalized across last-error and negative-return conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Errno(pub i32);

impl Errno {
	/// Reads the calling thread's last-error indicator.
	#[inline]
	pub fn last() -> Self {
		Errno(errno())
	}

	/// Converts a negative return code (`-errno`) into an `Errno`.
	#[inline]
	pub(crate) fn from_negative(rc: libc::c_int) -> Self {
		Errno(-rc)
	}

	pub fn code(self) -> i32 {
		self.0
	}

	/// True for EAGAIN / EWOULDBLOCK.
	pub fn is_would_block(self) -> bool {
		self.0 == libc::EAGAIN || self.0 == libc::EWOULDBLOCK
	}

	pub fn is_in_progress(self) -> bool {
		self.0 == libc::EINPROGRESS
	}

	pub fn kind(self) -> std::io::ErrorKind {
		errno_to_kind(self.0)
	}
}

impl fmt::Display for Errno {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&errno_to_str(self.0))
	}
}

/// Socket lifecycle and configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
	#[error("socket() failed: {errno}")]
	Create { errno: Errno },

	#[error("bind({addr}) failed: {errno}")]
	Bind { errno: Errno, addr: String },

	#[error("listen(backlog={backlog}) failed: {errno}")]
	Listen { errno: Errno, backlog: i32 },

	#[error("connect({addr}) failed: {errno}")]
	Connect { errno: Errno, addr: String },

	#[error("accept() failed: {errno}")]
	Accept { errno: Errno },

	#[error("shutdown() failed: {errno}")]
	Shutdown { errno: Errno },

	#[error("close() failed: {errno}")]
	Close { errno: Errno },

	#[error("setsockopt({option}) failed: {errno}")]
	SetOption { errno: Errno, option: String },

	#[error("getsockopt({option}) failed: {errno}")]
	GetOption { errno: Errno, option: &'static str },

	#[error("poll() failed: {errno}")]
	Poll { errno: Errno },

	#[error("{op} is not supported by the {backend} backend")]
	Unsupported { op: &'static str, backend: &'static str },

	#[error("invalid address: {reason}")]
	InvalidAddress { reason: &'static str },
}

/// Data transfer errors.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
	#[error("recv() failed: {errno}")]
	Read { errno: Errno },

	#[error("send() failed: {errno}")]
	Write { errno: Errno },

	#[error("operation would block")]
	WouldBlock,

	#[error("{op} is not supported by the {backend} backend")]
	Unsupported { op: &'static str, backend: &'static str },
}

/// Returns current errno value.
#[inline]
pub fn errno() -> i32 {
	std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Converts errno to human-readable string.
fn errno_to_str(errno: i32) -> String {
	match errno {
		libc::EACCES => "permission denied".into(),
		libc::EADDRINUSE => "address already in use".into(),
		libc::EADDRNOTAVAIL => "address not available".into(),
		libc::EAFNOSUPPORT => "address family not supported".into(),
		libc::EAGAIN => "resource temporarily unavailable".into(),
		libc::EALREADY => "operation already in progress".into(),
		libc::EBADF => "bad file descriptor".into(),
		libc::ECONNREFUSED => "connection refused".into(),
		libc::ECONNRESET => "connection reset by peer".into(),
		libc::EINPROGRESS => "operation in progress".into(),
		libc::EINTR => "interrupted by signal".into(),
		libc::EINVAL => "invalid argument".into(),
		libc::EISCONN => "already connected".into(),
		libc::EMFILE => "too many open files".into(),
		libc::ENETUNREACH => "network unreachable".into(),
		libc::ENOBUFS => "no buffer space available".into(),
		libc::ENOSYS => "function not implemented".into(),
		libc::ENOTCONN => "not connected".into(),
		libc::ENOTSOCK => "not a socket".into(),
		libc::EOPNOTSUPP => "operation not supported".into(),
		libc::EPIPE => "broken pipe".into(),
		libc::ETIMEDOUT => "connection timed out".into(),
		_ => format!("errno {}", errno),
	}
}

/// Maps errno to std::io::ErrorKind.
fn errno_to_kind(errno: i32) -> std::io::ErrorKind {
	use std::io::ErrorKind;
	if errno == libc::EAGAIN || errno == libc::EWOULDBLOCK {
		return ErrorKind::WouldBlock;
	}
	match errno {
		libc::EACCES | libc::EPERM => ErrorKind::PermissionDenied,
		libc::EADDRINUSE => ErrorKind::AddrInUse,
		libc::EADDRNOTAVAIL => ErrorKind::AddrNotAvailable,
		libc::ECONNREFUSED => ErrorKind::ConnectionRefused,
		libc::ECONNRESET => ErrorKind::ConnectionReset,
		libc::EINTR => ErrorKind::Interrupted,
		libc::EINVAL | libc::EAFNOSUPPORT => ErrorKind::InvalidInput,
		libc::ENOSYS | libc::EOPNOTSUPP => ErrorKind::Unsupported,
		libc::ENOTCONN => ErrorKind::NotConnected,
		libc::EPIPE => ErrorKind::BrokenPipe,
		libc::ETIMEDOUT => ErrorKind::TimedOut,
		_ => ErrorKind::Other,
	}
}

impl From<SocketError> for std::io::Error {
	fn from(err: SocketError) -> Self {
		let kind = match &err {
			SocketError::Create { errno }
			| SocketError::Bind { errno, .. }
			| SocketError::Listen { errno, .. }
			| SocketError::Connect { errno, .. }
			| SocketError::Accept { errno }
			| SocketError::Shutdown { errno }
			| SocketError::Close { errno }
			| SocketError::SetOption { errno, .. }
			| SocketError::GetOption { errno, .. }
			| SocketError::Poll { errno } => errno.kind(),
			SocketError::Unsupported { .. } => std::io::ErrorKind::Unsupported,
			SocketError::InvalidAddress { .. } => std::io::ErrorKind::InvalidInput,
		};
		std::io::Error::new(kind, err)
	}
}

impl From<IoError> for std::io::Error {
	fn from(err: IoError) -> Self {
		let kind = match &err {
			IoError::Read { errno } | IoError::Write { errno } => errno.kind(),
			IoError::WouldBlock => std::io::ErrorKind::WouldBlock,
			IoError::Unsupported { .. } => std::io::ErrorKind::Unsupported,
		};
		std::io::Error::new(kind, err)
	}
}
