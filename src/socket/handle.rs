use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::os::fd::{AsRawFd, RawFd};

use log::error;

use crate::backend::Backend;
use crate::error::SocketError;

/// Sole owner of one backend descriptor.
///
/// Move-only: there is no `Clone`, so a live descriptor has exactly one
/// owner and is closed through `B::close` exactly once, on drop.
pub struct OwnedHandle<B: Backend> {
	fd: RawFd,
	_backend: PhantomData<B>,
}

impl<B: Backend> OwnedHandle<B> {
	/// Takes ownership of `fd`.
	///
	/// # Safety
	/// `fd` must be an open descriptor of backend `B` that nothing else will close.
	pub unsafe fn from_raw(fd: RawFd) -> Self {
		Self {
			fd,
			_backend: PhantomData,
		}
	}

	/// Releases ownership without closing.
	pub fn into_raw(self) -> RawFd {
		let this = ManuallyDrop::new(self);
		this.fd
	}
}

impl<B: Backend> AsRawFd for OwnedHandle<B> {
	#[inline]
	fn as_raw_fd(&self) -> RawFd {
		self.fd
	}
}

impl<B: Backend> Drop for OwnedHandle<B> {
	fn drop(&mut self) {
		if let Err(errno) = B::close(self.fd) {
			error!("{}", SocketError::Close { errno });
		}
	}
}

impl<B: Backend> std::fmt::Debug for OwnedHandle<B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OwnedHandle")
			.field("fd", &self.fd)
			.field("backend", &B::NAME)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::Posix;

	fn stream_fd() -> RawFd {
		let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_STREAM | libc::SOCK_CLOEXEC, 0) };
		assert!(fd >= 0);
		fd
	}

	fn is_open(fd: RawFd) -> bool {
		unsafe { libc::fcntl(fd, libc::F_GETFD) != -1 }
	}

	#[test]
	fn into_raw_keeps_descriptor_open() {
		let fd = stream_fd();
		let handle = unsafe { OwnedHandle::<Posix>::from_raw(fd) };

		assert_eq!(handle.into_raw(), fd);
		assert!(is_open(fd));
		assert_eq!(unsafe { libc::close(fd) }, 0);
	}

	#[test]
	fn drop_closes_descriptor() {
		let fd = stream_fd();
		let handle = unsafe { OwnedHandle::<Posix>::from_raw(fd) };
		assert_eq!(handle.as_raw_fd(), fd);

		drop(handle);
		assert!(!is_open(fd));
	}
}
