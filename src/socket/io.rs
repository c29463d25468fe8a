use log::{error, trace};

use super::Socket;
use crate::backend::Backend;
use crate::buffer::IoBuffer;
use crate::error::{Errno, IoError};

/// Would-block passes through quietly; anything else is logged.
fn transfer_failed(errno: Errno, err: IoError, fd: libc::c_int) -> std::io::Error {
	if errno.is_would_block() {
		trace!("fd={fd} would block");
		return IoError::WouldBlock.into();
	}
	error!("{err}");
	err.into()
}

impl<B: Backend> Socket<B> {
	/// Receives up to `buf.len()` bytes.
	///
	/// `Ok(0)` means the peer closed its side. A `WouldBlock` error is the
	/// "no data yet" outcome of a non-blocking socket, not a failure.
	/// Out-of-band reads fail with `Unsupported` on backends without them.
	///
	/// # Panics
	/// If `buf` is empty.
	pub fn read(&self, buf: &mut [u8], oob: bool) -> std::io::Result<usize> {
		assert!(!buf.is_empty(), "read into an empty buffer");

		if oob && !B::CAPS.out_of_band {
			let err = IoError::Unsupported { op: "MSG_OOB", backend: B::NAME };
			error!("{err}");
			return Err(err.into());
		}

		B::recv(self.fd(), buf, oob)
			.map_err(|errno| transfer_failed(errno, IoError::Read { errno }, self.fd()))
	}

	/// Reads into the container's free region and marks the received bytes used.
	///
	/// # Panics
	/// If the container has no free space.
	pub fn read_into<T>(&self, buffer: &mut T, oob: bool) -> std::io::Result<usize>
	where
		T: IoBuffer + ?Sized,
	{
		assert!(buffer.free_size() > 0, "read into a full buffer");

		let n = self.read(buffer.free_area(), oob)?;
		if n > 0 {
			buffer.mark_used(n);
		}
		Ok(n)
	}

	/// Sends up to `buf.len()` bytes; a short write is success.
	///
	/// # Panics
	/// If `buf` is empty.
	pub fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
		assert!(!buf.is_empty(), "write from an empty buffer");

		B::send(self.fd(), buf)
			.map_err(|errno| transfer_failed(errno, IoError::Write { errno }, self.fd()))
	}

	/// Writes from the container's used region and frees the sent bytes.
	///
	/// # Panics
	/// If the container holds no data.
	pub fn write_from<T: IoBuffer + ?Sized>(&self, buffer: &mut T) -> std::io::Result<usize> {
		assert!(buffer.used_size() > 0, "write from an empty buffer");

		let n = self.write(buffer.used_area())?;
		if n > 0 {
			buffer.mark_free(n);
		}
		Ok(n)
	}
}

impl<B: Backend> std::io::Read for &Socket<B> {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		if buf.is_empty() {
			return Ok(0);
		}
		Socket::read(*self, buf, false)
	}
}

impl<B: Backend> std::io::Write for &Socket<B> {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		if buf.is_empty() {
			return Ok(0);
		}
		Socket::write(*self, buf)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(()) // nothing buffered at this level
	}
}
