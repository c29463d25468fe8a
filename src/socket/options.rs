use std::time::Duration;

use log::{debug, error};

use super::Socket;
use crate::backend::{Backend, IntOption};
use crate::error::{Errno, SocketError};

/// Logs and returns the "not supported on this backend" failure.
fn unsupported<B: Backend>(op: &'static str) -> std::io::Error {
	let err = SocketError::Unsupported { op, backend: B::NAME };
	error!("{err}");
	err.into()
}

fn set_failed(errno: Errno, option: String) -> std::io::Error {
	let err = SocketError::SetOption { errno, option };
	error!("{err}");
	err.into()
}

impl<B: Backend> Socket<B> {
	/// Toggles non-blocking mode.
	///
	/// Goes through `fcntl` flags or `ioctl(FIONBIO)` depending on the backend.
	pub fn set_nonblocking(&self, nonblocking: bool) -> std::io::Result<()> {
		B::set_nonblocking(self.fd(), nonblocking).map_err(|errno| {
			set_failed(errno, format!("{}, {}", B::NONBLOCKING.option_name(), nonblocking as i32))
		})?;
		debug!("fd={} {}={}", self.fd(), B::NONBLOCKING.option_name(), nonblocking);
		Ok(())
	}

	/// Sets SO_REUSEADDR.
	///
	/// Allows binding to an address that's in TIME_WAIT state.
	pub fn set_reuse_address(&self, reuse: bool) -> std::io::Result<()> {
		self.set_int(IntOption::ReuseAddr, reuse as libc::c_int, if reuse { "yes" } else { "no" })
	}

	/// Sets the receive buffer size (SO_RCVBUF).
	pub fn set_recv_buffer_size(&self, size: usize) -> std::io::Result<()> {
		let value = libc::c_int::try_from(size).unwrap_or(libc::c_int::MAX);
		self.set_int(IntOption::RecvBuffer, value, &size.to_string())
	}

	/// Sets the send buffer size (SO_SNDBUF).
	pub fn set_send_buffer_size(&self, size: usize) -> std::io::Result<()> {
		let value = libc::c_int::try_from(size).unwrap_or(libc::c_int::MAX);
		self.set_int(IntOption::SendBuffer, value, &size.to_string())
	}

	/// Sets SO_LINGER. `None` turns lingering off; `Some(t)` makes close
	/// wait up to `t` (whole seconds) for queued data.
	///
	/// Fails with `Unsupported` on backends without SO_LINGER.
	pub fn set_linger(&self, linger: Option<Duration>) -> std::io::Result<()> {
		if !B::CAPS.linger {
			return Err(unsupported::<B>("SO_LINGER"));
		}

		B::set_linger(self.fd(), linger).map_err(|errno| {
			let detail = match linger {
				Some(time) => format!("SO_LINGER, on, {}s", time.as_secs()),
				None => "SO_LINGER, off, 0s".to_string(),
			};
			set_failed(errno, detail)
		})
	}

	/// Returns whether the read pointer is at the out-of-band mark.
	pub fn at_mark(&self) -> std::io::Result<bool> {
		if !B::CAPS.at_mark {
			return Err(unsupported::<B>("sockatmark"));
		}

		B::at_mark(self.fd()).map_err(|errno| {
			let err = SocketError::GetOption { errno, option: "sockatmark" };
			error!("{err}");
			err.into()
		})
	}

	/// Reads and clears the pending socket error (SO_ERROR).
	///
	/// After an in-progress connect turns writable, `Ok(None)` means it
	/// succeeded.
	pub fn take_error(&self) -> std::io::Result<Option<std::io::Error>> {
		if !B::CAPS.so_error {
			return Err(unsupported::<B>("SO_ERROR"));
		}

		match B::take_error(self.fd()) {
			Ok(pending) => Ok(pending.map(|errno| std::io::Error::from_raw_os_error(errno.code()))),
			Err(errno) => {
				let err = SocketError::GetOption { errno, option: "SO_ERROR" };
				error!("{err}");
				Err(err.into())
			}
		}
	}

	fn set_int(&self, option: IntOption, value: libc::c_int, shown: &str) -> std::io::Result<()> {
		B::set_int_option(self.fd(), option, value)
			.map_err(|errno| set_failed(errno, format!("{}, {}", option.name(), shown)))?;
		debug!("fd={} {}={}", self.fd(), option.name(), shown);
		Ok(())
	}
}
