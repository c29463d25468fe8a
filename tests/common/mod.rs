#![allow(dead_code)]

use std::time::Duration;

use sockplex::{Backend, Events, IoBuffer, PollInfo, SockAddr, Socket};

pub const LOOPBACK: [u8; 4] = [127, 0, 0, 1];

/// Linear buffer: used region is `[start, end)`, free region is `[end, len)`.
pub struct TestBuffer {
	buf: Vec<u8>,
	start: usize,
	end: usize,
}

impl TestBuffer {
	pub fn new(capacity: usize) -> Self {
		Self {
			buf: vec![0; capacity],
			start: 0,
			end: 0,
		}
	}

	pub fn with_data(data: &[u8]) -> Self {
		let mut buffer = Self::new(data.len());
		buffer.buf.copy_from_slice(data);
		buffer.end = data.len();
		buffer
	}
}

impl IoBuffer for TestBuffer {
	fn free_area(&mut self) -> &mut [u8] {
		&mut self.buf[self.end..]
	}

	fn used_area(&self) -> &[u8] {
		&self.buf[self.start..self.end]
	}

	fn free_size(&self) -> usize {
		self.buf.len() - self.end
	}

	fn mark_used(&mut self, n: usize) {
		assert!(self.end + n <= self.buf.len());
		self.end += n;
	}

	fn mark_free(&mut self, n: usize) {
		assert!(self.start + n <= self.end);
		self.start += n;
		if self.start == self.end {
			self.start = 0;
			self.end = 0;
		}
	}
}

/// Listener on 127.0.0.1 with an ephemeral port.
pub fn listener<B: Backend>() -> Socket<B> {
	let mut listener = Socket::<B>::create().unwrap();
	listener.set_reuse_address(true).unwrap();
	listener.bind(&SockAddr::new_v4(LOOPBACK, 0)).unwrap();
	listener.listen(8).unwrap();
	listener
}

/// Connected loopback pair: (client, accepted server side, listener).
pub fn pair<B: Backend>() -> (Socket<B>, Socket<B>, Socket<B>) {
	let listener = listener::<B>();
	let addr = *listener.local_addr().unwrap();

	let mut client = Socket::<B>::create().unwrap();
	client.connect(&addr).unwrap();
	let server = listener.accept().unwrap();

	(client, server, listener)
}

/// Blocks until `socket` reports `events`, or panics after a second.
pub fn wait_for<B: Backend>(socket: &Socket<B>, events: Events) -> Events {
	let mut info = [PollInfo::new(socket, events)];
	let ready = Socket::poll(&mut info, Duration::from_secs(1)).unwrap();
	assert_eq!(ready, 1, "socket never became ready for {events:?}");
	info[0].revents
}
