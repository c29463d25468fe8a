mod common;

use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use sockplex::{Backend, Console, Embedded, Events, PollInfo, Posix, Socket};

use common::{pair, wait_for};

#[test]
fn empty_set_returns_zero() {
	let mut info: [PollInfo<'_, Posix>; 0] = [];
	assert_eq!(Socket::poll(&mut info, Duration::from_secs(5)).unwrap(), 0);
}

#[test]
fn connected_socket_is_writable() {
	let (client, _server, _listener) = pair::<Posix>();

	let mut info = [PollInfo::new(&client, Events::WRITABLE)];
	let ready = Socket::poll(&mut info, Duration::from_secs(1)).unwrap();

	assert!(ready >= 1);
	assert!(info[0].revents.contains(Events::WRITABLE));
}

#[test]
fn listener_becomes_readable_on_pending_connection() {
	let (_client, _server, listener) = pair::<Posix>();
	let mut other = Socket::<Posix>::create().unwrap();
	other.connect(listener.local_addr().unwrap()).unwrap();

	assert!(wait_for(&listener, Events::READABLE).contains(Events::READABLE));
	listener.accept().unwrap();
}

#[test]
fn timeout_elapses_with_nothing_ready() {
	let (_client, server, _listener) = pair::<Posix>();

	let mut info = [PollInfo::new(&server, Events::READABLE)];
	let started = Instant::now();
	let ready = Socket::poll(&mut info, Duration::from_millis(50)).unwrap();

	assert_eq!(ready, 0);
	assert!(info[0].revents.is_empty());
	assert!(started.elapsed() >= Duration::from_millis(40));
}

/// Two connections, data pending on the first only. Returns the ready count
/// and both result sets from a zero-timeout poll.
fn one_of_two_readable<B: Backend>() -> (usize, Events, Events) {
	let (client_a, server_a, _listener_a) = pair::<B>();
	let (_client_b, server_b, _listener_b) = pair::<B>();

	assert_eq!(client_a.write(b"x").unwrap(), 1);
	wait_for(&server_a, Events::READABLE);

	let mut info = [
		PollInfo::new(&server_a, Events::READABLE),
		PollInfo::new(&server_b, Events::READABLE),
	];
	let ready = Socket::poll(&mut info, Duration::ZERO).unwrap();
	(ready, info[0].revents, info[1].revents)
}

#[test]
fn native_poll_reports_only_ready_entry() {
	let (ready, a, b) = one_of_two_readable::<Posix>();

	assert_eq!(ready, 1);
	assert_eq!(a, Events::READABLE);
	assert!(b.is_empty());
}

#[test]
fn emulated_poll_matches_native() {
	let native = one_of_two_readable::<Posix>();

	assert_eq!(one_of_two_readable::<Embedded>(), native);
	assert_eq!(one_of_two_readable::<Console>(), native);
}

#[test]
fn emulated_poll_reports_writable() {
	let (client, _server, _listener) = pair::<Embedded>();

	let mut info = [PollInfo::new(&client, Events::READABLE | Events::WRITABLE)];
	let ready = Socket::poll(&mut info, Duration::from_secs(1)).unwrap();

	assert_eq!(ready, 1);
	assert_eq!(info[0].revents, Events::WRITABLE);
}

#[test]
fn emulated_poll_flags_closed_peer_readable() {
	let (client, server, _listener) = pair::<Console>();
	drop(client);

	assert!(wait_for(&server, Events::READABLE).contains(Events::READABLE));
	let mut buf = [0u8; 8];
	assert_eq!(server.read(&mut buf, false).unwrap(), 0);
}

/// Sends one urgent byte, waits until it is flagged, then polls the
/// receiving end for `events` without blocking.
fn after_urgent_byte<B: Backend>(events: Events) -> (usize, Events) {
	let (client, server, _listener) = pair::<B>();

	// SAFETY: client's descriptor is open for the duration of the call.
	let rc = unsafe { libc::send(client.as_raw_fd(), b"!".as_ptr().cast(), 1, libc::MSG_OOB) };
	assert_eq!(rc, 1);
	wait_for(&server, Events::PRIORITY);

	let mut info = [PollInfo::new(&server, events)];
	let ready = Socket::poll(&mut info, Duration::ZERO).unwrap();
	(ready, info[0].revents)
}

#[test]
fn urgent_byte_is_not_an_error() {
	let native = after_urgent_byte::<Posix>(Events::READABLE);
	assert_eq!(native, (0, Events::empty()));

	assert_eq!(after_urgent_byte::<Embedded>(Events::READABLE), native);
	assert_eq!(after_urgent_byte::<Console>(Events::READABLE), native);
}

#[test]
fn urgent_byte_reported_as_priority() {
	let native = after_urgent_byte::<Posix>(Events::PRIORITY);
	assert_eq!(native, (1, Events::PRIORITY));

	assert_eq!(after_urgent_byte::<Embedded>(Events::PRIORITY), native);
	assert_eq!(after_urgent_byte::<Console>(Events::PRIORITY), native);
}
