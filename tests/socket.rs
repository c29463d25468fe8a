mod common;

use std::io::ErrorKind;
use std::thread;

use sockplex::{
	ConnectStatus, ConnectorBuilder, Events, IoBuffer, ListenerBuilder, Posix, Shutdown, SockAddr,
	Socket,
};

use common::{LOOPBACK, TestBuffer, listener, pair, wait_for};

#[test]
fn fresh_socket_has_no_addresses() {
	let socket = Socket::<Posix>::create().unwrap();

	assert!(socket.local_addr().is_none());
	assert!(socket.peer_addr().is_none());
	assert!(!socket.is_listening());
	assert!(!socket.is_connected());
	assert_eq!(socket.backend(), "posix");
}

#[test]
fn bind_port_zero_reads_back_assigned_port() {
	let mut socket = Socket::<Posix>::create().unwrap();
	socket.bind(&SockAddr::new_v4(LOOPBACK, 0)).unwrap();

	let local = socket.local_addr().unwrap();
	assert_ne!(local.port(), 0);
	assert_eq!(local.name(), "127.0.0.1");
}

#[test]
fn bind_explicit_port_is_kept() {
	let port = {
		let mut probe = Socket::<Posix>::create().unwrap();
		probe.bind(&SockAddr::new_v4(LOOPBACK, 0)).unwrap();
		probe.local_addr().unwrap().port()
	};

	let addr = SockAddr::new_v4(LOOPBACK, port);
	let mut socket = Socket::<Posix>::create().unwrap();
	socket.set_reuse_address(true).unwrap();
	socket.bind(&addr).unwrap();

	assert_eq!(socket.local_addr(), Some(&addr));
}

#[test]
fn bind_conflict_fails() {
	let first = listener::<Posix>();
	let addr = *first.local_addr().unwrap();

	let mut second = Socket::<Posix>::create().unwrap();
	assert!(second.bind(&addr).is_err());
	assert!(second.local_addr().is_none());
}

#[test]
fn listen_marks_listener() {
	let listener = listener::<Posix>();
	assert!(listener.is_listening());
	assert!(!listener.is_connected());
}

#[test]
fn accepted_socket_carries_both_addresses() {
	let listener = listener::<Posix>();
	let server_addr = *listener.local_addr().unwrap();

	let mut client = Socket::<Posix>::create().unwrap();
	client.bind(&SockAddr::new_v4(LOOPBACK, 0)).unwrap();
	let client_addr = *client.local_addr().unwrap();

	assert_eq!(client.connect(&server_addr).unwrap(), ConnectStatus::Connected);
	assert!(client.is_connected());
	assert_eq!(client.peer_addr(), Some(&server_addr));

	let accepted = listener.accept().unwrap();
	assert!(accepted.is_connected());
	assert_eq!(accepted.local_addr(), Some(&server_addr));
	assert_eq!(accepted.peer_addr(), Some(&client_addr));
}

#[test]
fn connect_refused_is_an_error() {
	let port = {
		let mut probe = Socket::<Posix>::create().unwrap();
		probe.bind(&SockAddr::new_v4(LOOPBACK, 0)).unwrap();
		probe.local_addr().unwrap().port()
	};

	let mut client = Socket::<Posix>::create().unwrap();
	let err = client.connect(&SockAddr::new_v4(LOOPBACK, port)).unwrap_err();

	assert_eq!(err.kind(), ErrorKind::ConnectionRefused);
	assert!(!client.is_connected());
	assert!(client.peer_addr().is_none());
}

#[test]
fn nonblocking_accept_without_pending_would_block() {
	let listener = listener::<Posix>();
	listener.set_nonblocking(true).unwrap();

	let err = listener.accept().unwrap_err();
	assert_eq!(err.kind(), ErrorKind::WouldBlock);
}

#[test]
fn bytes_arrive_in_order_across_reads() {
	let (client, server, _listener) = pair::<Posix>();
	let payload: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();

	let expected = payload.clone();
	let writer = thread::spawn(move || {
		let mut sent = 0;
		while sent < payload.len() {
			sent += client.write(&payload[sent..]).unwrap();
		}
		client.shutdown(Shutdown::Write).unwrap();
	});

	let mut received = Vec::new();
	let mut chunk = [0u8; 4096];
	loop {
		let n = server.read(&mut chunk, false).unwrap();
		if n == 0 {
			break;
		}
		received.extend_from_slice(&chunk[..n]);
	}
	writer.join().unwrap();

	assert_eq!(received, expected);
}

#[test]
fn read_returns_zero_after_peer_closes() {
	let (client, server, _listener) = pair::<Posix>();
	drop(client);

	let mut buf = [0u8; 16];
	assert_eq!(server.read(&mut buf, false).unwrap(), 0);
}

#[test]
fn nonblocking_read_without_data_would_block() {
	let (_client, server, _listener) = pair::<Posix>();
	server.set_nonblocking(true).unwrap();

	let mut buf = [0u8; 16];
	let err = server.read(&mut buf, false).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::WouldBlock);
}

#[test]
fn nonblocking_write_eventually_would_block() {
	let (client, _server, _listener) = pair::<Posix>();
	client.set_send_buffer_size(4096).unwrap();
	client.set_nonblocking(true).unwrap();

	let chunk = [0x5a; 64 * 1024];
	let mut blocked = false;
	for _ in 0..4096 {
		match client.write(&chunk) {
			Ok(n) => assert!(n > 0),
			Err(err) => {
				assert_eq!(err.kind(), ErrorKind::WouldBlock);
				blocked = true;
				break;
			}
		}
	}
	assert!(blocked, "peer never stopped accepting data");
}

#[test]
fn std_io_traits_delegate() {
	use std::io::{Read, Write};

	let (client, server, _listener) = pair::<Posix>();
	(&client).write_all(b"USER anonymous\r\n").unwrap();
	client.shutdown(Shutdown::Write).unwrap();

	let mut line = String::new();
	(&server).read_to_string(&mut line).unwrap();
	assert_eq!(line, "USER anonymous\r\n");
}

#[test]
fn buffer_cursors_follow_transfers() {
	let (client, server, _listener) = pair::<Posix>();

	let mut outgoing = TestBuffer::with_data(b"220 ready\r\n");
	let sent = client.write_from(&mut outgoing).unwrap();
	assert_eq!(sent, 11);
	assert_eq!(outgoing.used_size(), 0);

	wait_for(&server, Events::READABLE);

	let mut incoming = TestBuffer::new(64);
	let mut total = 0;
	while total < sent {
		total += server.read_into(&mut incoming, false).unwrap();
	}
	assert_eq!(incoming.used_area(), b"220 ready\r\n");
	let shared: &TestBuffer = &incoming;
	assert_eq!(shared.free_size(), 64 - 11);
	assert_eq!(shared.used_size(), 11);
}

#[test]
fn out_of_band_byte_is_read_separately() {
	let (client, server, _listener) = pair::<Posix>();

	use std::os::fd::AsRawFd;
	// SAFETY: client's descriptor is open for the duration of the call.
	let rc = unsafe { libc::send(client.as_raw_fd(), b"!".as_ptr().cast(), 1, libc::MSG_OOB) };
	assert_eq!(rc, 1);

	assert!(wait_for(&server, Events::PRIORITY).contains(Events::PRIORITY));

	let mut byte = [0u8; 1];
	assert_eq!(server.read(&mut byte, true).unwrap(), 1);
	assert_eq!(&byte, b"!");
}

#[test]
fn at_mark_on_plain_stream_is_false() {
	let (_client, server, _listener) = pair::<Posix>();
	assert!(!server.at_mark().unwrap());
}

#[test]
fn linger_toggles_on_posix() {
	let socket = Socket::<Posix>::create().unwrap();
	socket.set_linger(Some(std::time::Duration::from_secs(5))).unwrap();
	socket.set_linger(None).unwrap();
}

#[test]
fn dropping_accepted_socket_releases_descriptor() {
	use std::os::fd::AsRawFd;

	let (_client, server, _listener) = pair::<Posix>();
	let fd = server.as_raw_fd();
	assert_ne!(unsafe { libc::fcntl(fd, libc::F_GETFD) }, -1);

	drop(server);
	let rc = unsafe { libc::fcntl(fd, libc::F_GETFD) };
	let errno = std::io::Error::last_os_error().raw_os_error();
	assert_eq!((rc, errno), (-1, Some(libc::EBADF)));

	let again = Socket::<Posix>::create().unwrap();
	assert!(again.local_addr().is_none());
}

#[test]
fn nonblocking_connect_completes() {
	let listener = listener::<Posix>();
	let addr = *listener.local_addr().unwrap();

	let (client, status) =
		ConnectorBuilder::<Posix>::new().nonblocking(true).connect(&addr).unwrap();
	assert!(client.is_connected());
	assert_eq!(client.peer_addr(), Some(&addr));

	if status == ConnectStatus::InProgress {
		assert!(wait_for(&client, Events::WRITABLE).contains(Events::WRITABLE));
	}
	assert!(client.take_error().unwrap().is_none());
}

#[test]
fn listener_builder_binds_and_listens() {
	let listener = ListenerBuilder::<Posix>::new()
		.backlog(4)
		.nonblocking(true)
		.bind(&SockAddr::new_v4(LOOPBACK, 0))
		.unwrap();

	assert!(listener.is_listening());
	assert_ne!(listener.local_addr().unwrap().port(), 0);
	assert_eq!(listener.accept().unwrap_err().kind(), ErrorKind::WouldBlock);
}
