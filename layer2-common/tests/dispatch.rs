use std::sync::Arc;
use std::thread;
use std::time::Duration;

use layer2_common::{Error, LinkType, Pdu, Session, SessionConfig};
use layer2_core::capture::{MemorySource, RawFrame};
use layer2_core::codec::{encoded_len, read_records};
use layer2_core::decode_frame;
use proptest::prelude::*;

fn ethernet(seq: u64) -> RawFrame {
	let mut data = vec![0xab; 64];
	data[0..6].copy_from_slice(&[0xff; 6]);
	data[12..14].copy_from_slice(&[0x08, 0x06]);
	RawFrame::new(LinkType::ETHERNET, data, Duration::from_millis(seq))
}

fn record_len() -> usize { encoded_len(&decode_frame(&ethernet(0))).unwrap() }

fn drain(session: &Session, buffer: &mut [u8]) -> Vec<u64> {
	let mut seen = Vec::new();
	loop {
		let count = session.dispatch(buffer).unwrap();
		if count == 0 {
			return seen;
		}
		seen.extend(read_records(buffer, count).unwrap().into_iter().map(|r| r.timestamp_ms));
	}
}

#[test]
fn test_five_frames_three_per_call() {
	let source = MemorySource::new(LinkType::ETHERNET, (1..=5).map(ethernet));
	let session = Session::from_source(source, SessionConfig::default()).unwrap();
	let mut buffer = vec![0u8; 3 * record_len()];

	assert_eq!(session.dispatch(&mut buffer).unwrap(), 3);
	let first = read_records(&buffer, 3).unwrap();
	assert!(first.iter().all(|r| matches!(&r.pdu, Pdu::Ethernet2(e) if e.payload_type == 0x0806 && e.dst_addr.is_broadcast())));
	assert_eq!(session.dispatch(&mut buffer).unwrap(), 2);
	assert_eq!(session.dispatch(&mut buffer).unwrap(), 0);
}

#[test]
fn test_concurrent_dispatch_is_rejected() {
	let (source, _injector) = MemorySource::channel(LinkType::ETHERNET, Duration::from_secs(5));
	let session = Arc::new(Session::from_source(source, SessionConfig::default()).unwrap());

	let worker = {
		let session = Arc::clone(&session);
		thread::spawn(move || {
			let mut buffer = vec![0u8; 4096];
			session.dispatch(&mut buffer)
		})
	};
	while !session.is_dispatching() {
		thread::yield_now();
	}

	let mut buffer = vec![0u8; 4096];
	assert!(matches!(session.dispatch(&mut buffer), Err(Error::AlreadyDispatching)));

	session.close();
	assert_eq!(worker.join().unwrap().unwrap(), 0);
	assert!(matches!(session.dispatch(&mut buffer), Err(Error::InactiveSession)));
}

#[test]
fn test_dispatch_after_break_runs_normally() {
	let (source, injector) = MemorySource::channel(LinkType::ETHERNET, Duration::from_secs(5));
	let session = Arc::new(Session::from_source(source, SessionConfig::default()).unwrap());

	let worker = {
		let session = Arc::clone(&session);
		thread::spawn(move || {
			let mut buffer = vec![0u8; 4096];
			session.dispatch(&mut buffer)
		})
	};
	while !session.is_dispatching() {
		thread::yield_now();
	}
	session.break_loop();
	assert_eq!(worker.join().unwrap().unwrap(), 0);

	injector.inject_frame(ethernet(1));
	injector.inject_frame(ethernet(2));
	// room for exactly two records, so the call stops at the watermark
	let mut buffer = vec![0u8; 2 * record_len()];
	assert_eq!(session.dispatch(&mut buffer).unwrap(), 2);
	let records = read_records(&buffer, 2).unwrap();
	assert_eq!(records[0].timestamp_ms, 1);
	assert_eq!(records[1].timestamp_ms, 2);
}

#[test]
fn test_stored_capture_replays_in_order() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("capture.pcap");
	{
		let source = MemorySource::new(LinkType::ETHERNET, (1..=20).map(ethernet));
		let session = Session::from_source(source, SessionConfig::default().with_savefile(&path)).unwrap();
		let mut buffer = vec![0u8; 1 << 16];
		assert_eq!(drain(&session, &mut buffer).len(), 20);
	}

	let session = Session::from_file(&path, SessionConfig::default()).unwrap();
	let mut buffer = vec![0u8; 2 * record_len() + 7];
	assert_eq!(drain(&session, &mut buffer), (1..=20).collect::<Vec<_>>());
	assert_eq!(session.stats().unwrap().received, 20);
}

proptest! {
	#[test]
	fn test_order_survives_any_buffer_size(
		count in 1u64..40,
		slots in 1usize..6,
		slack in 0usize..64,
		load_factor in 0.05f32..=1.0,
	) {
		let len = record_len();
		let source = MemorySource::new(LinkType::ETHERNET, (0..count).map(ethernet));
		let config = SessionConfig::default().with_load_factor(load_factor);
		let session = Session::from_source(source, config).unwrap();
		let mut buffer = vec![0u8; slots * len + slack];
		prop_assert_eq!(drain(&session, &mut buffer), (0..count).collect::<Vec<_>>());
	}
}
