#![cfg(unix)]

use std::path::{Path, PathBuf};

use fifoprims_element::{Attempt, Channel, Direction, Stall, TypedChannel};
use fifoprims_transport::{fifo_status, NamedFifo};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "fifoprims-element-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

/// Create the pipe file without keeping any end of it open.
fn make_fifo(path: &Path) {
    let mut creator = NamedFifo::with_mode(path, Direction::Read, 0o600);
    assert!(creator.create().expect("fifo should be creatable"));
    creator.close().expect("creator should close");
}

#[test]
fn producer_waits_for_consumer_then_delivers() {
    let dir = unique_temp_dir("producer-first");
    let path = dir.join("chan.fifo");
    make_fifo(&path);

    let mut producer = Channel::open(&path, Direction::Write, 4).unwrap();
    assert!(!producer.is_open());

    for _ in 0..5 {
        let attempt = producer.try_write_raw(&[0x01, 0x02, 0x03, 0x04]).unwrap();
        assert_eq!(attempt, Attempt::NoProgress(Stall::PeerAbsent));
        assert_eq!(producer.bytes_transferred(), 0);
    }

    let mut consumer = Channel::open(&path, Direction::Read, 4).unwrap();
    assert!(consumer.is_open());

    let sent = producer.try_write_raw(&[0x01, 0x02, 0x03, 0x04]).unwrap();
    assert!(sent.is_complete());

    let element = consumer.try_read_raw().unwrap().complete().unwrap();
    assert_eq!(element.as_ref(), &[0x01, 0x02, 0x03, 0x04]);

    producer.close().unwrap();
    consumer.destroy().unwrap();
    assert!(!path.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn consumer_before_producer_is_not_fatal() {
    let dir = unique_temp_dir("consumer-first");
    let path = dir.join("chan.fifo");
    make_fifo(&path);

    let mut consumer = Channel::open(&path, Direction::Read, 3).unwrap();
    for _ in 0..5 {
        let attempt = consumer.try_read_raw().unwrap();
        assert_eq!(attempt, Attempt::NoProgress(Stall::PeerAbsent));
    }

    let mut producer = Channel::open(&path, Direction::Write, 3).unwrap();
    assert!(producer.is_open());
    assert!(producer.try_write_raw(b"abc").unwrap().is_complete());

    let element = loop {
        if let Some(element) = consumer.try_read_raw().unwrap().complete() {
            break element;
        }
    };
    assert_eq!(element.as_ref(), b"abc");

    producer.close().unwrap();
    consumer.close().unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn creating_twice_yields_one_working_pipe() {
    let dir = unique_temp_dir("create-twice");
    let path = dir.join("nested").join("chan.fifo");

    let mut first = Channel::create(&path, 2).unwrap();
    let mut second = Channel::create(&path, 2).unwrap();
    assert!(first.is_open() && second.is_open());
    assert!(fifo_status(&path).unwrap().is_fifo);

    assert!(first.try_write_raw(b"hi").unwrap().is_complete());
    let element = second.try_read_raw().unwrap().complete().unwrap();
    assert_eq!(element.as_ref(), b"hi");

    first.close().unwrap();
    second.destroy().unwrap();
    assert!(!fifo_status(&path).unwrap().exists);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn departed_reader_is_reported_and_retryable() {
    let dir = unique_temp_dir("departed");
    let path = dir.join("chan.fifo");
    make_fifo(&path);

    let mut consumer = Channel::open(&path, Direction::Read, 1).unwrap();
    let mut producer = Channel::open(&path, Direction::Write, 1).unwrap();
    assert!(producer.is_open());
    consumer.close().unwrap();

    let attempt = producer.try_write_raw(b"x").unwrap();
    assert_eq!(attempt, Attempt::NoProgress(Stall::PeerDeparted));
    assert_eq!(producer.bytes_transferred(), 0);

    producer.close().unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn element_larger_than_pipe_buffer_crosses_in_pieces() {
    let dir = unique_temp_dir("large");
    let path = dir.join("chan.fifo");
    let element_size = 256 * 1024;

    let mut consumer = Channel::create(&path, element_size).unwrap();
    let mut producer = Channel::open(&path, Direction::Write, element_size).unwrap();

    let payload: Vec<u8> = (0..element_size).map(|i| (i % 251) as u8).collect();
    let mut partial_writes = 0usize;
    let mut sent = false;
    let mut received = None;

    while received.is_none() {
        if !sent {
            match producer.try_write_raw(&payload).unwrap() {
                Attempt::Complete(()) => sent = true,
                Attempt::Partial { transferred, .. } => {
                    assert!(transferred < element_size);
                    partial_writes += 1;
                }
                Attempt::NoProgress(stall) => assert_eq!(stall, Stall::WouldBlock),
            }
        }
        received = consumer.try_read_raw().unwrap().complete();
    }

    assert!(sent);
    assert!(partial_writes > 0, "element should not fit the pipe in one write");
    assert_eq!(received.unwrap().as_ref(), payload.as_slice());

    producer.close().unwrap();
    consumer.destroy().unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn typed_producer_and_consumer_exchange_values() {
    let dir = unique_temp_dir("typed");
    let path = dir.join("chan.fifo");
    make_fifo(&path);

    let mut consumer = TypedChannel::consumer(&path, 8, |src: &[u8]| {
        u64::from_le_bytes(src.try_into().expect("element is 8 bytes"))
    })
    .unwrap();
    let mut producer = TypedChannel::producer(&path, 8, |value: &u64, dst: &mut [u8]| {
        dst.copy_from_slice(&value.to_le_bytes())
    })
    .unwrap();

    for value in [1u64, u64::MAX, 42] {
        while producer.try_produce(&value).unwrap().is_pending() {}
        let received = loop {
            if let Some(v) = consumer.try_consume().unwrap().complete() {
                break v;
            }
        };
        assert_eq!(received, value);
    }

    producer.close().unwrap();
    consumer.destroy().unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn opening_a_missing_pipe_is_fatal() {
    let dir = unique_temp_dir("missing");
    let err = Channel::open(dir.join("absent.fifo"), Direction::Read, 4).unwrap_err();
    assert!(err.io_source().is_some());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn pipe_removed_before_lazy_open_reports_channel_state() {
    let dir = unique_temp_dir("removed");
    let path = dir.join("chan.fifo");
    make_fifo(&path);

    let mut producer = Channel::open(&path, Direction::Write, 4).unwrap();
    assert!(!producer.is_open());
    std::fs::remove_file(&path).unwrap();

    let err = producer.try_write_raw(b"gone").unwrap_err();
    let state = err.state().expect("lazy open failure carries state");
    assert_eq!(state.path, path);
    assert!(!state.open);
    assert!(err.to_string().contains("unopened"));
    let _ = std::fs::remove_dir_all(&dir);
}
