use ph_fifo::{ByteRing, PrefixWidth, RecordError};
use std::thread;

const TOTAL: usize = 1 << 20;

#[test]
fn bytes_arrive_in_order_across_threads() {
    let mut storage = [0u8; 256];
    let mut ring = ByteRing::new(&mut storage).unwrap();
    let (mut producer, mut consumer) = ring.split();

    thread::scope(|s| {
        s.spawn(move || {
            let mut next = 0usize;
            let mut chunk = [0u8; 61];
            while next < TOTAL {
                let n = chunk.len().min(TOTAL - next);
                for (i, b) in chunk[..n].iter_mut().enumerate() {
                    *b = (next + i) as u8;
                }
                let mut sent = 0;
                while sent < n {
                    match producer.enqueue(&chunk[sent..n]) {
                        0 => thread::yield_now(),
                        k => sent += k,
                    }
                }
                next += n;
            }
        });

        let mut expected = 0usize;
        let mut buf = [0u8; 97];
        while expected < TOTAL {
            let n = consumer.dequeue(&mut buf);
            for &b in &buf[..n] {
                assert_eq!(b, expected as u8);
                expected += 1;
            }
            if n == 0 {
                thread::yield_now();
            }
        }
        assert!(consumer.is_empty());
    });
}

#[test]
fn records_arrive_whole_across_threads() {
    const RECORDS: usize = 20_000;
    let mut storage = [0u8; 1024];
    let mut ring = ByteRing::new(&mut storage).unwrap();
    let (mut producer, mut consumer) = ring.split();

    thread::scope(|s| {
        s.spawn(move || {
            let mut payload = [0u8; 300];
            for i in 0..RECORDS {
                let len = (i * 37) % payload.len();
                payload[..len].fill(i as u8);
                loop {
                    match producer.enqueue_record(&payload[..len], PrefixWidth::U16) {
                        Ok(()) => break,
                        Err(RecordError::WouldNotFit { .. }) => thread::yield_now(),
                        Err(e) => panic!("unexpected {e}"),
                    }
                }
            }
        });

        let mut out = [0u8; 300];
        for i in 0..RECORDS {
            let len = loop {
                match consumer.read_record(&mut out, PrefixWidth::U16) {
                    Ok(len) => break len,
                    Err(RecordError::Underrun { .. }) => thread::yield_now(),
                    Err(e) => panic!("unexpected {e}"),
                }
            };
            assert_eq!(len, (i * 37) % out.len());
            assert!(out[..len].iter().all(|&b| b == i as u8));
        }
    });
}
