//! Randomized operation sequences checked against a `VecDeque` model.

use ph_fifo::{ByteRing, PrefixWidth};
use std::collections::VecDeque;

#[test]
fn random_ops_match_model() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    let mut storage = [0u8; 64];
    let mut ring = ByteRing::new(&mut storage).unwrap();
    let mut model: VecDeque<u8> = VecDeque::new();
    let mut enqueued = 0usize;
    let mut dequeued = 0usize;

    for _ in 0..50_000 {
        let len = rng.usize(0..80);
        match rng.u8(0..4) {
            0 => {
                let src: Vec<u8> = (0..len).map(|_| rng.u8(..)).collect();
                let n = ring.enqueue(&src);
                assert_eq!(n, len.min(64 - model.len()));
                model.extend(&src[..n]);
                enqueued += n;
            }
            1 => {
                let mut dst = vec![0u8; len];
                let n = ring.dequeue(&mut dst);
                assert_eq!(n, len.min(model.len()));
                let expected: Vec<u8> = model.drain(..n).collect();
                assert_eq!(&dst[..n], &expected[..]);
                dequeued += n;
            }
            2 => {
                let offset = rng.usize(0..70);
                let mut dst = vec![0u8; len];
                let n = ring.peek(&mut dst, offset);
                let expected: Vec<u8> = model.iter().skip(offset).take(len).copied().collect();
                assert_eq!(&dst[..n], &expected[..]);
            }
            _ => {
                let n = ring.skip(len);
                assert_eq!(n, len.min(model.len()));
                model.drain(..n);
                dequeued += n;
            }
        }
        assert_eq!(ring.len(), model.len());
        assert_eq!(ring.len(), enqueued - dequeued);
        assert!(ring.len() <= ring.capacity());
        assert_eq!(ring.is_empty(), model.is_empty());
        assert_eq!(ring.is_full(), model.len() == 64);
    }
}

#[test]
fn random_records_match_model() {
    let mut rng = fastrand::Rng::with_seed(42);
    let mut storage = [0u8; 512];
    let mut ring = ByteRing::new(&mut storage).unwrap();
    let mut model: VecDeque<Vec<u8>> = VecDeque::new();

    for _ in 0..20_000 {
        if rng.bool() {
            let len = rng.usize(0..200);
            let payload: Vec<u8> = (0..len).map(|_| rng.u8(..)).collect();
            let before = ring.len();
            let fits = before + len + PrefixWidth::U16.bytes() <= ring.capacity();
            match ring.enqueue_record(&payload, PrefixWidth::U16) {
                Ok(()) => {
                    assert!(fits);
                    model.push_back(payload);
                }
                Err(_) => {
                    assert!(!fits);
                    assert_eq!(ring.len(), before);
                }
            }
        } else {
            let mut out = [0u8; 256];
            match ring.read_record(&mut out, PrefixWidth::U16) {
                Ok(len) => {
                    let expected = model.pop_front().unwrap();
                    assert_eq!(&out[..len], &expected[..]);
                }
                Err(_) => assert!(model.is_empty()),
            }
        }
    }
}
