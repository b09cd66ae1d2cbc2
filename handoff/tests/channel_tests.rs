// handoff/tests/channel_tests.rs
//
// Tests de integracion del canal bloqueante.
//
// Ejecutar con: cargo test -p handoff -- --nocapture

use handoff::{BlockingChannel, PopOrder, RecvError, RecvTimeoutError};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_lifo_pop_returns_reverse_of_send_order() {
    println!("\n=== TEST: orden LIFO sin contencion ===");
    let ch = BlockingChannel::with_order(PopOrder::Lifo);
    for i in 1..=5 {
        ch.send(i).unwrap();
    }
    let got: Vec<i32> = (0..5).map(|_| ch.receive().unwrap()).collect();
    println!("  recibido: {:?}", got);
    assert_eq!(got, vec![5, 4, 3, 2, 1]);
}

#[test]
fn test_fifo_pop_preserves_send_order() {
    println!("\n=== TEST: orden FIFO sin contencion ===");
    let ch = BlockingChannel::new();
    for i in 1..=5 {
        ch.send(i).unwrap();
    }
    let got: Vec<i32> = (0..5).map(|_| ch.receive().unwrap()).collect();
    assert_eq!(got, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_receive_blocks_until_send() {
    println!("\n=== TEST: receive bloquea hasta un send ===");
    let ch = Arc::new(BlockingChannel::<u32>::new());
    let barrier = Arc::new(Barrier::new(2));
    let done = Arc::new(AtomicBool::new(false));

    let receiver = {
        let ch = Arc::clone(&ch);
        let barrier = Arc::clone(&barrier);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            barrier.wait();
            let value = ch.receive();
            done.store(true, Ordering::SeqCst);
            value
        })
    };

    barrier.wait();
    thread::sleep(Duration::from_millis(50));
    assert!(
        !done.load(Ordering::SeqCst),
        "el receptor no debe volver con el canal vacio"
    );

    ch.send(42).unwrap();
    assert_eq!(receiver.join().unwrap(), Ok(42));
    assert!(done.load(Ordering::SeqCst));
    println!("  ✓ receptor desperto con el valor correcto");
}

#[test]
fn test_each_value_reaches_exactly_one_receiver() {
    println!("\n=== TEST: cada valor llega a un solo receptor ===");
    let ch = Arc::new(BlockingChannel::<u32>::new());
    let receivers: Vec<_> = (0..4)
        .map(|_| {
            let ch = Arc::clone(&ch);
            thread::spawn(move || (0..25).map(|_| ch.receive().unwrap()).collect::<Vec<_>>())
        })
        .collect();

    for i in 0..100 {
        ch.send(i).unwrap();
    }

    let mut seen = HashSet::new();
    for r in receivers {
        for v in r.join().unwrap() {
            assert!(seen.insert(v), "valor {} entregado dos veces", v);
        }
    }
    assert_eq!(seen.len(), 100);
    assert!(ch.is_empty());
}

#[test]
fn test_close_releases_blocked_receiver() {
    println!("\n=== TEST: close libera a un receptor bloqueado ===");
    let ch = Arc::new(BlockingChannel::<u8>::new());
    let receiver = {
        let ch = Arc::clone(&ch);
        thread::spawn(move || ch.receive())
    };

    thread::sleep(Duration::from_millis(20));
    ch.close();
    assert_eq!(receiver.join().unwrap(), Err(RecvError::Closed));
}

#[test]
fn test_receive_timeout_waits_roughly_the_timeout() {
    let ch = BlockingChannel::<u8>::new();
    let started = Instant::now();
    assert_eq!(
        ch.receive_timeout(Duration::from_millis(30)),
        Err(RecvTimeoutError::Timeout)
    );
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[test]
fn test_receive_timeout_gets_late_value() {
    let ch = Arc::new(BlockingChannel::new());
    let sender = {
        let ch = Arc::clone(&ch);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            ch.send("verde").unwrap();
        })
    };
    assert_eq!(ch.receive_timeout(Duration::from_secs(2)), Ok("verde"));
    sender.join().unwrap();
}

proptest! {
    #[test]
    fn prop_pop_order_policy(values in proptest::collection::vec(any::<u16>(), 0..64)) {
        let fifo = BlockingChannel::new();
        let lifo = BlockingChannel::with_order(PopOrder::Lifo);
        for v in &values {
            fifo.send(*v).unwrap();
            lifo.send(*v).unwrap();
        }

        let from_fifo: Vec<u16> = (0..values.len()).map(|_| fifo.receive().unwrap()).collect();
        let from_lifo: Vec<u16> = (0..values.len()).map(|_| lifo.receive().unwrap()).collect();

        let mut reversed = values.clone();
        reversed.reverse();
        prop_assert_eq!(from_fifo, values);
        prop_assert_eq!(from_lifo, reversed);
        prop_assert!(fifo.is_empty() && lifo.is_empty());
    }
}
