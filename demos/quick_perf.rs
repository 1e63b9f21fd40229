use spsc_chain::waitfree::WaitFreeQueue;
use spsc_chain::SpscQueue;
use std::ptr::NonNull;
use std::thread;
use std::time::{Duration, Instant};

const MESSAGES: usize = 1_000_000;

fn main() {
    println!("spsc_chain Performance Test");
    println!("===========================\n");

    println!("SpscQueue, 1 Producer, 1 Consumer ({} messages):", MESSAGES);
    report(time(test_value_queue));

    println!("WaitFreeQueue, 1 Producer, 1 Consumer ({} messages):", MESSAGES);
    report(time(test_pointer_queue));

    println!("SpscQueue, single thread push then pop ({} messages):", MESSAGES);
    report(time(test_single_thread));
}

fn time(f: fn()) -> Duration {
    let start = Instant::now();
    f();
    start.elapsed()
}

fn report(elapsed: Duration) {
    let throughput = MESSAGES as f64 / elapsed.as_secs_f64();
    println!("  Time: {:?}", elapsed);
    println!("  Throughput: {:.2} msgs/sec", throughput);
    println!("  Latency: {:.0} ns/op\n", elapsed.as_nanos() as f64 / MESSAGES as f64);
}

fn test_value_queue() {
    let (mut tx, mut rx) = SpscQueue::new().into_split();

    let producer = thread::spawn(move || {
        for i in 0..MESSAGES {
            tx.push_back(i).unwrap();
        }
    });

    let consumer = thread::spawn(move || {
        for _ in 0..MESSAGES {
            while rx.take_front().is_err() {
                std::hint::spin_loop();
            }
        }
    });

    producer.join().unwrap();
    consumer.join().unwrap();
}

fn test_pointer_queue() {
    let values: Vec<usize> = (0..MESSAGES).collect();
    let (mut tx, mut rx) = WaitFreeQueue::new().into_split();

    thread::scope(|s| {
        s.spawn(|| {
            for value in &values {
                tx.produce(NonNull::from(value)).unwrap();
            }
        });
        s.spawn(|| {
            for _ in 0..MESSAGES {
                while rx.consume().is_none() {
                    std::hint::spin_loop();
                }
            }
        });
    });
}

fn test_single_thread() {
    let mut queue = SpscQueue::new();
    for i in 0..MESSAGES {
        queue.push_back(i).unwrap();
    }
    for _ in 0..MESSAGES {
        let _ = queue.front();
        queue.pop_front();
    }
}
