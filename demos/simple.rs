//! Simple usage example

use spsc_chain::SpscQueue;
use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    println!("spsc_chain - Simple Example\n");

    // Split a queue into its two roles
    let (mut producer_half, mut consumer_half) = SpscQueue::<String>::new().into_split();

    // Producer thread
    let producer = thread::spawn(move || {
        for i in 0..10 {
            let message = format!("Message {}", i);
            println!("Sending: {}", message);
            producer_half.push_back(message).expect("out of memory");

            // Small delay to make output readable
            thread::sleep(Duration::from_millis(100));
        }
        println!("Producer finished!");
    });

    // Consumer thread
    let consumer = thread::spawn(move || {
        let mut received = 0;
        while received < 10 {
            match consumer_half.take_front() {
                Ok(message) => {
                    println!("Received: {}", message);
                    received += 1;
                }
                Err(_) => {
                    // Nothing published yet, spin and retry
                    std::hint::spin_loop();
                }
            }
        }
        println!("Consumer finished!");
    });

    producer.join().unwrap();
    consumer.join().unwrap();

    // Single-threaded container use
    let mut queue: SpscQueue<u32> = (1..=5).collect();
    println!("\nQueue: {:?} (len {})", queue, queue.len());
    queue.pop_front();
    let copy = queue.clone();
    queue.clear();
    println!("After clear: {:?}, copy still holds {:?}", queue, copy);

    println!("\nExample completed successfully!");
}
