//! Two-stage pipeline: each hop between threads is its own SPSC queue.

use spsc_chain::SpscQueue;
use std::thread;
use std::time::Duration;

fn main() {
    println!("Pipeline Example\n");

    const NUM_JOBS: usize = 20;

    let (mut jobs_tx, mut jobs_rx) = SpscQueue::<String>::new().into_split();
    let (mut results_tx, mut results_rx) = SpscQueue::<String>::new().into_split();

    let producer = thread::spawn(move || {
        for i in 0..NUM_JOBS {
            let job = format!("Job-{:02}", i);
            println!("📝 Enqueued: {}", job);
            jobs_tx.push_back(job).expect("out of memory");
            thread::sleep(Duration::from_millis(50));
        }
        println!("✅ All jobs enqueued!");
    });

    let worker = thread::spawn(move || {
        let mut processed = 0;
        while processed < NUM_JOBS {
            match jobs_rx.take_front() {
                Ok(job) => {
                    println!("🔨 Worker processing: {} ({} waiting)", job, jobs_rx.len());
                    thread::sleep(Duration::from_millis(20));
                    results_tx
                        .push_back(format!("{} -> completed", job))
                        .expect("out of memory");
                    processed += 1;
                }
                Err(_) => thread::sleep(Duration::from_millis(10)),
            }
        }
        println!("Worker finished ({} jobs)", processed);
    });

    let collector = thread::spawn(move || {
        let mut collected = 0;
        while collected < NUM_JOBS {
            match results_rx.take_front() {
                Ok(result) => {
                    println!("✨ Result: {}", result);
                    collected += 1;
                }
                Err(_) => std::hint::spin_loop(),
            }
        }
        println!("✅ All results collected!");
    });

    producer.join().unwrap();
    worker.join().unwrap();
    collector.join().unwrap();

    println!("\n🎉 Pipeline example completed!");
}
