use spsc_chain::waitfree::WaitFreeQueue;
use spsc_chain::{AllocationError, EmptyQueueError, Global, NodeAllocator, SpscQueue};
use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// Hands out at most `budget` nodes and tracks how many are still live.
#[derive(Clone, Default)]
struct Budgeted {
    state: Arc<Budget>,
}

#[derive(Default)]
struct Budget {
    remaining: AtomicUsize,
    live: AtomicIsize,
}

impl Budgeted {
    fn new(budget: usize) -> Self {
        let alloc = Budgeted::default();
        alloc.refill(budget);
        alloc
    }

    fn refill(&self, budget: usize) {
        self.state.remaining.store(budget, Ordering::SeqCst);
    }

    fn live(&self) -> isize {
        self.state.live.load(Ordering::SeqCst)
    }
}

unsafe impl NodeAllocator for Budgeted {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocationError> {
        self.state
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map_err(|_| AllocationError::new(layout))?;
        let ptr = Global.allocate(layout)?;
        self.state.live.fetch_add(1, Ordering::SeqCst);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
        Global.deallocate(ptr, layout)
    }
}

#[test]
fn test_fifo_hundred_integers() {
    let mut queue = SpscQueue::new();
    for i in 0..100 {
        queue.push_back(i).unwrap();
    }
    assert_eq!(queue.len(), 100);

    for i in 0..100 {
        assert_eq!(queue.take_front(), Ok(i));
    }
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
}

#[test]
fn test_strings_keep_order() {
    let mut queue = SpscQueue::new();
    queue.push_back("a".to_string()).unwrap();
    queue.push_back("b".to_string()).unwrap();
    queue.push_back("c".to_string()).unwrap();

    assert_eq!(queue.take_front().unwrap(), "a");
    assert_eq!(queue.take_front().unwrap(), "b");
    assert_eq!(queue.take_front().unwrap(), "c");
    assert_eq!(queue.take_front(), Err(EmptyQueueError));
}

#[test]
fn test_queue_of_queues() {
    let mut outer = SpscQueue::new();
    outer.push_back(SpscQueue::from_elem(100, 84365834)).unwrap();
    outer.push_back(SpscQueue::from_elem(200, 123456)).unwrap();

    for _ in 0..100 {
        assert_eq!(outer.front_mut().unwrap().take_front(), Ok(84365834));
    }
    assert!(outer.front().unwrap().is_empty());
    assert!(outer.pop_front());

    for _ in 0..200 {
        assert_eq!(outer.front_mut().unwrap().take_front(), Ok(123456));
    }
    assert!(outer.front().unwrap().is_empty());
    assert!(outer.pop_front());
    assert!(outer.is_empty());
}

#[test]
fn test_clear_then_push() {
    let mut queue = SpscQueue::new();
    queue.clear();
    queue.push_back(42).unwrap();
    assert_eq!(queue.front(), Ok(&42));
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_clear_and_extract_all() {
    let mut queue = SpscQueue::new();
    queue.push_back(1.3224).unwrap();
    queue.push_back(3.5).unwrap();
    queue.push_back(2.5).unwrap();
    assert_eq!(queue.len(), 3);

    queue.clear();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);

    queue.push_back(10.345).unwrap();
    assert_eq!(queue.len(), 1);

    queue.push_back(15.6).unwrap();
    assert_eq!(queue.extract_all(), 2);
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);

    queue.push_back(2.77).unwrap();
    assert_eq!(queue.front(), Ok(&2.77));
    assert!(queue.len() > 0);
}

#[test]
fn test_clear_is_idempotent() {
    let mut queue = SpscQueue::<u8>::new();
    queue.clear();
    queue.clear();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
}

#[test]
fn test_assignment_copies() {
    let mut lhs = SpscQueue::from_elem(50, 5678);
    let mut rhs = SpscQueue::from_elem(50, 12345);

    lhs.clone_from(&rhs);
    assert_eq!(lhs.len(), 50);
    assert_eq!(rhs.len(), 50);
    for _ in 0..50 {
        assert_eq!(lhs.take_front(), rhs.take_front());
    }
    assert!(lhs.is_empty());
    assert!(rhs.is_empty());

    let mut lhs = SpscQueue::from_elem(60, 1);
    let rhs = SpscQueue::from_elem(70, 98765);
    lhs.clone_from(&rhs);
    assert_eq!(lhs.len(), rhs.len());
    for _ in 0..70 {
        assert_eq!(lhs.take_front().ok().as_ref(), rhs.front().ok());
    }
    assert!(lhs.is_empty());
    assert_eq!(rhs.len(), 70);
}

#[test]
fn test_copy_independence() {
    let mut original: SpscQueue<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
    let mut copy = original.clone();
    assert_eq!(original, copy);

    original.push_back("z".into()).unwrap();
    copy.front_mut().unwrap().push('!');
    assert_eq!(original.iter().collect::<Vec<_>>(), ["x", "y", "z"]);
    assert_eq!(copy.iter().collect::<Vec<_>>(), ["x!", "y"]);

    copy.clear();
    assert_eq!(original.len(), 3);
}

#[test]
fn test_push_back_allocation_failure_leaves_queue_intact() {
    // anchor + placeholder + two values
    let alloc = Budgeted::new(4);
    let mut queue = SpscQueue::new_in(alloc.clone());
    queue.push_back(1).unwrap();
    queue.push_back(2).unwrap();

    let err = queue.push_back(3).unwrap_err();
    assert!(err.layout().size() > 0);
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.iter().copied().collect::<Vec<_>>(), [1, 2]);

    alloc.refill(1);
    queue.push_back(3).unwrap();
    assert_eq!(queue.take_front(), Ok(1));
    assert_eq!(queue.take_front(), Ok(2));
    assert_eq!(queue.take_front(), Ok(3));
    assert!(queue.is_empty());
}

#[test]
fn test_construction_failure_does_not_leak() {
    let alloc = Budgeted::new(0);
    assert!(SpscQueue::<u32, _>::try_new_in(alloc.clone()).is_err());
    assert_eq!(alloc.live(), 0);

    // the anchor fits, the placeholder does not
    alloc.refill(1);
    assert!(SpscQueue::<u32, _>::try_new_in(alloc.clone()).is_err());
    assert_eq!(alloc.live(), 0);

    alloc.refill(1);
    assert!(WaitFreeQueue::<u32, _>::try_new_in(alloc.clone()).is_err());
    assert_eq!(alloc.live(), 0);
}

#[test]
fn test_every_node_is_freed() {
    let alloc = Budgeted::new(usize::MAX);
    {
        let mut queue = SpscQueue::new_in(alloc.clone());
        for i in 0..32 {
            queue.push_back(i).unwrap();
        }
        assert_eq!(alloc.live(), 34);
        for _ in 0..10 {
            queue.pop_front();
        }
        assert_eq!(alloc.live(), 24);
        let copy = queue.clone();
        assert_eq!(copy.len(), 22);
    }
    assert_eq!(alloc.live(), 0);
}

#[test]
fn test_split_halves_free_everything() {
    let alloc = Budgeted::new(usize::MAX);
    let (mut tx, rx) = SpscQueue::new_in(alloc.clone()).into_split();
    let producer = thread::spawn(move || {
        for i in 0..100u32 {
            tx.push_back(i).unwrap();
        }
    });
    producer.join().unwrap();
    assert_eq!(rx.len(), 100);
    drop(rx);
    assert_eq!(alloc.live(), 0);
}

#[test]
fn test_drop_elements() {
    static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug)]
    struct DropCounter;

    impl Drop for DropCounter {
        fn drop(&mut self) {
            DROP_COUNT.fetch_add(1, Ordering::Relaxed);
        }
    }

    {
        let mut queue = SpscQueue::new();
        for _ in 0..5 {
            queue.push_back(DropCounter).unwrap();
        }
        drop(queue.take_front().unwrap());
        assert_eq!(DROP_COUNT.load(Ordering::Relaxed), 1);
    }

    assert_eq!(DROP_COUNT.load(Ordering::Relaxed), 5);
}

#[test]
fn test_cursor_sees_later_values() {
    let (mut tx, rx) = SpscQueue::new().into_split();
    tx.push_back(1).unwrap();

    let mut cursor = rx.cursor();
    assert_eq!(cursor.get(), Some(&1));
    assert!(!cursor.has_next());

    tx.push_back(2).unwrap();
    assert!(cursor.has_next());
    cursor.advance();
    assert_eq!(cursor.get(), Some(&2));

    cursor.advance();
    assert!(!cursor.is_valid());
}

#[test]
fn test_spsc_no_items() {
    let (tx, mut rx) = SpscQueue::<u64>::new().into_split();
    let producer = thread::spawn(move || drop(tx));
    producer.join().unwrap();
    assert!(rx.is_empty());
    assert_eq!(rx.take_front(), Err(EmptyQueueError));
}

#[test]
fn test_spsc_million_tagged_items() {
    const COUNT: u64 = 1_000_000;

    let (mut tx, mut rx) = SpscQueue::new().into_split();

    let producer = thread::spawn(move || {
        for tag in 0..COUNT {
            tx.push_back(tag).unwrap();
        }
    });

    let consumer = thread::spawn(move || {
        let mut expected = 0;
        while expected < COUNT {
            match rx.take_front() {
                Ok(tag) => {
                    assert_eq!(tag, expected);
                    expected += 1;
                }
                Err(EmptyQueueError) => std::hint::spin_loop(),
            }
        }
        rx
    });

    producer.join().unwrap();
    let rx = consumer.join().unwrap();
    assert!(rx.is_empty());
    assert_eq!(rx.len(), 0);
}

#[test]
fn test_spsc_concurrent_extract_all() {
    const COUNT: usize = 10_000;

    let (mut tx, mut rx) = SpscQueue::new().into_split();
    let producer = thread::spawn(move || {
        for i in 0..COUNT {
            tx.push_back(i).unwrap();
        }
    });

    let mut dropped = 0;
    while dropped < COUNT {
        dropped += rx.extract_all();
    }
    producer.join().unwrap();
    assert_eq!(dropped, COUNT);
    assert!(rx.is_empty());
}

#[test]
fn test_waitfree_threaded() {
    const COUNT: usize = 100_000;

    let values: Arc<Vec<usize>> = Arc::new((0..COUNT).collect());
    let (mut tx, mut rx) = WaitFreeQueue::new().into_split();

    let producer = {
        let values = values.clone();
        thread::spawn(move || {
            for value in values.iter() {
                tx.produce(NonNull::from(value)).unwrap();
            }
        })
    };

    let consumer = thread::spawn(move || {
        let mut expected = 0;
        while expected < COUNT {
            match rx.consume() {
                Some(ptr) => {
                    // SAFETY: `values` outlives both threads.
                    assert_eq!(unsafe { *ptr.as_ref() }, expected);
                    expected += 1;
                }
                None => std::hint::spin_loop(),
            }
        }
        assert!(rx.is_empty());
    });

    producer.join().unwrap();
    consumer.join().unwrap();
}

#[test]
fn test_waitfree_allocation_failure() {
    let value = 7u32;
    let alloc = Budgeted::new(3);
    let mut queue = WaitFreeQueue::new_in(alloc.clone());
    queue.produce(NonNull::from(&value)).unwrap();
    assert!(queue.produce(NonNull::from(&value)).is_err());

    assert_eq!(queue.consume(), Some(NonNull::from(&value)));
    assert_eq!(queue.consume(), None);
    drop(queue);
    assert_eq!(alloc.live(), 0);
}
