use super::*;

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::error::RasterError;

#[test]
fn chunk_capacity_is_derived_from_item_size() {
    let arena = Arena::<u64>::new(64);
    assert_eq!(arena.chunk_capacity(), 8);
    assert_eq!(arena.chunk_count(), 0);

    let tiny = Arena::<[u8; 128]>::new(64);
    assert_eq!(tiny.chunk_capacity(), 1);
}

#[test]
fn alloc_links_new_chunks_when_full() {
    let mut arena = Arena::<u32>::new(8);
    for i in 0..5 {
        *arena.alloc(i).unwrap() += 100;
    }
    assert_eq!(arena.len(), 5);
    assert_eq!(arena.chunk_count(), 3);
    let items: Vec<u32> = arena.iter().copied().collect();
    assert_eq!(items, vec![100, 101, 102, 103, 104]);
}

#[test]
fn alloc_after_reset_fills_retained_chunk_first() {
    let mut arena = Arena::<u32>::new(8);
    for i in 0..3 {
        arena.alloc(i).unwrap();
    }
    arena.reset();

    *arena.alloc(7).unwrap() *= 2;
    *arena.alloc(8).unwrap() *= 2;
    assert_eq!(arena.chunk_count(), 1);
    *arena.alloc(9).unwrap() *= 2;
    assert_eq!(arena.chunk_count(), 2);
    let items: Vec<u32> = arena.iter().copied().collect();
    assert_eq!(items, vec![14, 16, 18]);
}

#[test]
fn reset_retains_exactly_one_chunk() {
    let mut arena = Arena::<u32>::new(8);
    for cycle in 0..10 {
        for i in 0..7 {
            arena.alloc(cycle * 10 + i).unwrap();
        }
        arena.reset();
        assert!(arena.is_empty());
        assert_eq!(arena.chunk_count(), 1);
    }
    arena.alloc(1).unwrap();
    assert_eq!(arena.chunk_count(), 1);
}

#[test]
fn reset_drops_items_in_allocation_order() {
    struct Tracked(u32, Rc<RefCell<Vec<u32>>>);
    impl Drop for Tracked {
        fn drop(&mut self) {
            self.1.borrow_mut().push(self.0);
        }
    }

    let dropped = Rc::new(RefCell::new(Vec::new()));
    let mut arena = Arena::new(2 * std::mem::size_of::<Tracked>());
    for i in 0..5 {
        arena.alloc(Tracked(i, dropped.clone())).unwrap();
    }
    arena.reset();
    assert_eq!(*dropped.borrow(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn oversized_chunk_request_reports_no_memory() {
    let mut arena = Arena::<u64>::new(usize::MAX);
    let err = arena.alloc(1).unwrap_err();
    assert!(matches!(err, RasterError::NoMemory));
    assert!(arena.is_empty());
}
