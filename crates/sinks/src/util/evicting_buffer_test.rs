//! Tests for BoundedEvictingBuffer

use super::BoundedEvictingBuffer;
use crate::error::SinkError;

#[test]
fn test_zero_capacity_rejected() {
    let err = BoundedEvictingBuffer::<u32>::new(0).unwrap_err();
    assert!(matches!(err, SinkError::InvalidCapacity { capacity: 0 }));
}

#[test]
fn test_add_below_capacity() {
    let mut buffer = BoundedEvictingBuffer::new(3).unwrap();

    assert_eq!(buffer.add(1), None);
    assert_eq!(buffer.add(2), None);

    assert_eq!(buffer.len(), 2);
    assert!(!buffer.is_full());
    assert_eq!(buffer.peek(), Some(&1));
    assert_eq!(buffer.peek_newest(), Some(&2));
}

#[test]
fn test_add_evicts_oldest() {
    let mut buffer = BoundedEvictingBuffer::new(3).unwrap();
    buffer.add_all([1, 2, 3]);
    assert!(buffer.is_full());

    assert_eq!(buffer.add(4), Some(1));
    assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
}

#[test]
fn test_len_never_exceeds_capacity() {
    let mut buffer = BoundedEvictingBuffer::new(4).unwrap();

    for i in 0..100 {
        buffer.add(i);
        assert!(buffer.len() <= buffer.capacity());
    }

    // The survivors are the newest elements, oldest first
    assert_eq!(buffer.drain(), vec![96, 97, 98, 99]);
    assert!(buffer.is_empty());
}

#[test]
fn test_add_all_reports_evictions() {
    let mut buffer = BoundedEvictingBuffer::new(2).unwrap();
    assert_eq!(buffer.add_all(0..5), 3);
    assert_eq!(buffer.peek(), Some(&3));
}

#[test]
fn test_poll_removes_oldest() {
    let mut buffer = BoundedEvictingBuffer::new(2).unwrap();
    buffer.add("a");
    buffer.add("b");
    buffer.add("c");

    assert_eq!(buffer.poll(), Some("b"));
    assert_eq!(buffer.poll(), Some("c"));
    assert_eq!(buffer.poll(), None);
}

#[test]
fn test_capacity_one() {
    let mut buffer = BoundedEvictingBuffer::new(1).unwrap();
    assert_eq!(buffer.add('x'), None);
    assert_eq!(buffer.add('y'), Some('x'));
    assert_eq!(buffer.len(), 1);

    buffer.clear();
    assert!(buffer.is_empty());
}
