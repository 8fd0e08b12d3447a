//! A node-based container written against `ContainerAllocator`.

use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use nebula_slotpool::{ContainerAllocator, PoolAlloc, PoolError, PoolRegistry};

struct Node<T> {
    value: T,
    next: Option<NonNull<Node<T>>>,
}

/// Singly linked stack that allocates its nodes through a rebound allocator
struct Stack<T: 'static, A: ContainerAllocator<Value = T>> {
    head: Option<NonNull<Node<T>>>,
    len: usize,
    nodes: A::Rebind<Node<T>>,
}

impl<T: 'static, A: ContainerAllocator<Value = T>> Stack<T, A> {
    fn new_in(alloc: &A) -> Self {
        Self {
            head: None,
            len: 0,
            nodes: alloc.rebind::<Node<T>>(),
        }
    }

    fn push(&mut self, value: T) -> Result<(), PoolError> {
        let node = self.nodes.allocate(1)?;
        unsafe {
            self.nodes.construct(
                node,
                Node {
                    value,
                    next: self.head,
                },
            );
        }
        self.head = Some(node);
        self.len += 1;
        Ok(())
    }

    fn pop(&mut self) -> Option<T> {
        let node = self.head?;
        let Node { value, next } = unsafe { node.as_ptr().read() };
        unsafe { self.nodes.deallocate(node, 1).ok()? };
        self.head = next;
        self.len -= 1;
        Some(value)
    }

    fn peek(&self) -> Option<&T> {
        self.head.map(|node| unsafe { &(*node.as_ptr()).value })
    }
}

impl<T: 'static, A: ContainerAllocator<Value = T>> Drop for Stack<T, A> {
    fn drop(&mut self) {
        while self.head.is_some() {
            self.pop();
        }
    }
}

#[test]
fn stack_allocates_nodes_from_the_node_pool() {
    let alloc = PoolAlloc::<u64>::new();
    let mut stack = Stack::new_in(&alloc);

    for i in 0..32 {
        stack.push(i).unwrap();
    }
    assert_eq!(stack.len, 32);
    assert_eq!(stack.peek(), Some(&31));
    assert!(PoolRegistry::is_registered::<Node<u64>>());
    assert_eq!(PoolRegistry::pool::<Node<u64>>().lock().in_use(), 32);

    let popped: Vec<_> = std::iter::from_fn(|| stack.pop()).take(5).collect();
    assert_eq!(popped, vec![31, 30, 29, 28, 27]);

    drop(stack);
    assert_eq!(PoolRegistry::pool::<Node<u64>>().lock().in_use(), 0);
}

#[test]
fn values_are_dropped_exactly_once() {
    struct Counted(Rc<Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    let drops = Rc::new(Cell::new(0));
    {
        let mut stack = Stack::new_in(&PoolAlloc::<Counted>::new());
        for _ in 0..10 {
            stack.push(Counted(Rc::clone(&drops))).unwrap();
        }
        drop(stack.pop());
        assert_eq!(drops.get(), 1);
    }
    assert_eq!(drops.get(), 10);
}

#[test]
fn rebound_allocators_compare_equal() {
    let values = PoolAlloc::<String>::new();
    let nodes = values.rebind::<Node<String>>();
    assert_eq!(values, nodes);
    assert_eq!(nodes, nodes.rebind::<String>());
    assert!(<PoolAlloc<String> as ContainerAllocator>::PROPAGATE_ON_MOVE_ASSIGNMENT);
}

#[test]
fn max_size_is_bounded_by_element_size() {
    let alloc = PoolAlloc::<[u8; 32]>::new();
    assert_eq!(alloc.max_size(), usize::MAX / 32);
    assert!(matches!(
        alloc.allocate(usize::MAX),
        Err(PoolError::ExceedsMaxSize { .. })
    ));
}
