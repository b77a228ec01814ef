//! Persistent indexed list.
//!
//! A height-balanced binary tree whose nodes carry subtree sizes, so positional
//! lookups, inserts and removals are all `O(log n)`. Nodes are shared through
//! `Arc`: an update copies only the path from the root to the touched
//! position and every older `PList` keeps pointing at its own root.

use std::fmt;
use std::sync::Arc;

use crate::error::BenchError;

type Link<T> = Option<Arc<Node<T>>>;

struct Node<T> {
    value: T,
    left: Link<T>,
    right: Link<T>,
    height: u8,
    size: usize,
}

fn height<T>(link: &Link<T>) -> u8 {
    link.as_ref().map_or(0, |n| n.height)
}

fn size<T>(link: &Link<T>) -> usize {
    link.as_ref().map_or(0, |n| n.size)
}

fn node<T>(left: Link<T>, value: T, right: Link<T>) -> Arc<Node<T>> {
    Arc::new(Node {
        height: height(&left).max(height(&right)) + 1,
        size: size(&left) + size(&right) + 1,
        value,
        left,
        right,
    })
}

/// Rebuilds a node whose children differ in height by at most two.
fn balance<T: Clone>(left: Link<T>, value: T, right: Link<T>) -> Arc<Node<T>> {
    let (hl, hr) = (height(&left), height(&right));
    if hl > hr + 1 {
        let l = left.expect("taller side is non-empty");
        if height(&l.left) >= height(&l.right) {
            node(
                l.left.clone(),
                l.value.clone(),
                Some(node(l.right.clone(), value, right)),
            )
        } else {
            let lr = l.right.as_ref().expect("inner grandchild is taller");
            node(
                Some(node(l.left.clone(), l.value.clone(), lr.left.clone())),
                lr.value.clone(),
                Some(node(lr.right.clone(), value, right)),
            )
        }
    } else if hr > hl + 1 {
        let r = right.expect("taller side is non-empty");
        if height(&r.right) >= height(&r.left) {
            node(
                Some(node(left, value, r.left.clone())),
                r.value.clone(),
                r.right.clone(),
            )
        } else {
            let rl = r.left.as_ref().expect("inner grandchild is taller");
            node(
                Some(node(left, value, rl.left.clone())),
                rl.value.clone(),
                Some(node(rl.right.clone(), r.value.clone(), r.right.clone())),
            )
        }
    } else {
        node(left, value, right)
    }
}

fn insert_at<T: Clone>(link: &Link<T>, index: usize, value: T) -> Arc<Node<T>> {
    match link {
        None => node(None, value, None),
        Some(n) => {
            let ls = size(&n.left);
            if index <= ls {
                balance(Some(insert_at(&n.left, index, value)), n.value.clone(), n.right.clone())
            } else {
                balance(
                    n.left.clone(),
                    n.value.clone(),
                    Some(insert_at(&n.right, index - ls - 1, value)),
                )
            }
        }
    }
}

fn remove_min<T: Clone>(n: &Arc<Node<T>>) -> (Link<T>, T) {
    match &n.left {
        None => (n.right.clone(), n.value.clone()),
        Some(left) => {
            let (rest, min) = remove_min(left);
            (Some(balance(rest, n.value.clone(), n.right.clone())), min)
        }
    }
}

/// Caller guarantees `index < n.size`.
fn remove_at<T: Clone>(n: &Arc<Node<T>>, index: usize) -> (Link<T>, T) {
    let ls = size(&n.left);
    if index < ls {
        let left = n.left.as_ref().expect("index inside left subtree");
        let (rest, removed) = remove_at(left, index);
        (Some(balance(rest, n.value.clone(), n.right.clone())), removed)
    } else if index > ls {
        let right = n.right.as_ref().expect("index inside right subtree");
        let (rest, removed) = remove_at(right, index - ls - 1);
        (Some(balance(n.left.clone(), n.value.clone(), rest)), removed)
    } else {
        let joined = match (&n.left, &n.right) {
            (None, right) => right.clone(),
            (left, None) => left.clone(),
            (left, Some(right)) => {
                let (rest, successor) = remove_min(right);
                Some(balance(left.clone(), successor, rest))
            }
        };
        (joined, n.value.clone())
    }
}

fn build<T: Clone>(items: &[T]) -> Link<T> {
    if items.is_empty() {
        return None;
    }
    let mid = items.len() / 2;
    Some(node(build(&items[..mid]), items[mid].clone(), build(&items[mid + 1..])))
}

/// Immutable list; every update returns a new version sharing structure with
/// the receiver.
pub struct PList<T> {
    root: Link<T>,
}

impl<T> Clone for PList<T> {
    fn clone(&self) -> Self {
        Self { root: self.root.clone() }
    }
}

impl<T> Default for PList<T> {
    fn default() -> Self {
        Self { root: None }
    }
}

impl<T> PList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        size(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn get(&self, mut index: usize) -> Option<&T> {
        let mut cur = self.root.as_deref();
        while let Some(n) = cur {
            let ls = size(&n.left);
            if index < ls {
                cur = n.left.as_deref();
            } else if index == ls {
                return Some(&n.value);
            } else {
                index -= ls + 1;
                cur = n.right.as_deref();
            }
        }
        None
    }

    pub fn last(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter {
            stack: Vec::with_capacity(usize::from(height(&self.root))),
            remaining: self.len(),
        };
        iter.descend_left(self.root.as_deref());
        iter
    }

    /// True when both lists share the same root node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Clone> PList<T> {
    pub fn from_slice(items: &[T]) -> Self {
        Self { root: build(items) }
    }

    pub fn push_back(&self, value: T) -> Self {
        self.insert_unchecked(self.len(), value)
    }

    pub fn insert(&self, index: usize, value: T) -> Result<Self, BenchError> {
        let len = self.len();
        if index > len {
            return Err(BenchError::out_of_range(index, len));
        }
        Ok(self.insert_unchecked(index, value))
    }

    fn insert_unchecked(&self, index: usize, value: T) -> Self {
        Self {
            root: Some(insert_at(&self.root, index, value)),
        }
    }

    pub fn remove(&self, index: usize) -> Result<Self, BenchError> {
        match &self.root {
            Some(root) if index < root.size => Ok(Self {
                root: remove_at(root, index).0,
            }),
            _ => Err(BenchError::out_of_range(index, self.len())),
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Clone> FromIterator<T> for PList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items: Vec<T> = iter.into_iter().collect();
        Self::from_slice(&items)
    }
}

impl<T: PartialEq> PartialEq for PList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: fmt::Debug> fmt::Debug for PList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// In-order iterator over a `PList`.
pub struct Iter<'a, T> {
    stack: Vec<&'a Node<T>>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    fn descend_left(&mut self, mut cur: Option<&'a Node<T>>) {
        while let Some(n) = cur {
            self.stack.push(n);
            cur = n.left.as_deref();
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        self.descend_left(n.right.as_deref());
        self.remaining -= 1;
        Some(&n.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a PList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
