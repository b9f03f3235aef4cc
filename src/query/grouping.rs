//! Group-adjacent materialization.
//!
//! The remote store returns rows already sorted by the grouping key, so one
//! linear scan suffices: carry the current key and group, yield the finished
//! group on a key change and once more after exhaustion. Empty input yields
//! zero groups, never one empty group. No sort happens here.

use crate::core::EngineResult;

/// One finished group: key plus its members in row order. Immutable once
/// yielded.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<K, V> {
    pub key: K,
    pub items: Vec<V>,
}

/// Run-length grouping over a fallible `(key, value)` stream.
///
/// An upstream error is forwarded once and ends the stream; any partial
/// group accumulated before it is discarded.
pub struct GroupAdjacent<I, K, V>
where
    I: Iterator<Item = EngineResult<(K, V)>>,
    K: PartialEq,
{
    inner: I,
    current: Option<(K, Vec<V>)>,
    done: bool,
}

impl<I, K, V> GroupAdjacent<I, K, V>
where
    I: Iterator<Item = EngineResult<(K, V)>>,
    K: PartialEq,
{
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            current: None,
            done: false,
        }
    }
}

impl<I, K, V> Iterator for GroupAdjacent<I, K, V>
where
    I: Iterator<Item = EngineResult<(K, V)>>,
    K: PartialEq,
{
    type Item = EngineResult<Group<K, V>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.inner.next() {
                Some(Ok((key, value))) => match self.current.take() {
                    Some((current_key, mut items)) if current_key == key => {
                        items.push(value);
                        self.current = Some((current_key, items));
                    }
                    Some((finished_key, items)) => {
                        self.current = Some((key, vec![value]));
                        return Some(Ok(Group {
                            key: finished_key,
                            items,
                        }));
                    }
                    None => self.current = Some((key, vec![value])),
                },
                Some(Err(e)) => {
                    self.done = true;
                    self.current = None;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return self
                        .current
                        .take()
                        .map(|(key, items)| Ok(Group { key, items }));
                }
            }
        }
    }
}
