//! Index domains of list and tuple nodes.
//!
//! A domain is a run of exact indices `0..exact` optionally followed by an
//! open run starting at `open_from`. Open runs are never expanded: their first
//! index stands in for the whole run during enumeration.

use crate::classify::Shape;
use crate::ir::Ty;
use crate::path::Segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDomain {
    exact: usize,
    open_from: Option<usize>,
}

/// Where an index lands inside a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Fixed(usize),
    Open(usize),
}

impl IndexDomain {
    /// Any non-negative index; `0` is the representative.
    pub fn open() -> Self {
        IndexDomain { exact: 0, open_from: Some(0) }
    }

    /// Exactly `0..n`.
    pub fn fixed(n: usize) -> Self {
        IndexDomain { exact: n, open_from: None }
    }

    /// `0..n` plus everything from `n` on; `n` is the first rest position.
    pub fn fixed_then_open(n: usize) -> Self {
        IndexDomain { exact: n, open_from: Some(n) }
    }

    /// Domain of a list or tuple shape, `None` for anything else.
    pub fn of(shape: &Shape<'_>) -> Option<Self> {
        match shape {
            Shape::List { .. } => Some(Self::open()),
            Shape::Tuple { elems, rest: None } => Some(Self::fixed(elems.len())),
            Shape::Tuple { elems, rest: Some(_) } => Some(Self::fixed_then_open(elems.len())),
            _ => None,
        }
    }

    pub fn exact_len(&self) -> usize {
        self.exact
    }

    pub fn is_open(&self) -> bool {
        self.open_from.is_some()
    }

    pub fn locate(&self, index: usize) -> Option<Position> {
        if index < self.exact {
            return Some(Position::Fixed(index));
        }
        match self.open_from {
            Some(from) if index >= from => Some(Position::Open(index)),
            _ => None,
        }
    }

    /// Non-canonical index text is never a member.
    pub fn contains(&self, segment: &Segment) -> bool {
        segment.as_index().and_then(|i| self.locate(i)).is_some()
    }

    /// Exact indices in order, then the open run's first index.
    pub fn representatives(self) -> impl Iterator<Item = usize> {
        (0..self.exact).chain(self.open_from)
    }
}

/// Element type stored at `position` of a list or tuple shape.
pub fn element_at<'a>(shape: &Shape<'a>, position: Position) -> Option<&'a Ty> {
    match *shape {
        Shape::List { item } => Some(item),
        Shape::Tuple { elems, rest } => match position {
            Position::Fixed(i) => elems.get(i).map(|slot| &slot.ty),
            Position::Open(_) => rest,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(s: &str) -> Segment {
        Segment::new(s).unwrap()
    }

    #[test]
    fn list_domain_is_open_from_zero() {
        let domain = IndexDomain::open();
        assert!(domain.contains(&seg("0")));
        assert!(domain.contains(&seg("99")));
        assert!(!domain.contains(&seg("01")));
        assert!(!domain.contains(&seg("name")));
        assert_eq!(domain.representatives().collect::<Vec<_>>(), [0]);
    }

    #[test]
    fn tuple_arity_boundary() {
        let domain = IndexDomain::fixed(2);
        assert!(domain.contains(&seg("0")));
        assert!(domain.contains(&seg("1")));
        assert!(!domain.contains(&seg("2")));
        assert_eq!(domain.representatives().collect::<Vec<_>>(), [0, 1]);
        assert!(IndexDomain::fixed(0).representatives().next().is_none());
    }

    #[test]
    fn rest_tuple_opens_after_prefix() {
        let domain = IndexDomain::fixed_then_open(2);
        assert_eq!(domain.locate(1), Some(Position::Fixed(1)));
        assert_eq!(domain.locate(2), Some(Position::Open(2)));
        assert_eq!(domain.locate(40), Some(Position::Open(40)));
        assert_eq!(domain.representatives().collect::<Vec<_>>(), [0, 1, 2]);
    }
}
