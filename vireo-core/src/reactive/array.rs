//! Intercepted Array Mutators
//!
//! The seven mutating operations (`push`, `pop`, `shift`, `unshift`,
//! `splice`, `sort`, `reverse`) perform the underlying change, observe any
//! inserted elements, and notify the array's container dependency. On an
//! array that has not been observed they behave like plain `Vec` operations.

use std::cmp::Ordering;

use super::observer::observe;
use super::value::{Array, Value};
use crate::debug::warn;

impl Array {
    fn mutate<R>(&self, op: impl FnOnce(&mut Vec<Value>) -> (R, Vec<Value>)) -> Option<R> {
        if self.is_frozen() {
            warn("Cannot mutate a frozen array", None);
            return None;
        }
        let (result, inserted) = self.with_items_mut(op);
        if let Some(ob) = self.observer() {
            for item in &inserted {
                observe(item);
            }
            ob.dep().notify();
        }
        Some(result)
    }

    /// Append one element; returns the new length.
    pub fn push(&self, value: impl Into<Value>) -> usize {
        self.extend([value.into()])
    }

    /// Append several elements with a single notification; returns the new
    /// length.
    pub fn extend(&self, values: impl IntoIterator<Item = Value>) -> usize {
        let values: Vec<Value> = values.into_iter().collect();
        self.mutate(|items| {
            items.extend(values.iter().cloned());
            ((), values)
        });
        self.len()
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<Value> {
        self.mutate(|items| (items.pop(), Vec::new())).flatten()
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Option<Value> {
        self.mutate(|items| {
            let first = (!items.is_empty()).then(|| items.remove(0));
            (first, Vec::new())
        })
        .flatten()
    }

    /// Prepend elements, keeping their order; returns the new length.
    pub fn unshift(&self, values: impl IntoIterator<Item = Value>) -> usize {
        let values: Vec<Value> = values.into_iter().collect();
        self.mutate(|items| {
            items.splice(0..0, values.iter().cloned());
            ((), values)
        });
        self.len()
    }

    /// Remove `delete_count` elements starting at `start` and insert `items`
    /// in their place. Out-of-range arguments are clamped. Returns the
    /// removed elements.
    pub fn splice(
        &self,
        start: usize,
        delete_count: usize,
        items: impl IntoIterator<Item = Value>,
    ) -> Vec<Value> {
        let inserted: Vec<Value> = items.into_iter().collect();
        self.mutate(|current| {
            let start = start.min(current.len());
            let end = start.saturating_add(delete_count).min(current.len());
            let removed: Vec<Value> = current.splice(start..end, inserted.iter().cloned()).collect();
            (removed, inserted)
        })
        .unwrap_or_default()
    }

    /// Sort by string representation, `undefined` last.
    pub fn sort(&self) {
        self.sort_by(|a, b| match (a.is_undefined(), b.is_undefined()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.to_string().cmp(&b.to_string()),
        });
    }

    /// Stable sort with a comparator.
    pub fn sort_by(&self, compare: impl FnMut(&Value, &Value) -> Ordering) {
        // The comparator may read the array, so sort a copy.
        let mut sorted = self.to_vec();
        sorted.sort_by(compare);
        self.mutate(|items| {
            *items = sorted;
            ((), Vec::new())
        });
    }

    /// Reverse in place.
    pub fn reverse(&self) {
        self.mutate(|items| {
            items.reverse();
            ((), Vec::new())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[i32]) -> Array {
        values.iter().map(|n| Value::from(*n)).collect()
    }

    fn as_numbers(array: &Array) -> Vec<f64> {
        array.to_vec().iter().filter_map(Value::as_number).collect()
    }

    #[test]
    fn mutators_match_vec_semantics() {
        let array = numbers(&[1, 2, 3]);
        assert_eq!(array.push(4), 4);
        assert_eq!(array.pop(), Some(Value::from(4)));
        assert_eq!(array.shift(), Some(Value::from(1)));
        assert_eq!(array.unshift([Value::from(0), Value::from(1)]), 4);
        assert_eq!(as_numbers(&array), vec![0.0, 1.0, 2.0, 3.0]);

        let removed = array.splice(1, 2, [Value::from(9)]);
        assert_eq!(removed, vec![Value::from(1), Value::from(2)]);
        assert_eq!(as_numbers(&array), vec![0.0, 9.0, 3.0]);

        array.reverse();
        assert_eq!(as_numbers(&array), vec![3.0, 9.0, 0.0]);
        array.sort();
        assert_eq!(as_numbers(&array), vec![0.0, 3.0, 9.0]);
    }

    #[test]
    fn splice_clamps_out_of_range_arguments() {
        let array = numbers(&[1, 2]);
        let removed = array.splice(5, 10, [Value::from(3)]);
        assert!(removed.is_empty());
        assert_eq!(as_numbers(&array), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn default_sort_is_lexicographic() {
        let array = numbers(&[10, 9, 1]);
        array.sort();
        assert_eq!(as_numbers(&array), vec![1.0, 10.0, 9.0]);
    }

    #[test]
    fn pushed_containers_become_observed() {
        let array = Array::new();
        observe(&Value::Array(array.clone()));

        let item = Value::object();
        array.push(item.clone());
        assert!(item.observer().is_some());
    }

    #[test]
    fn empty_pop_and_shift_return_none() {
        let array = Array::new();
        assert!(array.pop().is_none());
        assert!(array.shift().is_none());
    }
}
