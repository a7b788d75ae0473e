//! Deep traversal for deep watchers.
//!
//! Reading every nested property once while a unit is evaluating subscribes
//! that unit to all of them. Observed containers are remembered by their
//! container dependency id, unobserved ones by address, so cyclic graphs are
//! visited once.

use std::collections::HashSet;

use super::dep::DepId;
use super::value::Value;

#[derive(Default)]
struct Seen {
    deps: HashSet<DepId>,
    addrs: HashSet<usize>,
}

impl Seen {
    fn first_visit(&mut self, value: &Value, addr: usize) -> bool {
        match value.observer() {
            Some(ob) => self.deps.insert(ob.dep().id()),
            None => self.addrs.insert(addr),
        }
    }
}

/// Touch every nested property and element of `value`.
pub fn traverse(value: &Value) {
    let mut seen = Seen::default();
    visit(value, &mut seen);
}

fn visit(value: &Value, seen: &mut Seen) {
    match value {
        Value::Object(object) => {
            if object.is_frozen() || !seen.first_visit(value, object.addr()) {
                return;
            }
            for key in object.keys() {
                visit(&object.get(&key), seen);
            }
        }
        Value::Array(array) => {
            if array.is_frozen() || !seen.first_visit(value, array.addr()) {
                return;
            }
            for item in array.to_vec() {
                visit(&item, seen);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{observe, Object};

    #[test]
    fn traverse_handles_cycles() {
        let object = Object::new();
        object.set("me", Value::Object(object.clone()));
        object.set("n", 1);
        let value = Value::Object(object);

        traverse(&value);
        observe(&value);
        traverse(&value);
    }
}
