//! Dynamic Values
//!
//! Reactive state is held in a small dynamic value model. Primitives are
//! stored inline; objects and arrays are reference-counted handles, so
//! cloning a [`Value`] never copies a container and identity comparison is
//! pointer comparison.
//!
//! # Properties
//!
//! An [`Object`] keeps its properties in insertion order. Each property is
//! either a data slot or an accessor slot (getter/setter closures) and
//! carries `enumerable`/`configurable`/`writable` flags. Once an object has
//! been observed, each of its properties additionally owns a [`Dep`]; reads
//! go through [`Object::get`], which registers the active unit, and writes
//! go through [`Object::set`], which notifies.
//!
//! Plain writes to keys that do not exist yet add a *non-reactive* property,
//! the same way a plain assignment would. Use [`crate::reactive::set`] to add
//! a reactive key to an observed object.
//!
//! # Equality
//!
//! `PartialEq` is strict equality: primitives compare by value, containers by
//! identity and `NaN` is unequal to itself. Writes use [`Value::is_same`],
//! which additionally treats two `NaN`s as the same value.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::context::{untracked, ReactiveContext};
use super::dep::Dep;
use super::observer::{self, Observer};
use crate::config;
use crate::debug::warn;

/// Accessor getter.
pub type Getter = Rc<dyn Fn() -> Value>;

/// Accessor setter.
pub type Setter = Rc<dyn Fn(Value)>;

/// Development-time interceptor run before a reactive write lands.
pub type CustomSetter = Rc<dyn Fn(&Value)>;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Object(Object),
    Array(Array),
}

impl Value {
    /// A fresh, empty object.
    pub fn object() -> Self {
        Value::Object(Object::new())
    }

    /// A fresh, empty array.
    pub fn array() -> Self {
        Value::Array(Array::new())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// `undefined` or `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Objects and arrays.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    /// Truthiness: `false`, `0`, `NaN`, `""`, `null` and `undefined` are
    /// falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Object(_) | Value::Array(_) => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The observer attached to this container, if it has been observed.
    pub fn observer(&self) -> Option<Rc<Observer>> {
        match self {
            Value::Object(o) => o.observer(),
            Value::Array(a) => a.observer(),
            _ => None,
        }
    }

    /// Name of the value's type, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
        }
    }

    /// Write-comparison: strict equality, except that `NaN` is the same as
    /// `NaN`.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self == other,
        }
    }

    /// Read a member the way a dotted path segment would: object keys,
    /// array indices and an array's `length`. Reads are tracked.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(o) => o.get(key),
            Value::Array(a) => {
                if key == "length" {
                    Value::Number(a.len() as f64)
                } else {
                    key.parse::<usize>()
                        .ok()
                        .and_then(|i| a.get(i))
                        .unwrap_or_default()
                }
            }
            Value::Str(s) if key == "length" => Value::Number(s.chars().count() as f64),
            _ => Value::Undefined,
        }
    }

    /// Text as rendered into output: `null`/`undefined` become the empty
    /// string, containers become JSON.
    pub fn to_text(&self) -> String {
        match self {
            Value::Undefined | Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Convert to JSON. Accessors are evaluated without tracking.
    pub fn to_json(&self) -> serde_json::Value {
        untracked(|| serde_json::to_value(self).unwrap_or(serde_json::Value::Null))
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::Object(_) | Value::Array(_) => {
                let json = untracked(|| serde_json::to_string(self)).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Object(o) => fmt::Debug::fmt(o, f),
            Value::Array(a) => fmt::Debug::fmt(a, f),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Object(o) => {
                let entries: Vec<(Rc<str>, Value)> = o
                    .keys()
                    .into_iter()
                    .map(|k| {
                        let v = o.get_untracked(&k);
                        (k, v)
                    })
                    .collect();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in &entries {
                    map.serialize_entry(&**k, v)?;
                }
                map.end()
            }
            Value::Array(a) => {
                let items = a.to_vec();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Str(s.into()),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::Str(s)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::from(items))
    }
}

/// A property key as accepted by [`crate::reactive::set`] and
/// [`crate::reactive::del`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropKey {
    Name(Rc<str>),
    Index(usize),
}

impl PropKey {
    /// The key as an object property name.
    pub fn to_name(&self) -> Rc<str> {
        match self {
            PropKey::Name(name) => name.clone(),
            PropKey::Index(i) => i.to_string().into(),
        }
    }
}

impl fmt::Display for PropKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropKey::Name(name) => f.write_str(name),
            PropKey::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PropKey {
    fn from(name: &str) -> Self {
        PropKey::Name(name.into())
    }
}

impl From<String> for PropKey {
    fn from(name: String) -> Self {
        PropKey::Name(name.into())
    }
}

impl From<Rc<str>> for PropKey {
    fn from(name: Rc<str>) -> Self {
        PropKey::Name(name)
    }
}

impl From<usize> for PropKey {
    fn from(index: usize) -> Self {
        PropKey::Index(index)
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Slot {
    Data(Value),
    Accessor {
        get: Option<Getter>,
        set: Option<Setter>,
    },
}

impl Slot {
    fn read(&self) -> Value {
        match self {
            Slot::Data(value) => value.clone(),
            Slot::Accessor { get: Some(get), .. } => get(),
            Slot::Accessor { get: None, .. } => Value::Undefined,
        }
    }
}

#[derive(Clone)]
struct ReactiveSlot {
    dep: Dep,
    shallow: bool,
    custom_setter: Option<CustomSetter>,
}

struct Property {
    slot: Slot,
    enumerable: bool,
    configurable: bool,
    writable: bool,
    reactive: Option<ReactiveSlot>,
}

impl Property {
    fn data(value: Value) -> Self {
        Self {
            slot: Slot::Data(value),
            enumerable: true,
            configurable: true,
            writable: true,
            reactive: None,
        }
    }
}

/// Describes a property for [`Object::define_property`].
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub value: Value,
    pub get: Option<Getter>,
    pub set: Option<Setter>,
    pub enumerable: bool,
    pub configurable: bool,
    pub writable: bool,
}

impl PropertyDescriptor {
    /// An enumerable, configurable, writable data property.
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            get: None,
            set: None,
            enumerable: true,
            configurable: true,
            writable: true,
        }
    }

    /// An enumerable, configurable accessor property.
    pub fn accessor(get: Option<Getter>, set: Option<Setter>) -> Self {
        Self {
            value: Value::Undefined,
            get,
            set,
            enumerable: true,
            configurable: true,
            writable: true,
        }
    }

    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }
}

struct ObjectInner {
    props: RefCell<IndexMap<Rc<str>, Property>>,
    observer: RefCell<Option<Rc<Observer>>>,
    extensible: Cell<bool>,
    frozen: Cell<bool>,
    raw: Cell<bool>,
}

/// A reference-counted, insertion-ordered property map.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

impl Object {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                props: RefCell::new(IndexMap::new()),
                observer: RefCell::new(None),
                extensible: Cell::new(true),
                frozen: Cell::new(false),
                raw: Cell::new(false),
            }),
        }
    }

    /// Read a property. If it is reactive and a unit is evaluating, the unit
    /// is registered on the property's dependency, and on the value's own
    /// container dependency when the value is an observed container.
    pub fn get(&self, key: &str) -> Value {
        let (slot, reactive) = {
            let props = self.inner.props.borrow();
            let Some(prop) = props.get(key) else {
                return Value::Undefined;
            };
            (
                prop.slot.clone(),
                prop.reactive.as_ref().map(|r| (r.dep.clone(), r.shallow)),
            )
        };
        let value = slot.read();

        if let Some((dep, shallow)) = reactive {
            if ReactiveContext::is_active() {
                dep.depend();
                if !shallow {
                    if let Some(child) = value.observer() {
                        child.dep().depend();
                        if let Value::Array(array) = &value {
                            observer::depend_array(array);
                        }
                    }
                }
            }
        }
        value
    }

    /// Read a property without registering any dependency.
    pub fn get_untracked(&self, key: &str) -> Value {
        untracked(|| self.get(key))
    }

    /// Write a property.
    ///
    /// Absent keys are added as plain (non-reactive) data properties.
    /// Reactive properties compare the new value with [`Value::is_same`] and
    /// only notify on change.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let existing = {
            let props = self.inner.props.borrow();
            props
                .get(key)
                .map(|p| (p.slot.clone(), p.writable, p.reactive.clone()))
        };

        match existing {
            None => {
                if !self.inner.extensible.get() {
                    warn(
                        format!("Cannot add property \"{key}\": object is not extensible"),
                        None,
                    );
                    return;
                }
                self.inner
                    .props
                    .borrow_mut()
                    .insert(key.into(), Property::data(value));
            }
            Some((slot, writable, None)) => match slot {
                Slot::Data(_) if writable => self.store(key, value),
                Slot::Data(_) => {}
                Slot::Accessor { set: Some(set), .. } => set(value),
                Slot::Accessor { set: None, .. } => {}
            },
            Some((slot, _, Some(reactive))) => self.reactive_set(key, slot, reactive, value),
        }
    }

    fn reactive_set(&self, key: &str, slot: Slot, reactive: ReactiveSlot, value: Value) {
        let old = untracked(|| slot.read());
        if value.is_same(&old) {
            return;
        }
        if let Some(custom_setter) = &reactive.custom_setter {
            if config::with(|c| c.dev_mode) {
                custom_setter(&value);
            }
        }
        match slot {
            Slot::Accessor {
                get: Some(_),
                set: None,
            } => {
                if config::with(|c| c.dev_mode) {
                    warn(
                        format!("Cannot assign to property \"{key}\" which has only a getter"),
                        None,
                    );
                }
                return;
            }
            Slot::Accessor { set: Some(set), .. } => set(value.clone()),
            _ => self.store(key, value.clone()),
        }
        if !reactive.shallow {
            observer::observe(&value);
        }
        reactive.dep.notify();
    }

    fn store(&self, key: &str, value: Value) {
        if let Some(prop) = self.inner.props.borrow_mut().get_mut(key) {
            prop.slot = Slot::Data(value);
        }
    }

    /// Own property check (enumerable or not).
    pub fn has(&self, key: &str) -> bool {
        self.inner.props.borrow().contains_key(key)
    }

    /// Enumerable keys in insertion order.
    pub fn keys(&self) -> Vec<Rc<str>> {
        self.inner
            .props
            .borrow()
            .iter()
            .filter(|(_, p)| p.enumerable)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Number of enumerable keys.
    pub fn len(&self) -> usize {
        self.inner
            .props
            .borrow()
            .values()
            .filter(|p| p.enumerable)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a property without notifying anyone. Returns the removed
    /// value, or `None` if the key was absent or not configurable.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let slot = {
            let mut props = self.inner.props.borrow_mut();
            if !props.get(key)?.configurable {
                return None;
            }
            props.shift_remove(key)?.slot
        };
        Some(untracked(|| slot.read()))
    }

    /// Define or redefine a property. Existing non-configurable properties
    /// are left untouched; returns whether the definition applied.
    pub fn define_property(&self, key: &str, descriptor: PropertyDescriptor) -> bool {
        let mut props = self.inner.props.borrow_mut();
        match props.get(key) {
            Some(prop) if !prop.configurable => return false,
            None if !self.inner.extensible.get() => return false,
            _ => {}
        }
        let slot = if descriptor.get.is_some() || descriptor.set.is_some() {
            Slot::Accessor {
                get: descriptor.get,
                set: descriptor.set,
            }
        } else {
            Slot::Data(descriptor.value)
        };
        props.insert(
            key.into(),
            Property {
                slot,
                enumerable: descriptor.enumerable,
                configurable: descriptor.configurable,
                writable: descriptor.writable,
                reactive: None,
            },
        );
        true
    }

    /// Shorthand for an enumerable, configurable accessor property.
    pub fn define_accessor(&self, key: &str, get: Option<Getter>, set: Option<Setter>) -> bool {
        self.define_property(key, PropertyDescriptor::accessor(get, set))
    }

    /// Install reactive interception on `key`, creating the property when it
    /// is absent. Returns the value to observe as the property's child, or
    /// `None` when the property cannot be intercepted.
    pub(crate) fn make_reactive(
        &self,
        key: &str,
        value: Option<Value>,
        shallow: bool,
        custom_setter: Option<CustomSetter>,
    ) -> Option<Value> {
        let child = {
            let mut props = self.inner.props.borrow_mut();
            if !props.contains_key(key) {
                if !self.inner.extensible.get() {
                    return None;
                }
                props.insert(key.into(), Property::data(Value::Undefined));
            }
            let prop = props.get_mut(key)?;
            if !prop.configurable {
                return None;
            }

            let dep = prop
                .reactive
                .as_ref()
                .map(|r| r.dep.clone())
                .unwrap_or_default();
            prop.reactive = Some(ReactiveSlot {
                dep,
                shallow,
                custom_setter,
            });

            match &mut prop.slot {
                Slot::Data(current) => {
                    if let Some(value) = value {
                        *current = value;
                    }
                    Slot::Data(current.clone())
                }
                // Getter-only accessors are read lazily; there is nothing to
                // observe up front.
                Slot::Accessor {
                    get: Some(_),
                    set: None,
                } => Slot::Data(Value::Undefined),
                accessor => accessor.clone(),
            }
        };
        Some(untracked(|| child.read()))
    }

    /// The dependency guarding `key`, if the property is reactive.
    pub fn dep_of(&self, key: &str) -> Option<Dep> {
        self.inner
            .props
            .borrow()
            .get(key)
            .and_then(|p| p.reactive.as_ref().map(|r| r.dep.clone()))
    }

    /// Whether `key` has reactive interception installed.
    pub fn is_reactive(&self, key: &str) -> bool {
        self.dep_of(key).is_some()
    }

    /// Make every property read-only and non-configurable, and forbid new
    /// keys. Frozen objects are never observed.
    pub fn freeze(&self) {
        self.inner.extensible.set(false);
        self.inner.frozen.set(true);
        for prop in self.inner.props.borrow_mut().values_mut() {
            prop.configurable = false;
            prop.writable = false;
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.get()
    }

    /// Forbid new keys.
    pub fn prevent_extensions(&self) {
        self.inner.extensible.set(false);
    }

    pub fn is_extensible(&self) -> bool {
        self.inner.extensible.get()
    }

    /// Exclude this object from observation.
    pub fn mark_raw(&self) {
        self.inner.raw.set(true);
    }

    pub fn is_raw(&self) -> bool {
        self.inner.raw.get()
    }

    pub fn observer(&self) -> Option<Rc<Observer>> {
        self.inner.observer.borrow().clone()
    }

    pub(crate) fn attach_observer(&self, observer: Rc<Observer>) {
        *self.inner.observer.borrow_mut() = Some(observer);
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<Rc<str>>> FromIterator<(K, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let object = Object::new();
        {
            let mut props = object.inner.props.borrow_mut();
            for (key, value) in iter {
                props.insert(key.into(), Property::data(value));
            }
        }
        object
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("keys", &self.keys())
            .field("observed", &self.observer().is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Array
// ---------------------------------------------------------------------------

struct ArrayInner {
    items: RefCell<Vec<Value>>,
    observer: RefCell<Option<Rc<Observer>>>,
    frozen: Cell<bool>,
    raw: Cell<bool>,
}

/// A reference-counted list of values.
///
/// Index writes through [`Array::set_index`] are not observable. The
/// mutators in `reactive::array` (`push`, `pop`, `shift`, `unshift`,
/// `splice`, `sort`, `reverse`) notify the array's dependency.
#[derive(Clone)]
pub struct Array {
    inner: Rc<ArrayInner>,
}

impl Array {
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// Element at `index`. Element reads are not tracked individually; the
    /// array's own dependency covers them.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.items.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.items.borrow().clone()
    }

    /// Borrow the elements.
    pub fn items(&self) -> Ref<'_, Vec<Value>> {
        self.inner.items.borrow()
    }

    /// Plain, unobserved index write. Grows the array with `undefined` as
    /// needed.
    pub fn set_index(&self, index: usize, value: impl Into<Value>) {
        if self.is_frozen() {
            return;
        }
        let mut items = self.inner.items.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value.into();
    }

    /// Pad with `undefined` up to `len` elements.
    pub(crate) fn grow_to(&self, len: usize) {
        let mut items = self.inner.items.borrow_mut();
        if items.len() < len {
            items.resize(len, Value::Undefined);
        }
    }

    pub(crate) fn with_items_mut<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> R) -> R {
        f(&mut self.inner.items.borrow_mut())
    }

    /// Forbid all mutation. Frozen arrays are never observed.
    pub fn freeze(&self) {
        self.inner.frozen.set(true);
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.get()
    }

    pub fn is_extensible(&self) -> bool {
        !self.is_frozen()
    }

    /// Exclude this array from observation.
    pub fn mark_raw(&self) {
        self.inner.raw.set(true);
    }

    pub fn is_raw(&self) -> bool {
        self.inner.raw.get()
    }

    pub fn observer(&self) -> Option<Rc<Observer>> {
        self.inner.observer.borrow().clone()
    }

    pub(crate) fn attach_observer(&self, observer: Rc<Observer>) {
        *self.inner.observer.borrow_mut() = Some(observer);
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self {
            inner: Rc::new(ArrayInner {
                items: RefCell::new(items),
                observer: RefCell::new(None),
                frozen: Cell::new(false),
                raw: Cell::new(false),
            }),
        }
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("len", &self.len())
            .field("observed", &self.observer().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_equality_compares_containers_by_identity() {
        let a = Value::object();
        let b = Value::object();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(Value::from(1), Value::from(1.0));
        assert_ne!(Value::from(f64::NAN), Value::from(f64::NAN));
    }

    #[test]
    fn nan_is_same_as_nan_for_writes() {
        let nan = Value::Number(f64::NAN);
        assert!(nan.is_same(&Value::Number(f64::NAN)));
        assert!(!nan.is_same(&Value::Number(0.0)));
    }

    #[test]
    fn numbers_display_like_script_numbers() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Undefined.to_text(), "");
    }

    #[test]
    fn json_conversion_preserves_structure() {
        let value = Value::from(json!({ "a": 1, "b": [true, "x"], "c": null }));
        let object = value.as_object().unwrap();
        assert_eq!(object.keys().len(), 3);
        assert_eq!(object.get("a"), Value::from(1));
        assert_eq!(value.to_json(), json!({ "a": 1, "b": [true, "x"], "c": null }));
    }

    #[test]
    fn plain_set_adds_non_reactive_property() {
        let object = Object::new();
        object.set("a", 1);
        assert!(object.has("a"));
        assert!(!object.is_reactive("a"));
        assert_eq!(object.get("a"), Value::from(1));
    }

    #[test]
    fn frozen_objects_reject_writes() {
        let object: Object = [("a", Value::from(1))].into_iter().collect();
        object.freeze();
        object.set("a", 2);
        assert_eq!(object.get("a"), Value::from(1));
        assert!(object.remove("a").is_none());
        assert!(!object.is_extensible());
    }

    #[test]
    fn accessor_properties_call_their_closures() {
        let backing = Rc::new(RefCell::new(Value::from(1)));
        let (read, write) = (backing.clone(), backing.clone());
        let object = Object::new();
        object.define_accessor(
            "x",
            Some(Rc::new(move || read.borrow().clone())),
            Some(Rc::new(move |v| *write.borrow_mut() = v)),
        );

        object.set("x", 5);
        assert_eq!(object.get("x"), Value::from(5));
        assert_eq!(*backing.borrow(), Value::from(5));
    }

    #[test]
    fn hidden_properties_are_not_enumerated() {
        let object = Object::new();
        object.define_property("secret", PropertyDescriptor::data(1).enumerable(false));
        object.set("shown", 2);
        assert_eq!(object.keys(), vec![Rc::<str>::from("shown")]);
        assert!(object.has("secret"));
    }

    #[test]
    fn array_paths_resolve_length_and_indices() {
        let array = Value::from(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(array.get("length"), Value::from(2));
        assert_eq!(array.get("1"), Value::from("b"));
        assert!(array.get("7").is_undefined());
    }
}
