//! Vireo Core
//!
//! This crate provides the runtime for the Vireo reactive UI framework.
//! It implements:
//!
//! - Dependency-tracked reactive state over a dynamic value model
//! - Observer units (render, computed and user watches) with batched,
//!   ordered scheduling
//! - A virtual tree and a keyed two-ended reconciler over a pluggable host
//! - Component instances and their lifecycle
//!
//! Everything runs on one thread. State lives in `Rc`/`RefCell` handles and
//! per-thread registries, so each thread hosts an independent runtime.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: values, dependencies, observation and observer units
//! - `scheduler`: the update queue and deferred callbacks
//! - `vdom`: virtual nodes, the reconciler and host operations
//! - `component`: component definitions and instances
//! - `config`, `error`, `debug`: runtime settings, error routing and
//!   usage warnings
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use vireo_core::component::{Component, ComponentDef};
//! use vireo_core::scheduler::flush_ticks;
//! use vireo_core::vdom::{MemoryHost, NodeOps, Patcher, VNode};
//!
//! let def = ComponentDef::builder("Counter")
//!     .data(|_| Ok(serde_json::json!({ "count": 0 }).into()))
//!     .render(|vm| Ok(VNode::element("p").child(VNode::text(vm.get("count").to_text())).build()))
//!     .build();
//!
//! let host = Rc::new(MemoryHost::new());
//! let vm = Component::new(&def);
//! vm.mount(Patcher::new(host.clone()), None);
//!
//! vm.set("count", 3);
//! // Updates are batched until the next tick.
//! flush_ticks();
//! assert_eq!(host.text_content(vm.el().unwrap()), "3");
//! ```

pub mod component;
pub mod config;
pub mod debug;
pub mod error;
pub mod reactive;
pub mod scheduler;
pub mod vdom;

pub use component::{Component, ComponentDef};
pub use config::Config;
pub use error::{Error, ErrorFlow, Result};
pub use reactive::{del, observe, set, watch, Value};
pub use scheduler::{flush_ticks, next_tick, tick};
pub use vdom::{Patcher, VNode};
