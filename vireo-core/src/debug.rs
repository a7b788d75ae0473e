//! Usage warnings.
//!
//! Warnings are non-fatal diagnostics (writing to a primitive, duplicate
//! keys, malformed watch paths...). They go to the configured warn handler,
//! or to `tracing` when none is installed.

use crate::component::Component;
use crate::config;

/// Emit a usage warning, optionally attributed to a component instance.
pub fn warn(message: impl AsRef<str>, vm: Option<&Component>) {
    let message = message.as_ref();
    let (silent, handler) = config::with(|c| (c.silent, c.warn_handler.clone()));
    let trace = vm.map(generate_component_trace).unwrap_or_default();

    if let Some(handler) = handler {
        handler(message, vm, &trace);
    } else if !silent {
        tracing::warn!(target: "vireo", trace = %trace, "{}", message);
    }
}

/// `<Name>` for named components, `<Root>` for the root, `<Anonymous>`
/// otherwise.
pub fn format_component_name(vm: &Component) -> String {
    if vm.parent().is_none() {
        return "<Root>".to_string();
    }
    let name = vm.def().name();
    if name.is_empty() {
        "<Anonymous>".to_string()
    } else {
        format!("<{name}>")
    }
}

/// The chain of component names from `vm` up to the root.
pub fn generate_component_trace(vm: &Component) -> String {
    let mut lines = Vec::new();
    let mut current = Some(vm.clone());
    while let Some(instance) = current {
        let indent = if lines.is_empty() {
            "---> ".to_string()
        } else {
            " ".repeat(5 + lines.len() * 2)
        };
        lines.push(format!("{indent}{}", format_component_name(&instance)));
        current = instance.parent();
    }
    format!("found in\n\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn warn_goes_to_installed_handler() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        config::update(|c| {
            c.warn_handler = Some(Rc::new(move |msg: &str, _vm: Option<&Component>, _trace: &str| {
                sink.borrow_mut().push(msg.to_string());
            }));
        });

        warn("first", None);
        warn(String::from("second"), None);

        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }
}
