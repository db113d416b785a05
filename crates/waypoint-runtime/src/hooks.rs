// hooks.rs — Handler trait and the name-keyed hook registry.
//
// A hook is an opaque handler invoked once per ready goal per tick, in
// registration order. Every registered hook runs for every ready goal —
// there is no per-goal hook selection. A hook returning an error fails
// that specific goal; it never aborts the tick or affects other goals.

use waypoint_graph::Goal;

/// A hook handler: one read view of a goal in, unit or error out.
///
/// One function-type interface instead of duck-typed callables of
/// varying shapes — there is exactly one calling convention.
pub trait Handler: Send + Sync {
    fn on_goal(&self, goal: &Goal) -> anyhow::Result<()>;
}

/// Closures with the right shape are handlers.
impl<F> Handler for F
where
    F: Fn(&Goal) -> anyhow::Result<()> + Send + Sync,
{
    fn on_goal(&self, goal: &Goal) -> anyhow::Result<()> {
        self(goal)
    }
}

/// A named, ordered collection of hooks.
///
/// Registration order is invocation order. Re-registering a name
/// replaces the handler but keeps its original position.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<(String, Box<dyn Handler>)>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Register a handler under a name.
    pub fn register(&mut self, name: impl Into<String>, handler: impl Handler + 'static) {
        let name = name.into();
        if let Some(slot) = self.hooks.iter_mut().find(|(n, _)| *n == name) {
            tracing::debug!(hook = %name, "replacing existing hook");
            slot.1 = Box::new(handler);
        } else {
            self.hooks.push((name, Box::new(handler)));
        }
    }

    /// Hooks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Handler)> {
        self.hooks.iter().map(|(n, h)| (n.as_str(), h.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
