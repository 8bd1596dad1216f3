//! Components, elements and the per-render context

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::context::{Context, ContextId};
use super::state::{Scheduler, StateSetter, StateSlot};
use crate::State;

/// A node of the component tree.
///
/// `render` runs on every render pass. It may read contexts, allocate state
/// cells and publish context values for its children; the children
/// themselves are rendered by the host afterwards, unchanged.
pub trait Component {
    fn render(&self, cx: &mut RenderCx<'_>) -> anyhow::Result<()>;

    /// Name used in trace output
    fn name(&self) -> &str {
        "component"
    }
}

struct FnComponent<F>(F);

impl<F> Component for FnComponent<F>
where
    F: Fn(&mut RenderCx<'_>) -> anyhow::Result<()>,
{
    fn render(&self, cx: &mut RenderCx<'_>) -> anyhow::Result<()> {
        (self.0)(cx)
    }

    fn name(&self) -> &str {
        "consumer"
    }
}

/// A component together with its children.
#[derive(Clone)]
pub struct Element {
    pub(crate) component: Rc<dyn Component>,
    pub(crate) children: Vec<Element>,
}

impl Element {
    pub fn new(component: impl Component + 'static) -> Self {
        Self {
            component: Rc::new(component),
            children: Vec::new(),
        }
    }

    /// Element backed by a render closure.
    ///
    /// # Example
    /// ```ignore
    /// let consumer = Element::consumer(move |cx| {
    ///     let store = cx.use_context(&counter);
    ///     println!("count = {}", store.count);
    ///     Ok(())
    /// });
    /// ```
    pub fn consumer<F>(render: F) -> Self
    where
        F: Fn(&mut RenderCx<'_>) -> anyhow::Result<()> + 'static,
    {
        Self::new(FnComponent(render))
    }

    /// Append a child
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("component", &self.component.name())
            .field("children", &self.children)
            .finish()
    }
}

/// Context values visible at the current tree position, innermost last.
pub(crate) type Scope = Vec<(ContextId, Rc<dyn Any>)>;

/// Hook storage of one tree node, persisted across renders.
#[derive(Default)]
pub(crate) struct HookState {
    slots: Vec<Rc<dyn Any>>,
    cursor: usize,
}

impl HookState {
    pub(crate) fn rewind(&mut self) {
        self.cursor = 0;
    }
}

/// Capabilities available to a component while it renders.
pub struct RenderCx<'a> {
    pub(crate) scope: &'a [(ContextId, Rc<dyn Any>)],
    pub(crate) hooks: &'a mut HookState,
    pub(crate) scheduler: &'a Rc<Scheduler>,
    pub(crate) provided: Vec<(ContextId, Rc<dyn Any>)>,
    pub(crate) path: &'a [usize],
}

impl<'a> RenderCx<'a> {
    /// Position of the rendering node in the tree (child indices from the root)
    pub fn path(&self) -> &[usize] {
        self.path
    }

    /// Read a context and subscribe this render to it.
    ///
    /// Returns the value published by the nearest enclosing provider, or the
    /// context's default value.
    pub fn use_context<T: 'static>(&mut self, context: &Context<T>) -> Rc<T> {
        self.scope
            .iter()
            .rev()
            .find(|(id, _)| *id == context.id())
            .and_then(|(_, value)| Rc::clone(value).downcast::<T>().ok())
            .unwrap_or_else(|| context.default_value())
    }

    /// Allocate (first render) or fetch (later renders) a state cell.
    ///
    /// Cells are identified by call order within the component, so a
    /// component must call `use_state` the same number of times on every
    /// render.
    pub fn use_state<S: State>(&mut self, init: impl FnOnce() -> S) -> (Rc<S>, StateSetter<S>) {
        let index = self.hooks.cursor;
        self.hooks.cursor += 1;

        let existing = self
            .hooks
            .slots
            .get(index)
            .and_then(|slot| Rc::clone(slot).downcast::<StateSlot<S>>().ok());

        let slot = match existing {
            Some(slot) => slot,
            None => {
                let slot = Rc::new(StateSlot::new(init()));
                if index < self.hooks.slots.len() {
                    tracing::warn!(
                        path = ?self.path,
                        index,
                        "state cell changed type between renders; reinitializing"
                    );
                    self.hooks.slots[index] = Rc::clone(&slot) as Rc<dyn Any>;
                } else {
                    self.hooks.slots.push(Rc::clone(&slot) as Rc<dyn Any>);
                }
                slot
            }
        };

        let setter = StateSetter::new(Rc::clone(&slot), Rc::downgrade(self.scheduler));
        (slot.current(), setter)
    }

    /// Publish a value of `context` to this component's children.
    pub fn provide<T: 'static>(&mut self, context: &Context<T>, value: T) {
        self.provided
            .push((context.id(), Rc::new(value) as Rc<dyn Any>));
    }
}
