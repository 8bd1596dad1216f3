//! Mounting a tree and running render passes

use std::collections::HashMap;
use std::rc::Rc;

use super::element::{Element, HookState, RenderCx, Scope};
use super::state::Scheduler;
use crate::error::StoreError;

/// Configuration for the render loop.
#[derive(Debug, Clone, Copy)]
pub struct HostConfig {
    /// Render passes [`Root::flush`] may run before giving up on a tree
    /// that keeps scheduling changing updates. Must be at least 1.
    pub max_render_passes: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_render_passes: 50,
        }
    }
}

/// A mounted component tree.
///
/// Owns every state cell of the tree. Dropping (or [`Root::unmount`]ing) it
/// destroys them; setters still held by actions become no-ops.
pub struct Root {
    tree: Element,
    nodes: HashMap<Vec<usize>, HookState>,
    scheduler: Rc<Scheduler>,
    config: HostConfig,
    render_count: u64,
}

impl Root {
    /// Mount `tree` with the default [`HostConfig`].
    ///
    /// Renders once, then flushes any updates scheduled during that render.
    pub fn mount(tree: Element) -> anyhow::Result<Self> {
        Self::mount_with_config(tree, HostConfig::default())
    }

    /// Mount `tree` with an explicit [`HostConfig`].
    ///
    /// Fails with [`StoreError::NoRenderPasses`] if `max_render_passes` is 0,
    /// since no update could ever be rendered.
    pub fn mount_with_config(tree: Element, config: HostConfig) -> anyhow::Result<Self> {
        if config.max_render_passes == 0 {
            return Err(StoreError::NoRenderPasses.into());
        }
        let mut root = Self {
            tree,
            nodes: HashMap::new(),
            scheduler: Rc::new(Scheduler::default()),
            config,
            render_count: 0,
        };
        tracing::debug!("mounting tree");
        root.render()?;
        root.flush()?;
        Ok(root)
    }

    /// Commit scheduled state updates and re-render until the tree settles.
    ///
    /// Returns the number of render passes that ran. Fails with
    /// [`StoreError::RenderLimit`] if the tree is still changing after
    /// [`HostConfig::max_render_passes`] passes.
    pub fn flush(&mut self) -> anyhow::Result<usize> {
        let mut passes = 0;
        loop {
            if !self.scheduler.commit_all() {
                return Ok(passes);
            }
            if passes == self.config.max_render_passes {
                tracing::warn!(passes, "render loop did not settle");
                return Err(StoreError::RenderLimit(passes).into());
            }
            self.render()?;
            passes += 1;
        }
    }

    /// Whether state updates are waiting for [`Root::flush`]
    pub fn has_pending_updates(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Total render passes since mount
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Destroy the tree and its state cells.
    pub fn unmount(self) {}

    fn render(&mut self) -> anyhow::Result<()> {
        self.render_count += 1;
        tracing::trace!(pass = self.render_count, "render");
        let mut scope = Scope::new();
        let mut path = Vec::new();
        render_element(
            &self.tree,
            &mut path,
            &mut scope,
            &mut self.nodes,
            &self.scheduler,
        )
    }
}

impl Drop for Root {
    fn drop(&mut self) {
        tracing::debug!("unmounting tree");
        self.scheduler.mark_unmounted();
    }
}

fn render_element(
    element: &Element,
    path: &mut Vec<usize>,
    scope: &mut Scope,
    nodes: &mut HashMap<Vec<usize>, HookState>,
    scheduler: &Rc<Scheduler>,
) -> anyhow::Result<()> {
    let provided = {
        let hooks = nodes.entry(path.clone()).or_default();
        hooks.rewind();
        let mut cx = RenderCx {
            scope: scope.as_slice(),
            hooks,
            scheduler,
            provided: Vec::new(),
            path: path.as_slice(),
        };
        element.component.render(&mut cx)?;
        cx.provided
    };

    let depth = scope.len();
    scope.extend(provided);
    for (index, child) in element.children.iter().enumerate() {
        path.push(index);
        let result = render_element(child, path, scope, nodes, scheduler);
        path.pop();
        result?;
    }
    scope.truncate(depth);
    Ok(())
}
