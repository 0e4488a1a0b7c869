//! Cycle collection for call and host frames
//!
//! A named function defined inside a call stores its closure in the call's own
//! frame, and the closure captures that frame, so reference counting alone never
//! frees either. The collector keeps a weak handle to every frame the
//! interpreter creates. A collection first discovers the graph of frames,
//! closures and lists reachable from those frames. References found inside the
//! graph are subtracted from each node's strong count, and whatever is left
//! over is held from outside (the host, the Rust stack, the interpreter's own
//! frames). Those nodes are the roots. Tracked frames not reachable from a root
//! only keep each other alive; their bindings are dropped, which breaks the
//! cycles.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::debug;

use crate::runtime::environment::{Environment, FrameRef, WeakEnvironment};
use crate::runtime::value::{Closure, Function, Operand};

/// Live frames below this count never trigger an automatic collection
const MIN_THRESHOLD: usize = 256;

/// Weak handles to the frames created by an interpreter
pub(crate) struct FrameTracker {
    frames: Vec<WeakEnvironment>,
    /// Tracked handles (live or dead) before dead ones are pruned
    prune_at: usize,
    /// Live frames before `maybe_collect` runs a collection
    collect_at: usize,
}

impl FrameTracker {
    pub(crate) fn new() -> Self {
        FrameTracker {
            frames: Vec::new(),
            prune_at: MIN_THRESHOLD,
            collect_at: MIN_THRESHOLD,
        }
    }

    pub(crate) fn track(&mut self, env: &Environment) {
        self.frames.push(env.downgrade());
        if self.frames.len() >= self.prune_at {
            self.prune();
            self.prune_at = (self.frames.len() * 2).max(MIN_THRESHOLD);
        }
    }

    /// Collects once enough frames survive that cycles are likely
    pub(crate) fn maybe_collect(&mut self) -> usize {
        if self.frames.len() < self.collect_at {
            return 0;
        }
        self.prune();
        if self.frames.len() < self.collect_at {
            return 0;
        }
        let released = self.collect();
        self.collect_at = (self.frames.len() * 2).max(MIN_THRESHOLD);
        released
    }

    /// Releases every tracked frame that is reachable only from other garbage.
    /// Returns the number of frames released.
    pub(crate) fn collect(&mut self) -> usize {
        self.prune();

        let mut graph = Graph::default();
        let mut tracked = Vec::with_capacity(self.frames.len());
        for weak in &self.frames {
            if let Some(env) = weak.upgrade() {
                tracked.push(graph.discover(Node::Frame(env)));
            }
        }
        graph.count_internal_references();
        let marked = graph.mark_from_roots();

        let mut garbage = Vec::new();
        for index in tracked {
            if marked[index] {
                continue;
            }
            if let Node::Frame(env) = &graph.nodes[index] {
                garbage.push(env.take_bindings());
            }
        }
        let released = garbage.len();
        // Bindings drop only after every frame borrow above has ended
        drop(garbage);
        drop(graph);

        self.prune();
        if released > 0 {
            debug!(released, live = self.frames.len(), "collected frame cycles");
        }
        released
    }

    fn prune(&mut self) {
        self.frames.retain(WeakEnvironment::is_live);
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.frames.len()
    }
}

/// Shared allocation that can take part in a cycle
enum Node {
    Frame(Environment),
    Closure(Rc<Closure>),
    List(Rc<Vec<Operand>>),
}

impl Node {
    fn id(&self) -> usize {
        match self {
            Node::Frame(env) => env.id(),
            Node::Closure(closure) => Rc::as_ptr(closure) as *const () as usize,
            Node::List(list) => Rc::as_ptr(list) as *const () as usize,
        }
    }

    fn strong_count(&self) -> usize {
        match self {
            Node::Frame(env) => env.strong_count(),
            Node::Closure(closure) => Rc::strong_count(closure),
            Node::List(list) => Rc::strong_count(list),
        }
    }

    fn of_operand(value: &Operand) -> Option<Node> {
        match value {
            Operand::List(list) => Some(Node::List(list.clone())),
            Operand::Function(Function::Closure(closure)) => Some(Node::Closure(closure.clone())),
            _ => None,
        }
    }

    /// Visits the nodes this node holds a strong reference to
    fn for_each_child(&self, mut visit: impl FnMut(Node)) {
        match self {
            Node::Frame(env) => env.for_each_reference(|reference| match reference {
                FrameRef::Parent(parent) => visit(Node::Frame(parent.clone())),
                FrameRef::Value(value) => {
                    if let Some(node) = Node::of_operand(value) {
                        visit(node)
                    }
                }
            }),
            Node::Closure(closure) => visit(Node::Frame(closure.env.clone())),
            Node::List(list) => {
                for value in list.iter() {
                    if let Some(node) = Node::of_operand(value) {
                        visit(node)
                    }
                }
            }
        }
    }
}

#[derive(Default)]
struct Graph {
    nodes: Vec<Node>,
    index: HashMap<usize, usize>,
    /// Strong count of each node less the graph's own handle
    strong: Vec<usize>,
    /// References to each node held by other nodes in the graph
    internal: Vec<usize>,
    edges: Vec<Vec<usize>>,
}

impl Graph {
    /// Adds `node` unless already present; returns its index
    fn discover(&mut self, node: Node) -> usize {
        let id = node.id();
        if let Some(&index) = self.index.get(&id) {
            return index;
        }
        let index = self.nodes.len();
        self.strong.push(node.strong_count().saturating_sub(1));
        self.internal.push(0);
        self.edges.push(Vec::new());
        self.nodes.push(node);
        self.index.insert(id, index);
        index
    }

    /// Walks outwards from the tracked frames, recording every edge. A new
    /// node's strong count is read once the extra handles collected for it
    /// have been dropped, so only the graph's own handle remains.
    fn count_internal_references(&mut self) {
        let mut next = 0;
        while next < self.nodes.len() {
            let mut children = Vec::new();
            self.nodes[next].for_each_child(|child| children.push(child));

            let mut targets = Vec::with_capacity(children.len());
            let mut fresh = Vec::new();
            let mut pending = HashSet::new();
            for child in children {
                let id = child.id();
                targets.push(id);
                if !self.index.contains_key(&id) && pending.insert(id) {
                    fresh.push(child);
                }
            }
            for node in fresh {
                self.discover(node);
            }
            for id in targets {
                if let Some(&target) = self.index.get(&id) {
                    self.internal[target] += 1;
                    self.edges[next].push(target);
                }
            }
            next += 1;
        }
    }

    fn mark_from_roots(&self) -> Vec<bool> {
        let mut marked = vec![false; self.nodes.len()];
        let mut worklist: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.strong[i] > self.internal[i])
            .collect();
        while let Some(index) = worklist.pop() {
            if marked[index] {
                continue;
            }
            marked[index] = true;
            worklist.extend(self.edges[index].iter().filter(|&&t| !marked[t]));
        }
        marked
    }
}
