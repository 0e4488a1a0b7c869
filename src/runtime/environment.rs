use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::runtime::Operand;

/// A lexical frame handle
///
/// Cloning shares the frame; closures keep their defining frame alive through
/// one of these handles, so later mutations are visible to them.
#[derive(Clone)]
pub struct Environment {
    frame: Rc<RefCell<Frame>>,
}

/// Non-owning frame handle; the interpreter keeps one per frame it creates
/// so that unreachable cycles can be found later
#[derive(Clone)]
pub struct WeakEnvironment {
    frame: Weak<RefCell<Frame>>,
}

impl WeakEnvironment {
    /// The frame, if anything still owns it
    pub fn upgrade(&self) -> Option<Environment> {
        self.frame.upgrade().map(|frame| Environment { frame })
    }

    /// True while the frame is alive
    pub fn is_live(&self) -> bool {
        self.frame.strong_count() > 0
    }
}

/// An outgoing reference held by a frame
pub(crate) enum FrameRef<'a> {
    Parent(&'a Environment),
    Value(&'a Operand),
}

/// Single frame in the environment chain
struct Frame {
    /// Bindings defined in this frame
    bindings: HashMap<String, Binding>,
    /// Lexically enclosing frame (None for the root)
    parent: Option<Environment>,
}

/// A bound value and its mutability
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Bound value
    pub value: Operand,
    /// True for `is` bindings
    pub constant: bool,
}

impl Environment {
    /// Creates a root frame
    pub fn new() -> Self {
        Environment {
            frame: Rc::new(RefCell::new(Frame {
                bindings: HashMap::new(),
                parent: None,
            })),
        }
    }

    /// Creates an empty frame whose parent is `self`
    pub fn child(&self) -> Self {
        Environment {
            frame: Rc::new(RefCell::new(Frame {
                bindings: HashMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    /// Parent frame, if any
    pub fn parent(&self) -> Option<Environment> {
        self.frame.borrow().parent.clone()
    }

    /// Defines (or replaces) a mutable binding in this frame
    pub fn define(&self, name: impl Into<String>, value: Operand) {
        self.insert(name.into(), value, false);
    }

    /// Defines a constant in this frame without consulting the chain
    ///
    /// Used for host injection and interpreter setup; `is` goes through
    /// [`Environment::bind_constant`].
    pub fn define_constant(&self, name: impl Into<String>, value: Operand) {
        self.insert(name.into(), value, true);
    }

    fn insert(&self, name: String, value: Operand, constant: bool) {
        self.frame
            .borrow_mut()
            .bindings
            .insert(name, Binding { value, constant });
    }

    /// `name is value`: fails if `name` is visible anywhere in the chain
    pub fn bind_constant(&self, name: &str, value: Operand) -> Result<()> {
        if let Some(existing) = self.lookup_binding(name) {
            let message = if existing.constant {
                format!("'{}' is a constant binding in this environment.", name)
            } else {
                format!("'{}' is already bound in this environment.", name)
            };
            return Err(Error::binding(name, message));
        }
        self.define_constant(name, value);
        Ok(())
    }

    /// `name <- value`: rebinds the nearest mutable binding or creates one here
    ///
    /// A rebinding keeps the type of the existing value; integers widen to
    /// reals and scalars convert to strings when that is the bound type.
    pub fn assign(&self, name: &str, value: Operand) -> Result<()> {
        let mut scope = Some(self.clone());
        while let Some(env) = scope {
            {
                let mut frame = env.frame.borrow_mut();
                if let Some(binding) = frame.bindings.get_mut(name) {
                    if binding.constant {
                        return Err(Error::binding(
                            name,
                            format!("'{}' is a constant binding in this environment.", name),
                        ));
                    }
                    let bound_type = binding.value.type_of();
                    let converted = value.convert_for_binding(bound_type).ok_or_else(|| {
                        Error::binding(
                            name,
                            format!(
                                "The type of the value ({}) is not compatible with the bound type of {}.",
                                value.type_name(),
                                name
                            ),
                        )
                    })?;
                    binding.value = converted;
                    return Ok(());
                }
            }
            scope = env.parent();
        }
        self.define(name, value);
        Ok(())
    }

    /// Looks `name` up through the chain
    pub fn lookup(&self, name: &str) -> Option<Operand> {
        self.lookup_binding(name).map(|b| b.value)
    }

    /// Looks `name` up through the chain, failing if it is unbound
    pub fn get(&self, name: &str) -> Result<Operand> {
        self.lookup(name).ok_or_else(|| Error::UndefinedVariable {
            name: name.to_string(),
        })
    }

    /// Looks up the full binding (value and mutability)
    pub fn lookup_binding(&self, name: &str) -> Option<Binding> {
        let mut scope = Some(self.clone());
        while let Some(env) = scope {
            if let Some(binding) = env.frame.borrow().bindings.get(name) {
                return Some(binding.clone());
            }
            scope = env.parent();
        }
        None
    }

    /// True if `name` is bound in this frame only
    pub fn is_local(&self, name: &str) -> bool {
        self.frame.borrow().bindings.contains_key(name)
    }

    /// True if `name` is bound as a constant in this frame only
    pub fn is_local_constant(&self, name: &str) -> bool {
        self.frame
            .borrow()
            .bindings
            .get(name)
            .is_some_and(|b| b.constant)
    }

    /// True if `name` is visible from this frame
    pub fn exists(&self, name: &str) -> bool {
        self.lookup_binding(name).is_some()
    }

    /// Number of frames from here to the root, inclusive
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut scope = self.parent();
        while let Some(env) = scope {
            depth += 1;
            scope = env.parent();
        }
        depth
    }

    /// Names bound in this frame, sorted
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.frame.borrow().bindings.keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot of every visible binding; inner frames shadow outer ones
    pub fn snapshot(&self) -> HashMap<String, Operand> {
        let mut frames = Vec::new();
        let mut scope = Some(self.clone());
        while let Some(env) = scope {
            scope = env.parent();
            frames.push(env);
        }

        let mut result = HashMap::new();
        for env in frames.iter().rev() {
            for (name, binding) in env.frame.borrow().bindings.iter() {
                result.insert(name.clone(), binding.value.clone());
            }
        }
        result
    }

    /// Removes every binding in this frame
    ///
    /// Closures stored in a frame they also capture form an `Rc` cycle; the
    /// interpreter clears its own frames on drop to release them.
    pub fn clear(&self) {
        self.frame.borrow_mut().bindings.clear();
    }

    /// Weak handle to this frame
    pub fn downgrade(&self) -> WeakEnvironment {
        WeakEnvironment {
            frame: Rc::downgrade(&self.frame),
        }
    }

    /// Address of the shared frame, stable for its lifetime
    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.frame) as *const () as usize
    }

    /// Number of handles sharing this frame
    pub(crate) fn strong_count(&self) -> usize {
        Rc::strong_count(&self.frame)
    }

    /// Visits the parent link and every bound value
    pub(crate) fn for_each_reference(&self, mut visit: impl FnMut(FrameRef<'_>)) {
        let frame = self.frame.borrow();
        if let Some(parent) = &frame.parent {
            visit(FrameRef::Parent(parent));
        }
        for binding in frame.bindings.values() {
            visit(FrameRef::Value(&binding.value));
        }
    }

    /// Empties the frame and hands the bindings back so they can be dropped
    /// after the borrow ends
    pub(crate) fn take_bindings(&self) -> HashMap<String, Binding> {
        std::mem::take(&mut self.frame.borrow_mut().bindings)
    }

    /// Identity comparison of frames
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.frame, &other.frame)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.local_names())
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_lookup() {
        let env = Environment::new();
        env.define("X", Operand::Integer(42));
        assert_eq!(env.get("X").unwrap(), Operand::Integer(42));
        assert!(env.get("Y").is_err());
    }

    #[test]
    fn test_child_sees_parent() {
        let env = Environment::new();
        env.define("X", Operand::Integer(42));
        let child = env.child();
        assert_eq!(child.get("X").unwrap(), Operand::Integer(42));
        assert_eq!(child.depth(), 2);
    }

    #[test]
    fn test_shadowing() {
        let env = Environment::new();
        env.define("X", Operand::Integer(1));
        let child = env.child();
        child.define("X", Operand::Integer(2));
        assert_eq!(child.get("X").unwrap(), Operand::Integer(2));
        assert_eq!(env.get("X").unwrap(), Operand::Integer(1));
    }

    #[test]
    fn test_assign_rebinds_where_found() {
        let env = Environment::new();
        env.define("COUNT", Operand::Integer(10));
        let child = env.child();
        child.assign("COUNT", Operand::Integer(11)).unwrap();
        assert!(!child.is_local("COUNT"));
        assert_eq!(env.get("COUNT").unwrap(), Operand::Integer(11));
    }

    #[test]
    fn test_assign_creates_locally_when_unbound() {
        let env = Environment::new();
        let child = env.child();
        child.assign("Y", Operand::Integer(1)).unwrap();
        assert!(child.is_local("Y"));
        assert!(!env.exists("Y"));
    }

    #[test]
    fn test_assign_to_constant_fails() {
        let env = Environment::new();
        env.bind_constant("X", Operand::Integer(12)).unwrap();
        let err = env.assign("X", Operand::Integer(13)).unwrap_err();
        assert!(matches!(err, Error::BindingError { .. }));
        assert_eq!(env.get("X").unwrap(), Operand::Integer(12));
    }

    #[test]
    fn test_constant_requires_unbound_name() {
        let env = Environment::new();
        env.define("X", Operand::Integer(1));
        let child = env.child();
        assert!(child.bind_constant("X", Operand::Integer(2)).is_err());
        assert!(child.bind_constant("Y", Operand::Integer(2)).is_ok());
        assert!(child.is_local_constant("Y"));
    }

    #[test]
    fn test_assign_keeps_bound_type() {
        let env = Environment::new();
        env.define("R", Operand::Real(1.5));
        env.assign("R", Operand::Integer(2)).unwrap();
        assert_eq!(env.get("R").unwrap(), Operand::Real(2.0));
        assert!(env.assign("R", Operand::string("x")).is_err());
    }

    #[test]
    fn test_snapshot_prefers_inner() {
        let env = Environment::new();
        env.define("A", Operand::Integer(1));
        env.define("B", Operand::Integer(2));
        let child = env.child();
        child.define("A", Operand::Integer(3));
        let snap = child.snapshot();
        assert_eq!(snap.get("A"), Some(&Operand::Integer(3)));
        assert_eq!(snap.get("B"), Some(&Operand::Integer(2)));
    }
}
