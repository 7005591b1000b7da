use core::fmt;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{error::PhonkError, interpreter::Value};


struct Frame {
    bindings: RefCell<HashMap<Rc<str>, Value>>,
    parent: Option<Environment>,
}

/// A chain of frames, innermost first. Cloning an environment shares the
/// frames; closures keep their defining chain alive this way.
///
/// A closure stored into the frame it captures keeps that frame alive
/// forever. The prelude's `sqrt` and `cached` do this on every call, so
/// each call leaks one frame until [`EvaluationContext`] is dropped, and
/// even then only the global frame is released.
///
/// [`EvaluationContext`]: crate::EvaluationContext
#[derive(Clone)]
pub struct Environment(Rc<Frame>);

impl Environment {
    /// A chain consisting of a single outermost frame.
    pub fn root(bindings: HashMap<Rc<str>, Value>) -> Self {
        Self(Rc::new(Frame {
            bindings: RefCell::new(bindings),
            parent: None,
        }))
    }

    /// Returns a new chain with a fresh frame holding `bindings` in front of
    /// this one. The existing chain is shared, never modified.
    pub fn extend(&self, bindings: impl IntoIterator<Item = (Rc<str>, Value)>) -> Self {
        Self(Rc::new(Frame {
            bindings: RefCell::new(bindings.into_iter().collect()),
            parent: Some(self.clone()),
        }))
    }

    /// Finds the first binding of `name`, scanning frames front to back.
    pub fn lookup(&self, name: &str) -> Result<Value, PhonkError> {
        let mut environment = Some(self);

        while let Some(current) = environment {
            if let Some(value) = current.0.bindings.borrow().get(name) {
                return Ok(value.clone());
            }
            environment = current.0.parent.as_ref();
        }

        Err(PhonkError::NameError(name.to_owned()))
    }

    /// Binds `name` in the frontmost frame only, replacing any previous
    /// binding there. Enclosing frames are never touched.
    pub fn define(&self, name: impl Into<Rc<str>>, value: Value) {
        self.0.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Number of frames in the chain.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut parent = self.0.parent.as_ref();
        while let Some(environment) = parent {
            depth += 1;
            parent = environment.0.parent.as_ref();
        }
        depth
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // Closures stored in a frame hold that frame alive; emptying the frame
    // releases them.
    pub(crate) fn clear(&self) {
        let bindings = std::mem::take(&mut *self.0.bindings.borrow_mut());
        drop(bindings);
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.0.bindings.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("front", &names)
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Weak;

    use crate::{error::ErrorKind, interpreter::evaluate, parser::parse};

    use super::*;

    fn global() -> Environment {
        Environment::root(HashMap::from([("x".into(), Value::Integer(1))])).extend([])
    }

    #[test]
    fn lookup_scans_front_to_back() -> anyhow::Result<()> {
        let environment = global();
        let local = environment.extend([("x".into(), Value::Integer(2)), ("y".into(), Value::Integer(3))]);

        assert_eq!(local.lookup("x")?, Value::Integer(2));
        assert_eq!(local.lookup("y")?, Value::Integer(3));
        assert_eq!(environment.lookup("x")?, Value::Integer(1));
        assert_eq!(local.depth(), 3);
        Ok(())
    }

    #[test]
    fn unbound_names_are_name_errors() {
        let error = global().lookup("missing").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Name);
        assert_eq!(error, PhonkError::NameError("missing".to_owned()));
    }

    #[test]
    fn define_only_touches_front_frame() -> anyhow::Result<()> {
        let environment = global();
        let local = environment.extend([]);

        local.define("x", Value::Integer(10));
        assert_eq!(local.lookup("x")?, Value::Integer(10));
        assert_eq!(environment.lookup("x")?, Value::Integer(1));

        environment.define("z", Value::Integer(5));
        assert_eq!(local.lookup("z")?, Value::Integer(5));
        Ok(())
    }

    #[test]
    fn sibling_extensions_do_not_interfere() -> anyhow::Result<()> {
        let environment = global();
        let a = environment.extend([("n".into(), Value::Integer(1))]);
        let b = environment.extend([("n".into(), Value::Integer(2))]);

        a.define("m", Value::Integer(7));
        assert_eq!(a.lookup("n")?, Value::Integer(1));
        assert_eq!(b.lookup("n")?, Value::Integer(2));
        assert!(b.lookup("m").is_err());
        assert!(!a.ptr_eq(&b));
        Ok(())
    }

    #[test]
    fn closure_stored_in_its_own_frame_keeps_it_alive() -> anyhow::Result<()> {
        let environment = global();
        let local = environment.extend([]);
        let frame: Weak<Frame> = Rc::downgrade(&local.0);

        evaluate(&parse("(sto helper (phonk () x))")?, &local)?;
        drop(local);
        let leaked = frame.upgrade().map(Environment);
        assert!(leaked.is_some());

        // Emptying the frame breaks the cycle
        if let Some(local) = leaked {
            local.clear();
        }
        assert!(frame.upgrade().is_none());
        Ok(())
    }
}
