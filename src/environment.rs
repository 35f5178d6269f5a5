use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::object::Object;

/// A lexical scope: bindings plus a link to the enclosing scope.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Environment {
    store: BTreeMap<String, Object>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            store: BTreeMap::new(),
            outer: None,
        }
    }

    pub fn new_enclosed(outer: Rc<RefCell<Environment>>) -> Self {
        Environment {
            store: BTreeMap::new(),
            outer: Some(outer),
        }
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.get(name) {
            Some(obj) => Some(obj.clone()),
            None => match &self.outer {
                Some(outer) => outer.borrow().get(name),
                None => None,
            },
        }
    }

    pub fn set(&mut self, name: String, value: Object) {
        self.store.insert(name, value);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::environment::Environment;
    use crate::object::Object;

    #[test]
    fn test_enclosed_lookup() {
        let mut outer = Environment::new();
        outer.set("a".to_string(), Object::Integer(1));
        let outer = Rc::new(RefCell::new(outer));

        let mut inner = Environment::new_enclosed(Rc::clone(&outer));
        inner.set("b".to_string(), Object::Integer(2));

        assert_eq!(inner.get("a"), Some(Object::Integer(1)));
        assert_eq!(inner.get("b"), Some(Object::Integer(2)));
        assert_eq!(inner.get("c"), None);
        assert_eq!(outer.borrow().get("b"), None);
    }

    #[test]
    fn test_shadowing() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer
            .borrow_mut()
            .set("x".to_string(), Object::Integer(10));

        let mut inner = Environment::new_enclosed(Rc::clone(&outer));
        inner.set("x".to_string(), Object::Integer(20));

        assert_eq!(inner.get("x"), Some(Object::Integer(20)));
        assert_eq!(outer.borrow().get("x"), Some(Object::Integer(10)));
    }
}
