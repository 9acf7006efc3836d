//! LIFO dispose bag.

/// Release hooks tracked by a scope, run in reverse push order on disposal.
#[derive(Default)]
pub(crate) struct DisposeBag {
    hooks: Vec<Box<dyn FnOnce() + Send>>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, hook: Box<dyn FnOnce() + Send>) {
        self.hooks.push(hook);
    }

    /// Runs all hooks, most recently pushed first, draining the bag.
    pub(crate) fn run_reverse(&mut self) {
        while let Some(hook) = self.hooks.pop() {
            hook();
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.hooks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn runs_in_reverse_order_and_drains() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut bag = DisposeBag::default();
        for i in 0..3 {
            let order = order.clone();
            bag.push(Box::new(move || order.lock().unwrap().push(i)));
        }
        bag.run_reverse();
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
        assert_eq!(bag.len(), 0);
        bag.run_reverse();
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }
}
