//! Registration map from controls to panel actions.

use std::collections::HashMap;

use super::control::{Control, ElementData};
use crate::error::PanelError;

/// Action run when a control is clicked.
pub type Action<P> = fn(&mut P, &ElementData) -> Result<(), PanelError>;

pub struct Bindings<P> {
    actions: HashMap<Control, Action<P>>,
}

impl<P> Bindings<P> {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Binds `action` to `control`, replacing any earlier binding.
    pub fn bind(&mut self, control: Control, action: Action<P>) {
        if self.actions.insert(control, action).is_some() {
            tracing::debug!("Rebound control {}", control);
        }
    }

    pub fn unbind(&mut self, control: Control) {
        self.actions.remove(&control);
    }

    pub fn get(&self, control: Control) -> Option<Action<P>> {
        self.actions.get(&control).copied()
    }

    pub fn is_bound(&self, control: Control) -> bool {
        self.actions.contains_key(&control)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<P> Default for Bindings<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        clicks: usize,
    }

    fn increment(counter: &mut Counter, _: &ElementData) -> Result<(), PanelError> {
        counter.clicks += 1;
        Ok(())
    }

    #[test]
    fn test_bound_action_runs() {
        let mut bindings = Bindings::new();
        bindings.bind(Control::PlayAudio, increment as Action<Counter>);

        let mut counter = Counter::default();
        let action = bindings.get(Control::PlayAudio).unwrap();
        action(&mut counter, &ElementData::new()).unwrap();
        assert_eq!(counter.clicks, 1);

        assert!(bindings.get(Control::StopAudio).is_none());
        bindings.unbind(Control::PlayAudio);
        assert!(bindings.is_empty());
    }
}
