//! Observer types for the traversal.
//!
//! An observer is told about each value the moment it becomes eligible for
//! evaluation. It is the only way the traversal reports its order.

/// Receives values in dependency order.
///
/// `evaluating` is called exactly once per value, synchronously. The graph
/// does not consider a value evaluated until the call returns, so for every
/// edge `A -> B` the call for `A` has finished before the call for `B` starts.
pub trait Observer<T> {
    /// Called when `value` has all of its prerequisites evaluated.
    fn evaluating(&mut self, value: &T);
}

impl<T, F> Observer<T> for F
where
    F: FnMut(&T),
{
    fn evaluating(&mut self, value: &T) {
        (*self)(value)
    }
}

/// An observer that keeps a copy of every value it is handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorder<T> {
    order: Vec<T>,
}

impl<T> Recorder<T> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self { order: Vec::new() }
    }

    /// Values seen so far, in notification order.
    pub fn order(&self) -> &[T] {
        &self.order
    }

    /// Consume the recorder, returning the recorded order.
    pub fn into_order(self) -> Vec<T> {
        self.order
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Observer<T> for Recorder<T> {
    fn evaluating(&mut self, value: &T) {
        self.order.push(value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_observers() {
        let mut seen = Vec::new();
        {
            let mut observer = |value: &u8| seen.push(*value);
            observer.evaluating(&1);
            observer.evaluating(&2);
        }
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn recorder_keeps_notification_order() {
        let mut recorder = Recorder::new();
        recorder.evaluating(&"fetch");
        recorder.evaluating(&"build");

        assert_eq!(recorder.order(), &["fetch", "build"]);
        assert_eq!(recorder.into_order(), vec!["fetch", "build"]);
    }
}
