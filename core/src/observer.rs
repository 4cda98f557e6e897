//! Change notifications for the state containers.

/// Shown by the host as a blocking dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

/// What a subscriber is told after an operation.
#[derive(Debug)]
pub enum Notification<'a, S> {
    /// The state transitioned; carries the new snapshot.
    Changed(&'a S),
    /// An operation failed without touching the state.
    Alert(&'a Alert),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<S> = Box<dyn FnMut(&Notification<'_, S>)>;

/// Subscriber list owned by a state container.
pub struct Subscribers<S> {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback<S>)>,
}

impl<S> Default for Subscribers<S> {
    fn default() -> Self {
        Self {
            next_id: 0,
            callbacks: Vec::new(),
        }
    }
}

impl<S> std::fmt::Debug for Subscribers<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

impl<S> Subscribers<S> {
    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&Notification<'_, S>) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sub, _)| *sub != id);
        self.callbacks.len() != before
    }

    pub fn changed(&mut self, state: &S) {
        self.emit(&Notification::Changed(state));
    }

    pub fn alert(&mut self, alert: &Alert) {
        self.emit(&Notification::Alert(alert));
    }

    fn emit(&mut self, notification: &Notification<'_, S>) {
        for (_, callback) in self.callbacks.iter_mut() {
            callback(notification);
        }
    }
}
