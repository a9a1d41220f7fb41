use std::fmt;

use expense_domain::ExpenseFilter;

/// Change notifications delivered to subscribers after each effective mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Added { id: String },
    Updated { id: String },
    Deleted { id: String },
    FilterChanged(ExpenseFilter),
    Loaded { count: usize },
}

/// Handle returned by [`ExpenseStore::subscribe`](crate::ExpenseStore::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type Callback = Box<dyn FnMut(&StoreEvent) + Send>;

#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(SubscriptionId, Callback)>,
}

impl ObserverRegistry {
    pub(crate) fn subscribe(&mut self, callback: Callback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.observers.push((id, callback));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Calls subscribers in registration order.
    pub(crate) fn notify(&mut self, event: &StoreEvent) {
        for (_, callback) in self.observers.iter_mut() {
            callback(event);
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("subscribers", &self.observers.len())
            .finish()
    }
}
