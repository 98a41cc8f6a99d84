
use crate::overlay::GroupId;
use crate::request::RequestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveMode {
    Draw,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataReason {
    /// The request function delivered no data.
    Transport,
    /// The service answered with zero features.
    EmptyResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    ControlAdded,
    ControlRemoved,
    Activated { mode: ActiveMode },
    Deactivated { mode: ActiveMode },
    ApiCallStart { ticket: u64 },
    ApiCallEnd { ticket: u64 },
    Displayed { group_id: GroupId },
    NoData { reason: NoDataReason },
    Error { message: String },
    Delete { group_id: GroupId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ControlAdded,
    ControlRemoved,
    Activated,
    Deactivated,
    ApiCallStart,
    ApiCallEnd,
    Displayed,
    NoData,
    Error,
    Delete,
}

impl ControlEvent {
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ControlAdded => EventKind::ControlAdded,
            Self::ControlRemoved => EventKind::ControlRemoved,
            Self::Activated { .. } => EventKind::Activated,
            Self::Deactivated { .. } => EventKind::Deactivated,
            Self::ApiCallStart { .. } => EventKind::ApiCallStart,
            Self::ApiCallEnd { .. } => EventKind::ApiCallEnd,
            Self::Displayed { .. } => EventKind::Displayed,
            Self::NoData { .. } => EventKind::NoData,
            Self::Error { .. } => EventKind::Error,
            Self::Delete { .. } => EventKind::Delete,
        }
    }

    pub fn from_request_error(error: &RequestError) -> Self {
        match error {
            RequestError::Transport => Self::NoData {
                reason: NoDataReason::Transport,
            },
            RequestError::EmptyResult => Self::NoData {
                reason: NoDataReason::EmptyResult,
            },
            other => Self::Error {
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ControlEvent)>;

struct Subscription {
    id: SubscriptionId,
    filter: Option<EventKind>,
    listener: Listener,
}

pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ControlEvent) + 'static) -> SubscriptionId {
        let id = self.allocate_id();
        self.subscriptions.push(Subscription {
            id,
            filter: None,
            listener: Box::new(listener),
        });
        id
    }

    pub fn subscribe_kind(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&ControlEvent) + 'static,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.subscriptions.push(Subscription {
            id,
            filter: Some(kind),
            listener: Box::new(listener),
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| subscription.id != id);
        self.subscriptions.len() != before
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn emit(&mut self, event: ControlEvent) {
        tracing::debug!(?event, "emit control event");
        let kind = event.kind();
        for subscription in &mut self.subscriptions {
            if subscription.filter.is_none_or(|filter| filter == kind) {
                (subscription.listener)(&event);
            }
        }
    }
}
