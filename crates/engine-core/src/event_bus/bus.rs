use model::events::Event;
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};
use tokio::sync::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A subscription handle that can be used to unsubscribe from events.
#[derive(Debug, Clone)]
pub struct Subscription {
    event_type_id: TypeId,
    subscriber_id: u64,
}

/// Fan-out of store events to cursors.
///
/// Subscribers use unbounded channels: a cursor that misses a mutation
/// would keep serving stale counts, so events are never dropped for slow
/// subscribers. Closed channels are pruned on publish.
#[derive(Clone, Default)]
pub struct EventBus {
    // Map of Event TypeID -> (Map of SubscriberID -> Sender)
    subscribers: Arc<RwLock<HashMap<TypeId, HashMap<u64, Box<dyn Any + Send + Sync>>>>>,
    next_id: Arc<RwLock<u64>>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(RwLock::new(0)),
        }
    }

    pub async fn subscribe<E>(&self, sender: mpsc::UnboundedSender<Arc<E>>) -> Subscription
    where
        E: Event,
    {
        let event_type_id = TypeId::of::<E>();

        let subscriber_id = {
            let mut id_lock = self.next_id.write().await;
            let id = *id_lock;
            *id_lock += 1;
            id
        };

        let mut subscribers = self.subscribers.write().await;
        subscribers
            .entry(event_type_id)
            .or_default()
            .insert(subscriber_id, Box::new(sender));

        debug!(
            event_type = std::any::type_name::<E>(),
            subscriber_id = subscriber_id,
            "Subscribed to event"
        );

        Subscription {
            event_type_id,
            subscriber_id,
        }
    }

    /// Delivers `event` to every live subscriber and returns how many
    /// received it.
    pub async fn publish<E>(&self, event: E) -> usize
    where
        E: Event,
    {
        let event_type_id = TypeId::of::<E>();
        let event_arc = Arc::new(event);
        let mut closed = Vec::new();
        let mut delivered = 0;

        {
            let subscribers = self.subscribers.read().await;
            let Some(type_subscribers) = subscribers.get(&event_type_id) else {
                debug!(
                    event_type = event_arc.event_type(),
                    "No subscribers for event"
                );
                return 0;
            };

            debug!(
                event_type = event_arc.event_type(),
                subscriber_count = type_subscribers.len(),
                "Publishing event"
            );

            for (subscriber_id, boxed_sender) in type_subscribers.iter() {
                match boxed_sender.downcast_ref::<mpsc::UnboundedSender<Arc<E>>>() {
                    Some(sender) => {
                        if sender.send(event_arc.clone()).is_ok() {
                            delivered += 1;
                        } else {
                            closed.push(*subscriber_id);
                        }
                    }
                    None => warn!(
                        event_type = event_arc.event_type(),
                        subscriber_id = subscriber_id,
                        "Failed to downcast sender for subscriber"
                    ),
                }
            }
        }

        for subscriber_id in closed {
            debug!(subscriber_id, "Pruning closed subscriber");
            self.unsubscribe(Subscription {
                event_type_id,
                subscriber_id,
            })
            .await;
        }

        delivered
    }

    pub async fn unsubscribe(&self, subscription: Subscription) {
        let mut subscribers = self.subscribers.write().await;

        if let Some(type_subscribers) = subscribers.get_mut(&subscription.event_type_id) {
            type_subscribers.remove(&subscription.subscriber_id);

            debug!(
                subscriber_id = subscription.subscriber_id,
                "Unsubscribed from event"
            );

            if type_subscribers.is_empty() {
                subscribers.remove(&subscription.event_type_id);
            }
        }
    }

    pub async fn subscriber_count<E>(&self) -> usize
    where
        E: Event,
    {
        let event_type_id = TypeId::of::<E>();
        let subscribers = self.subscribers.read().await;

        subscribers
            .get(&event_type_id)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collation::Locale;
    use model::events::store::StoreMutated;

    fn mutated(rev: &str) -> StoreMutated {
        StoreMutated::new(rev, Locale::posix())
    }

    #[tokio::test]
    async fn delivers_to_every_subscriber() {
        let bus = EventBus::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        bus.subscribe::<StoreMutated>(tx_a).await;
        bus.subscribe::<StoreMutated>(tx_b).await;

        assert_eq!(bus.publish(mutated("r1")).await, 2);
        assert_eq!(rx_a.recv().await.unwrap().revision, "r1");
        assert_eq!(rx_b.recv().await.unwrap().revision, "r1");
    }

    #[tokio::test]
    async fn prunes_closed_subscribers() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::unbounded_channel::<Arc<StoreMutated>>();
        bus.subscribe(tx).await;
        drop(rx);

        assert_eq!(bus.publish(mutated("r1")).await, 0);
        assert_eq!(bus.subscriber_count::<StoreMutated>().await, 0);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub = bus.subscribe::<StoreMutated>(tx).await;
        bus.unsubscribe(sub).await;

        assert_eq!(bus.publish(mutated("r1")).await, 0);
        assert!(rx.try_recv().is_err());
    }
}
