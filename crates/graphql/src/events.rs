//! In-process publish/subscribe for the subscription topics.
//!
//! Each topic keeps an explicit registry of subscriber queues. Publishing
//! snapshots the registry and hands a clone of the payload to every queue
//! without waiting. A [`Subscriber`] removes itself from the registry when it
//! is dropped, so a closed client connection stops receiving deliveries
//! immediately and the registry never grows past the live subscribers.

use std::{
    collections::HashMap,
    fmt,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, Weak},
    task::{Context, Poll},
};

use {
    storefront_store::{Post, Product},
    tokio::sync::mpsc::{self, error::TrySendError},
    tokio_stream::Stream,
    tracing::{debug, warn},
};

/// Default number of undelivered events buffered per subscriber.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// The subscription channels exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    NewProduct,
    NewPost,
    PostPublished,
}

impl Topic {
    pub const fn name(self) -> &'static str {
        match self {
            Self::NewProduct => "newProduct",
            Self::NewPost => "newPost",
            Self::PostPublished => "postPublished",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct Registry<T> {
    next_id: u64,
    subscribers: HashMap<u64, mpsc::Sender<T>>,
}

fn lock<T>(registry: &Mutex<Registry<T>>) -> MutexGuard<'_, Registry<T>> {
    registry.lock().unwrap_or_else(|e| e.into_inner())
}

/// One topic's subscriber registry. Cloning shares the registry.
pub struct TopicChannel<T> {
    topic: Topic,
    capacity: usize,
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for TopicChannel<T> {
    fn clone(&self) -> Self {
        Self {
            topic: self.topic,
            capacity: self.capacity,
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T: Clone + Send + 'static> TopicChannel<T> {
    fn new(topic: Topic, capacity: usize) -> Self {
        Self {
            topic,
            capacity: capacity.max(1),
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                subscribers: HashMap::new(),
            })),
        }
    }

    /// Register a new subscriber. It only sees events published from now on.
    pub fn subscribe(&self) -> Subscriber<T> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.subscribers.insert(id, tx);
            id
        };
        debug!(topic = %self.topic, subscriber = id, "subscriber registered");
        Subscriber {
            id,
            topic: self.topic,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `payload` to every current subscriber without waiting.
    ///
    /// Returns how many subscribers accepted the event. A subscriber whose
    /// queue is full misses this event; one whose receiver is gone is pruned.
    pub fn publish(&self, payload: &T) -> usize {
        let snapshot: Vec<(u64, mpsc::Sender<T>)> = lock(&self.registry)
            .subscribers
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, tx) in snapshot {
            match tx.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(topic = %self.topic, subscriber = id, "subscriber queue full, event dropped");
                },
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }

        if !closed.is_empty() {
            let mut registry = lock(&self.registry);
            for id in &closed {
                registry.subscribers.remove(id);
            }
        }

        debug!(topic = %self.topic, delivered, pruned = closed.len(), "event published");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).subscribers.len()
    }
}

/// A live registration on one topic, consumed as a [`Stream`] of payloads.
///
/// Dropping it deregisters the subscriber.
pub struct Subscriber<T> {
    id: u64,
    topic: Topic,
    rx: mpsc::Receiver<T>,
    registry: Weak<Mutex<Registry<T>>>,
}

impl<T> Stream for Subscriber<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

impl<T> Drop for Subscriber<T> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).subscribers.remove(&self.id);
            debug!(topic = %self.topic, subscriber = self.id, "subscriber removed");
        }
    }
}

/// The three storefront topics. Cloning shares the registries.
#[derive(Clone)]
pub struct EventBus {
    new_product: TopicChannel<Product>,
    new_post: TopicChannel<Post>,
    post_published: TopicChannel<Post>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl EventBus {
    /// Create a bus buffering at most `queue_capacity` events per subscriber.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            new_product: TopicChannel::new(Topic::NewProduct, queue_capacity),
            new_post: TopicChannel::new(Topic::NewPost, queue_capacity),
            post_published: TopicChannel::new(Topic::PostPublished, queue_capacity),
        }
    }

    pub fn new_product(&self) -> &TopicChannel<Product> {
        &self.new_product
    }

    pub fn new_post(&self) -> &TopicChannel<Post> {
        &self.new_post
    }

    pub fn post_published(&self) -> &TopicChannel<Post> {
        &self.post_published
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        match topic {
            Topic::NewProduct => self.new_product.subscriber_count(),
            Topic::NewPost => self.new_post.subscriber_count(),
            Topic::PostPublished => self.post_published.subscriber_count(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        tokio::time::{Duration, timeout},
        tokio_stream::StreamExt,
    };

    fn post(id: &str) -> Post {
        Post {
            id: id.into(),
            title: format!("post {id}"),
            content: None,
            published: false,
            author_id: None,
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn fans_out_to_every_subscriber() {
        let bus = EventBus::default();
        let mut a = bus.new_post().subscribe();
        let mut b = bus.new_post().subscribe();

        assert_eq!(bus.new_post().publish(&post("1")), 2);

        assert_eq!(a.next().await.unwrap().id, "1");
        assert_eq!(b.next().await.unwrap().id, "1");
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let bus = EventBus::default();
        let mut published = bus.post_published().subscribe();

        assert_eq!(bus.new_post().publish(&post("1")), 0);
        assert!(
            timeout(Duration::from_millis(20), published.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::default();
        bus.new_post().publish(&post("early"));

        let mut late = bus.new_post().subscribe();
        bus.new_post().publish(&post("late"));

        assert_eq!(late.next().await.unwrap().id, "late");
    }

    #[tokio::test]
    async fn dropping_subscriber_deregisters_it() {
        let bus = EventBus::default();
        let sub = bus.new_post().subscribe();
        let _keep = bus.new_post().subscribe();
        assert_eq!(bus.subscriber_count(Topic::NewPost), 2);

        drop(sub);
        assert_eq!(bus.subscriber_count(Topic::NewPost), 1);
        assert_eq!(bus.new_post().publish(&post("1")), 1);
    }

    #[tokio::test]
    async fn full_queue_drops_event_for_that_subscriber_only() {
        let bus = EventBus::new(1);
        let mut slow = bus.new_post().subscribe();
        let mut fast = bus.new_post().subscribe();

        assert_eq!(bus.new_post().publish(&post("1")), 2);
        assert_eq!(fast.next().await.unwrap().id, "1");

        // `slow` still holds event 1, so event 2 only reaches `fast`.
        assert_eq!(bus.new_post().publish(&post("2")), 1);
        assert_eq!(fast.next().await.unwrap().id, "2");
        assert_eq!(slow.next().await.unwrap().id, "1");
        assert_eq!(bus.subscriber_count(Topic::NewPost), 2);
    }

    #[test]
    fn topic_names_match_schema_fields() {
        assert_eq!(Topic::NewProduct.to_string(), "newProduct");
        assert_eq!(Topic::NewPost.name(), "newPost");
        assert_eq!(Topic::PostPublished.name(), "postPublished");
    }
}
