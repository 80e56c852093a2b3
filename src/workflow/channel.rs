//! Application-wide publish/subscribe channel for popup completions.
//!
//! Delivery is fire-and-forget: only subscribers registered at publish time
//! receive a message, nothing is buffered for later subscribers. Each
//! subscriber gets its own queue which its view drains on its own tick.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::mpsc;

use super::topic::{Completion, WorkflowTopic};

/// Message delivered to a subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowSignal {
    /// The popup confirmed and published its payload
    Completed(Completion),
    /// The popup window closed without completing
    Dismissed { label: String },
}

type Subscribers = HashMap<WorkflowTopic, Vec<(u64, mpsc::UnboundedSender<WorkflowSignal>)>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Subscribers,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable handle to the shared channel
#[derive(Clone, Default)]
pub struct EventChannel {
    registry: Arc<Mutex<Registry>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a completion on its topic. Returns how many subscribers got it.
    pub fn publish(&self, completion: Completion) -> usize {
        let topic = completion.topic();
        let delivered = self.deliver(topic, WorkflowSignal::Completed(completion));
        tracing::debug!("Published {} to {} subscriber(s)", topic, delivered);
        delivered
    }

    /// Tell subscribers of `topic` that the popup `label` closed without completing
    pub fn publish_dismissed(&self, topic: WorkflowTopic, label: &str) -> usize {
        let delivered = self.deliver(
            topic,
            WorkflowSignal::Dismissed {
                label: label.to_string(),
            },
        );
        tracing::debug!("Popup '{}' dismissed ({} subscriber(s) notified)", label, delivered);
        delivered
    }

    fn deliver(&self, topic: WorkflowTopic, signal: WorkflowSignal) -> usize {
        let mut registry = lock(&self.registry);
        let Some(subscribers) = registry.subscribers.get_mut(&topic) else {
            return 0;
        };

        subscribers.retain(|(_, tx)| !tx.is_closed());
        subscribers
            .iter()
            .filter(|(_, tx)| tx.send(signal.clone()).is_ok())
            .count()
    }

    /// Start listening on `topic`. Dropping the subscription unsubscribes.
    pub fn subscribe(&self, topic: WorkflowTopic) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.entry(topic).or_default().push((id, tx));

        Subscription {
            id,
            topic,
            registry: Arc::downgrade(&self.registry),
            rx: Some(rx),
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, topic: WorkflowTopic) -> usize {
        lock(&self.registry)
            .subscribers
            .get(&topic)
            .map(|subs| subs.iter().filter(|(_, tx)| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

/// A live registration on one topic
pub struct Subscription {
    id: u64,
    topic: WorkflowTopic,
    registry: Weak<Mutex<Registry>>,
    rx: Option<mpsc::UnboundedReceiver<WorkflowSignal>>,
}

impl Subscription {
    #[cfg(test)]
    pub fn topic(&self) -> WorkflowTopic {
        self.topic
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }

    /// Next queued signal, if any. Always `None` once unsubscribed.
    pub fn try_next(&mut self) -> Option<WorkflowSignal> {
        self.rx.as_mut()?.try_recv().ok()
    }

    /// All queued signals in publish order
    pub fn drain(&mut self) -> Vec<WorkflowSignal> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Stop listening. Signals queued but not yet drained are discarded.
    /// Safe to call any number of times.
    pub fn unsubscribe(&mut self) {
        let Some(mut rx) = self.rx.take() else {
            return;
        };
        rx.close();

        if let Some(registry) = self.registry.upgrade() {
            let mut registry = lock(&registry);
            if let Some(subscribers) = registry.subscribers.get_mut(&self.topic) {
                subscribers.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::topic::{DownloadPathPayload, LaunchInstancePayload};

    fn download(path: &str) -> Completion {
        Completion::DownloadPathSelected(DownloadPathPayload { path: path.into() })
    }

    #[test]
    fn test_publish_reaches_active_subscriber() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe(WorkflowTopic::DownloadPathSelected);

        assert_eq!(channel.publish(download("/opt/blender")), 1);
        assert_eq!(
            sub.try_next(),
            Some(WorkflowSignal::Completed(download("/opt/blender")))
        );
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_no_replay_for_late_subscriber() {
        let channel = EventChannel::new();
        assert_eq!(channel.publish(download("/early")), 0);

        let mut sub = channel.subscribe(WorkflowTopic::DownloadPathSelected);
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn test_topics_are_isolated() {
        let channel = EventChannel::new();
        let mut launch = channel.subscribe(WorkflowTopic::LaunchInstanceRequested);

        channel.publish(download("/opt"));
        assert!(launch.drain().is_empty());

        channel.publish(Completion::LaunchInstanceRequested(LaunchInstancePayload {
            script_id: None,
            launch_args: String::new(),
        }));
        assert_eq!(launch.drain().len(), 1);
    }

    #[test]
    fn test_single_topic_order_is_preserved() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe(WorkflowTopic::DownloadPathSelected);
        channel.publish(download("/a"));
        channel.publish(download("/b"));

        assert_eq!(
            sub.drain(),
            vec![
                WorkflowSignal::Completed(download("/a")),
                WorkflowSignal::Completed(download("/b")),
            ]
        );
    }

    #[test]
    fn test_unsubscribe_is_idempotent_and_discards_queued() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe(WorkflowTopic::DownloadPathSelected);

        // Already scheduled when the view tears down
        channel.publish(download("/late"));
        sub.unsubscribe();
        sub.unsubscribe();

        assert!(!sub.is_active());
        assert_eq!(sub.try_next(), None);
        assert_eq!(channel.subscriber_count(WorkflowTopic::DownloadPathSelected), 0);
        assert_eq!(channel.publish(download("/after")), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let channel = EventChannel::new();
        {
            let _sub = channel.subscribe(WorkflowTopic::OpenProjectFileConfirmed);
            assert_eq!(channel.subscriber_count(WorkflowTopic::OpenProjectFileConfirmed), 1);
        }
        assert_eq!(channel.subscriber_count(WorkflowTopic::OpenProjectFileConfirmed), 0);
    }

    #[test]
    fn test_unsubscribe_after_channel_dropped() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe(WorkflowTopic::DownloadPathSelected);
        drop(channel);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }

    #[test]
    fn test_dismissed_signal_carries_label() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe(WorkflowTopic::DownloadPathSelected);
        channel.publish_dismissed(WorkflowTopic::DownloadPathSelected, "download-path-popup");

        assert_eq!(
            sub.try_next(),
            Some(WorkflowSignal::Dismissed {
                label: "download-path-popup".into()
            })
        );
    }
}
