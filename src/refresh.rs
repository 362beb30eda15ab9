//! One-shot refresh signalling between a child screen and the screen that opened it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshEvent {
    Spaces,
    Folders,
    Files,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSet(BTreeSet<RefreshEvent>);

impl RefreshSet {
    pub fn contains(&self, event: RefreshEvent) -> bool {
        self.0.contains(&event)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RefreshEvent> + '_ {
        self.0.iter().copied()
    }
}

pub fn channel() -> (RefreshSender, RefreshReceiver) {
    let (sender, receiver) = oneshot::channel();
    (
        RefreshSender {
            pending: RefreshSet::default(),
            sender: Some(sender),
        },
        RefreshReceiver { receiver },
    )
}

#[derive(Debug)]
pub struct RefreshSender {
    pending: RefreshSet,
    sender: Option<oneshot::Sender<RefreshSet>>,
}

impl RefreshSender {
    pub fn mark(&mut self, event: RefreshEvent) {
        self.pending.0.insert(event);
    }

    /// Delivers whatever was marked. Dropping the sender does the same.
    pub fn finish(mut self) {
        self.deliver();
    }

    fn deliver(&mut self) {
        if let Some(sender) = self.sender.take() {
            // The opener may already be gone; that just means nobody needs the refresh.
            let _ = sender.send(std::mem::take(&mut self.pending));
        }
    }
}

impl Drop for RefreshSender {
    fn drop(&mut self) {
        self.deliver();
    }
}

#[derive(Debug)]
pub struct RefreshReceiver {
    receiver: oneshot::Receiver<RefreshSet>,
}

impl RefreshReceiver {
    pub async fn recv(self) -> RefreshSet {
        self.receiver.await.unwrap_or_default()
    }
}
