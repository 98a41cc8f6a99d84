use std::sync::mpsc::Sender;

use crate::overlay::FeatureCollection;

/// A settled request: `data` is `None` for any failure.
#[derive(Debug)]
pub struct Completion {
    pub ticket: u64,
    pub data: Option<FeatureCollection>,
}

/// Resolves its ticket exactly once, with no data if dropped unanswered.
#[derive(Debug)]
pub struct ResponseCallback {
    ticket: u64,
    sender: Option<Sender<Completion>>,
}

impl ResponseCallback {
    pub(crate) fn new(ticket: u64, sender: Sender<Completion>) -> Self {
        Self {
            ticket,
            sender: Some(sender),
        }
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn respond(mut self, data: Option<FeatureCollection>) {
        self.send(data);
    }

    fn send(&mut self, data: Option<FeatureCollection>) {
        if let Some(sender) = self.sender.take() {
            // The receiver is gone once the control is dropped.
            let _ = sender.send(Completion {
                ticket: self.ticket,
                data,
            });
        }
    }
}

impl Drop for ResponseCallback {
    fn drop(&mut self) {
        if self.sender.is_some() {
            tracing::debug!(ticket = self.ticket, "response callback dropped unanswered");
            self.send(None);
        }
    }
}

pub trait RequestFn {
    fn request(&self, url: &str, callback: ResponseCallback);
}

impl<F> RequestFn for F
where
    F: Fn(&str, ResponseCallback),
{
    fn request(&self, url: &str, callback: ResponseCallback) {
        self(url, callback)
    }
}
