use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};

use super::{
    build_query_url, Completion, OverlayRequest, RequestError, RequestFn, RequestResult,
    ResponseCallback,
};
use crate::config::ControlConfig;
use crate::events::{ControlEvent, EventBus};
use crate::overlay::FeatureCollection;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub ticket: u64,
    /// Draw activation this request belongs to.
    pub epoch: u64,
    pub request: OverlayRequest,
    pub url: String,
}

#[derive(Debug)]
pub struct RequestOutcome {
    pub ticket: u64,
    pub epoch: u64,
    pub request: OverlayRequest,
    pub result: RequestResult<FeatureCollection>,
}

#[derive(Debug)]
pub struct RequestOrchestrator {
    in_flight: Option<PendingRequest>,
    abandoned: Vec<u64>,
    settled: Vec<RequestOutcome>,
    next_ticket: u64,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
}

impl Default for RequestOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestOrchestrator {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            in_flight: None,
            abandoned: Vec::new(),
            settled: Vec::new(),
            next_ticket: 1,
            sender,
            receiver,
        }
    }

    fn allocate_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.saturating_add(1);
        ticket
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&PendingRequest> {
        self.in_flight.as_ref()
    }

    /// Invokes `fetcher` once; the result arrives through [`RequestOrchestrator::poll`].
    pub fn submit(
        &mut self,
        config: &ControlConfig,
        request: OverlayRequest,
        epoch: u64,
        fetcher: &dyn RequestFn,
        events: &mut EventBus,
    ) -> RequestResult<u64> {
        if self.in_flight.is_some() {
            return Err(RequestError::Busy);
        }
        let url = build_query_url(config, &request)?;
        let ticket = self.allocate_ticket();

        tracing::info!(
            ticket,
            range_type = request.range_type().as_str(),
            travel_mode = ?request.travel_mode,
            "submitting reachability request"
        );
        events.emit(ControlEvent::ApiCallStart { ticket });
        self.in_flight = Some(PendingRequest {
            ticket,
            epoch,
            request,
            url: url.clone(),
        });

        let callback = ResponseCallback::new(ticket, self.sender.clone());
        let invoked = catch_unwind(AssertUnwindSafe(|| fetcher.request(&url, callback)));
        if invoked.is_err() {
            tracing::warn!(ticket, "request function panicked");
            if let Some(pending) = self.in_flight.take() {
                events.emit(ControlEvent::ApiCallEnd { ticket });
                self.settled.push(RequestOutcome {
                    ticket,
                    epoch: pending.epoch,
                    request: pending.request,
                    result: Err(RequestError::RequestPanicked),
                });
            }
        }
        Ok(ticket)
    }

    /// Detaches the in-flight request; its response only closes the lifecycle.
    pub fn abandon_in_flight(&mut self) {
        if let Some(pending) = self.in_flight.take() {
            tracing::debug!(ticket = pending.ticket, "in-flight request abandoned");
            self.abandoned.push(pending.ticket);
        }
    }

    pub fn poll(&mut self, events: &mut EventBus) -> Vec<RequestOutcome> {
        let mut outcomes = std::mem::take(&mut self.settled);
        while let Ok(completion) = self.receiver.try_recv() {
            if let Some(outcome) = self.resolve(completion, events) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    fn resolve(&mut self, completion: Completion, events: &mut EventBus) -> Option<RequestOutcome> {
        let ticket = completion.ticket;
        if let Some(index) = self.abandoned.iter().position(|&id| id == ticket) {
            self.abandoned.swap_remove(index);
            tracing::debug!(ticket, "late response discarded");
            events.emit(ControlEvent::ApiCallEnd { ticket });
            return None;
        }

        let pending = match self.in_flight.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                self.in_flight = other;
                tracing::debug!(ticket, "completion for settled ticket ignored");
                return None;
            }
        };

        events.emit(ControlEvent::ApiCallEnd { ticket });
        let result = match completion.data {
            None => Err(RequestError::Transport),
            Some(collection) if collection.features.is_empty() => Err(RequestError::EmptyResult),
            Some(collection) => Ok(collection),
        };
        tracing::info!(ticket, ok = result.is_ok(), "reachability request finished");

        Some(RequestOutcome {
            ticket,
            epoch: pending.epoch,
            request: pending.request,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::geometry::LatLng;
    use crate::overlay::{fixtures, RawProperties};
    use crate::state::TravelMode;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn request() -> OverlayRequest {
        OverlayRequest::time(LatLng::new(53.45, -2.35), 10.0, None, TravelMode::Driving)
    }

    fn recorded(bus: &mut EventBus) -> Rc<RefCell<Vec<EventKind>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(move |event| sink.borrow_mut().push(event.kind()));
        seen
    }

    fn one_feature() -> FeatureCollection {
        fixtures::collection(vec![fixtures::feature(
            &RawProperties::with_value(300.0),
            fixtures::polygon(&[[0.0, 0.0], [0.1, 0.0], [0.1, 0.1], [0.0, 0.0]]),
        )])
    }

    #[test]
    fn synchronous_callback_resolves_on_next_poll() {
        let mut bus = EventBus::new();
        let seen = recorded(&mut bus);
        let mut orchestrator = RequestOrchestrator::new();
        let fetch = |_: &str, callback: ResponseCallback| callback.respond(Some(one_feature()));

        let ticket = orchestrator
            .submit(&ControlConfig::default(), request(), 1, &fetch, &mut bus)
            .expect("submit should succeed");
        assert!(orchestrator.is_busy());

        let outcomes = orchestrator.poll(&mut bus);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].ticket, ticket);
        assert!(outcomes[0].result.is_ok());
        assert!(!orchestrator.is_busy());
        assert_eq!(
            seen.borrow().as_slice(),
            &[EventKind::ApiCallStart, EventKind::ApiCallEnd]
        );
    }

    #[test]
    fn null_and_empty_results_are_distinguished() {
        let mut bus = EventBus::new();
        let mut orchestrator = RequestOrchestrator::new();
        let config = ControlConfig::default();

        let none = |_: &str, callback: ResponseCallback| callback.respond(None);
        orchestrator
            .submit(&config, request(), 1, &none, &mut bus)
            .expect("submit");
        let outcome = orchestrator.poll(&mut bus).remove(0);
        assert_eq!(outcome.result.unwrap_err(), RequestError::Transport);

        let empty = |_: &str, callback: ResponseCallback| callback.respond(Some(fixtures::empty()));
        orchestrator
            .submit(&config, request(), 1, &empty, &mut bus)
            .expect("submit");
        let outcome = orchestrator.poll(&mut bus).remove(0);
        assert_eq!(outcome.result.unwrap_err(), RequestError::EmptyResult);
    }

    #[test]
    fn second_submit_while_in_flight_is_rejected() {
        let mut bus = EventBus::new();
        let mut orchestrator = RequestOrchestrator::new();
        let parked = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&parked);
        let fetch = move |_: &str, callback: ResponseCallback| sink.borrow_mut().push(callback);
        let config = ControlConfig::default();

        orchestrator
            .submit(&config, request(), 1, &fetch, &mut bus)
            .expect("first submit");
        let err = orchestrator
            .submit(&config, request(), 1, &fetch, &mut bus)
            .expect_err("second submit should be busy");

        assert_eq!(err, RequestError::Busy);
        assert_eq!(parked.borrow().len(), 1);
        assert!(orchestrator.poll(&mut bus).is_empty());
    }

    #[test]
    fn panicking_request_function_becomes_error_outcome() {
        let mut bus = EventBus::new();
        let seen = recorded(&mut bus);
        let mut orchestrator = RequestOrchestrator::new();
        let fetch = |_: &str, _callback: ResponseCallback| panic!("transport exploded");

        orchestrator
            .submit(&ControlConfig::default(), request(), 1, &fetch, &mut bus)
            .expect("submit returns the ticket");
        let outcomes = orchestrator.poll(&mut bus);

        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].result.as_ref().unwrap_err(),
            &RequestError::RequestPanicked
        );
        assert_eq!(
            seen.borrow().as_slice(),
            &[EventKind::ApiCallStart, EventKind::ApiCallEnd]
        );
    }

    #[test]
    fn abandoned_request_only_emits_call_end() {
        let mut bus = EventBus::new();
        let seen = recorded(&mut bus);
        let mut orchestrator = RequestOrchestrator::new();
        let parked = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&parked);
        let fetch = move |_: &str, callback: ResponseCallback| sink.borrow_mut().push(callback);

        orchestrator
            .submit(&ControlConfig::default(), request(), 1, &fetch, &mut bus)
            .expect("submit");
        orchestrator.abandon_in_flight();
        assert!(!orchestrator.is_busy());

        let callback = parked.borrow_mut().pop().expect("callback parked");
        callback.respond(Some(one_feature()));

        assert!(orchestrator.poll(&mut bus).is_empty());
        assert_eq!(
            seen.borrow().as_slice(),
            &[EventKind::ApiCallStart, EventKind::ApiCallEnd]
        );
    }

    #[test]
    fn construction_failure_emits_nothing() {
        let mut bus = EventBus::new();
        let seen = recorded(&mut bus);
        let mut orchestrator = RequestOrchestrator::new();
        let config = ControlConfig {
            endpoint: "::".to_string(),
            ..ControlConfig::default()
        };
        let fetch = |_: &str, _callback: ResponseCallback| unreachable!("must not be called");

        let err = orchestrator
            .submit(&config, request(), 1, &fetch, &mut bus)
            .expect_err("bad endpoint should fail");

        assert!(matches!(err, RequestError::Construction { .. }));
        assert!(seen.borrow().is_empty());
        assert!(!orchestrator.is_busy());
    }
}
