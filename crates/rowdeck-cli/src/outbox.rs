//! Host services for the command line: the sink and the bus record what the
//! table sends so it can be printed with the report.

use std::cell::RefCell;
use std::rc::Rc;

use rowdeck::{EventBus, PersistenceSink, Publication, SinkResponse, UpdateRequest};
use serde_json::json;

/// Shared record of outbound update requests and publications.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    updates: Rc<RefCell<Vec<UpdateRequest>>>,
    events: Rc<RefCell<Vec<Publication>>>,
}

impl Outbox {
    pub fn updates(&self) -> Vec<UpdateRequest> {
        self.updates.borrow().clone()
    }

    pub fn events(&self) -> Vec<Publication> {
        self.events.borrow().clone()
    }
}

impl PersistenceSink for Outbox {
    fn update(&self, request: &UpdateRequest) -> rowdeck::Result<SinkResponse> {
        tracing::info!(bundle = %request.bundle_name, "recorded update request");
        self.updates.borrow_mut().push(request.clone());
        Ok(SinkResponse::ok(json!({ "recorded": true })))
    }
}

impl EventBus for Outbox {
    fn publish(&self, publication: &Publication) -> rowdeck::Result<()> {
        tracing::info!(
            channel = %publication.channel,
            delay_ms = publication.delay.as_millis() as u64,
            "recorded publication"
        );
        self.events.borrow_mut().push(publication.clone());
        Ok(())
    }
}
