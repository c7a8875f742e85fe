use std::fmt;

/// Terminal outcome of a protocol stage, consumed by the hosting flow
/// orchestrator to pick the next transition or error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// The stage completed and the flow may continue.
    Proceed,
    /// Required configuration or prior-stage state was missing.
    InvalidContext,
    /// Network or signing failure while calling the Candour API.
    ApiCommFailure,
    /// The Candour API answered with a status outside 2xx.
    ApiRespFailure,
    /// The Candour API answered 2xx but the body did not have the expected
    /// shape.
    ApiRespMalformed,
    /// The redirect back from the provider carried an absent or unrecognized
    /// status, or no session id.
    RedirectRespMalformed,
    /// The user cancelled the verification.
    RedirectRespCancelled,
    /// The user cancelled because their device is not supported.
    RedirectRespCancelledUnsupportedDevice,
    /// The user cancelled because their identity document is not supported.
    RedirectRespCancelledUnsupportedId,
    /// The result claims do not reference the invitation created in this
    /// session.
    InviteLinkValidationFailure,
}

impl Event {
    /// Stable identifier for this event, as referenced by flow definitions.
    pub fn id(&self) -> &'static str {
        match self {
            Event::Proceed => "proceed",
            Event::InvalidContext => "InvalidProfileContext",
            Event::ApiCommFailure => "CandourApiCommFailure",
            Event::ApiRespFailure => "CandourApiRespFailure",
            Event::ApiRespMalformed => "CandourApiRespMalformed",
            Event::RedirectRespMalformed => "CandourRedirectRespMalformed",
            Event::RedirectRespCancelled => "CandourRedirectRespCancelled",
            Event::RedirectRespCancelledUnsupportedDevice => "CandourRedirectRespCancelledUD",
            Event::RedirectRespCancelledUnsupportedId => "CandourRedirectRespCancelledUId",
            Event::InviteLinkValidationFailure => "CandourInviteLinkValidationFailure",
        }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, Event::Proceed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
