//! Client-side protocol core for integrating the Candour remote identity
//! verification service into a browser-redirect authentication flow.
//!
//! The hosting authentication-flow engine (the *orchestrator*) owns routing
//! and user interaction; this crate owns the protocol: how a multi-step,
//! redirect-based exchange is represented as one [`VerificationSession`],
//! how every outbound API call is authenticated with an HMAC over the exact
//! payload bytes, how provider responses are classified, and how the final
//! claim set becomes authentication identifiers.
//!
//! # Protocol Overview
//!
//! 1. *Create invitation*: [`CreateInvitation`] sends a signed invitation
//!    request to the Candour API and stores the returned redirect target in
//!    the session. The orchestrator redirects the end user there to perform
//!    the optical/biometric checks.
//! 2. *Redirect back*: the provider redirects the user back to the relying
//!    application. [`ExtractRedirectResult`] classifies the callback's query
//!    parameters and captures the provider session id.
//! 3. *Fetch claims*: [`FetchResultClaims`] pulls the result claims for that
//!    session id with a signed GET request.
//! 4. *Validate*: [`ValidateAuthentication`] (optionally preceded by
//!    [`ValidateInvitationLink`]) turns the claim map into a
//!    [`VerifiedIdentity`]: a canonical identifier principal plus named
//!    attributes.
//!
//! Each stage reports a terminal [`Event`] the orchestrator uses to pick the
//! next transition or error page.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use candourid::core::invitation::InvitationRequestPayload;
//! use candourid::core::util::ReqwestClient;
//! use candourid::session::VerificationSession;
//! use candourid::stages::{CandourApi, CreateInvitation, RequestOrigin};
//!
//! let api = CandourApi::builder()
//!     .with_api_uri("https://api.example.com/v1/session".parse()?)
//!     .with_client_public_key(public_key)
//!     .with_client_hmac_key(hmac_key)
//!     .with_http_client(Arc::new(ReqwestClient::new()?))
//!     .build()?;
//!
//! let create_invitation = CreateInvitation::builder()
//!     .with_api(api.clone())
//!     .with_payload(InvitationRequestPayload::default())
//!     .build()?;
//!
//! let mut session = VerificationSession::new();
//! session.set_callback_uri("/idp/profile/Authn/Candour");
//!
//! let origin = RequestOrigin::new("https", "sp.example.org", 443);
//! let event = create_invitation.execute(&mut session, &origin).await;
//! if event.is_proceed() {
//!     // Redirect the browser to session.authentication_uri().
//! }
//! ```
//!
//! Stage configuration is immutable once built and safe to share across
//! concurrent sessions; a [`VerificationSession`] belongs to exactly one
//! in-flight attempt and must be driven strictly in stage order.
//!
//! The HTTP transport is pluggable through the
//! [`AsyncHttpClient`](crate::core::util::AsyncHttpClient) trait; the
//! provided [`ReqwestClient`](crate::core::util::ReqwestClient) is the
//! production implementation. There is no retry, timeout, or cancellation
//! logic in the core: a transport failure is a terminal outcome for the
//! attempt, and any deadline belongs to the transport implementation.
//!
//! [`VerificationSession`]: crate::session::VerificationSession
//! [`CreateInvitation`]: crate::stages::CreateInvitation
//! [`ExtractRedirectResult`]: crate::stages::ExtractRedirectResult
//! [`FetchResultClaims`]: crate::stages::FetchResultClaims
//! [`ValidateAuthentication`]: crate::stages::ValidateAuthentication
//! [`ValidateInvitationLink`]: crate::stages::ValidateInvitationLink
//! [`VerifiedIdentity`]: crate::identity::VerifiedIdentity
//! [`Event`]: crate::event::Event

pub mod core;
pub mod event;
pub mod identity;
pub mod session;
pub mod stages;
pub mod utils;
