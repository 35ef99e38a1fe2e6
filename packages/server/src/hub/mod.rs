//! Connection hub.
//!
//! The hub is the single coordinating loop that owns live connection
//! membership and room-scoped fan-out. Connections never touch shared
//! broadcast state directly: they submit join, leave, broadcast and typing
//! events through a [`HubHandle`], and the loop in [`Hub::run`] processes them
//! one at a time.
//!
//! - `outbound`: bounded per-connection queue and its overflow policy
//! - `membership`: room → connection key index (diagnostic reads)
//! - `handle`: the submission side used by connections
//! - `event_loop`: the coordinating loop

mod config;
mod event_loop;
mod handle;
mod membership;
mod outbound;

pub use config::HubConfig;
pub use event_loop::Hub;
pub use handle::{HubHandle, JoinRequest, SubmitError};
pub use membership::MembershipIndex;
pub use outbound::{
    DEFAULT_OUTBOUND_CAPACITY, Offer, OutboundQueue, OutboundReceiver, OverflowPolicy, Payload,
    outbound_queue,
};
