//! Per-call mutable state shared by the UAS state handlers.
//!
//! A [`LegContext`] is mutated only by the active state handler and by the
//! dispatcher in [`super::UasLeg`]. Outbound effects (responses, billing,
//! upward events) go through the [`LegSignaling`] collaborator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use super::events::{CallEvent, PendingEvent};
use super::state::LegCallback;
use super::types::{ReasonHeader, SessionBody, SipContact, UasResponse};
use crate::config::UasConfig;
use crate::timer::{Scheduler, TimerHandle};

/// Outbound operations of a call leg
pub trait LegSignaling: Send + Sync {
    /// Send a provisional or final response to the INVITE
    fn send_response(&self, response: UasResponse);

    /// Tear down an established call
    fn send_bye(&self, reason: Option<ReasonHeader>);

    /// Start the billing/credit timer at `rtime`
    fn start_credit_timer(&self, rtime: Instant);

    /// Notify the rest of the call (bridged legs, observers)
    fn emit_event(&self, event: CallEvent);

    /// No provisional response was sent in time
    fn no_progress_expired(&self) {}

    /// No final response was sent before the expiration deadline
    fn expired(&self) {}
}

/// Session description renegotiation.
///
/// The hook receives the body and the suspended event. It either finishes
/// synchronously, rewriting the body through [`PendingEvent::body_mut`] and
/// returning the event, or keeps it and hands it back later with
/// [`super::UasLeg::resume`] after the leg reported `Dispatch::Suspended`.
/// The hook runs while the leg is borrowed, so it must not call into the leg
/// itself. An event still flagged `needs_update` is offered to the hook again.
pub trait LocalSdpChange: Send + Sync {
    fn on_local_sdp_change(&self, body: &SessionBody, pending: PendingEvent) -> Option<PendingEvent>;
}

pub struct LegContext {
    pub call_id: String,
    pub origin: String,
    pub local_contact: Option<SipContact>,
    pub local_sdp: Option<SessionBody>,

    pub no_progress_timer: Option<TimerHandle>,
    pub expire_timer: Option<TimerHandle>,
    pub expire_duration: Option<Duration>,

    pub p1xx_ts: Option<Instant>,
    pub connect_ts: Option<Instant>,
    pub disconnect_ts: Option<Instant>,
    pub last_scode: u16,

    pub ring_cbs: Vec<LegCallback>,
    pub conn_cbs: Vec<LegCallback>,
    pub fail_cbs: Vec<LegCallback>,
    pub disc_cbs: Vec<LegCallback>,

    pub on_local_sdp_change: Option<Arc<dyn LocalSdpChange>>,

    signaling: Arc<dyn LegSignaling>,
    scheduler: Arc<dyn Scheduler>,
    terminated: Arc<AtomicBool>,
}

impl LegContext {
    pub fn new(
        call_id: impl Into<String>,
        signaling: Arc<dyn LegSignaling>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            origin: "caller".to_string(),
            local_contact: None,
            local_sdp: None,
            no_progress_timer: None,
            expire_timer: None,
            expire_duration: None,
            p1xx_ts: None,
            connect_ts: None,
            disconnect_ts: None,
            last_scode: 100,
            ring_cbs: Vec::new(),
            conn_cbs: Vec::new(),
            fail_cbs: Vec::new(),
            disc_cbs: Vec::new(),
            on_local_sdp_change: None,
            signaling,
            scheduler,
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_local_contact(mut self, contact: SipContact) -> Self {
        self.local_contact = Some(contact);
        self
    }

    pub fn with_sdp_hook(mut self, hook: Arc<dyn LocalSdpChange>) -> Self {
        self.on_local_sdp_change = Some(hook);
        self
    }

    /// Apply configured timers: remembers the expiration duration and arms
    /// the no-progress timer.
    pub fn with_config(mut self, config: &UasConfig) -> Self {
        self.expire_duration = config.expire();
        if let Some(no_progress) = config.no_progress() {
            self.arm_no_progress(no_progress);
        }
        self
    }

    pub fn on_ring(mut self, cb: LegCallback) -> Self {
        self.ring_cbs.push(cb);
        self
    }

    pub fn on_connect(mut self, cb: LegCallback) -> Self {
        self.conn_cbs.push(cb);
        self
    }

    pub fn on_fail(mut self, cb: LegCallback) -> Self {
        self.fail_cbs.push(cb);
        self
    }

    pub fn on_disconnect(mut self, cb: LegCallback) -> Self {
        self.disc_cbs.push(cb);
        self
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub(crate) fn mark_terminated(&self) {
        self.terminated.store(true, Ordering::Release);
    }

    pub fn send_response(&mut self, response: UasResponse) {
        debug!(leg = %self.call_id, code = response.code, "Sending {} {}", response.code, response.reason);
        if response.is_final() {
            self.last_scode = response.code;
        }
        self.signaling.send_response(response);
    }

    pub fn send_bye(&self, reason: Option<ReasonHeader>) {
        self.signaling.send_bye(reason);
    }

    pub fn start_credit_timer(&self, rtime: Instant) {
        self.signaling.start_credit_timer(rtime);
    }

    pub fn emit_event(&self, event: CallEvent) {
        debug!(leg = %self.call_id, "Emitting {}", event);
        self.signaling.emit_event(event);
    }

    /// Arm the no-progress timer, replacing any previous one
    pub fn arm_no_progress(&mut self, after: Duration) {
        self.cancel_no_progress_timer();
        let signaling = self.signaling.clone();
        let terminated = self.terminated.clone();
        let call_id = self.call_id.clone();
        let handle = self.scheduler.schedule_after(
            after,
            Box::new(move || {
                if terminated.load(Ordering::Acquire) {
                    trace!(leg = %call_id, "No-progress timer fired after termination");
                    return;
                }
                signaling.no_progress_expired();
            }),
        );
        self.no_progress_timer = Some(handle);
    }

    /// Arm the expire timer at now + the configured duration. Does nothing
    /// when no duration is configured or the timer is already armed.
    pub fn arm_expire_timer(&mut self) {
        let Some(duration) = self.expire_duration else {
            return;
        };
        if self.expire_timer.is_some() {
            return;
        }
        let signaling = self.signaling.clone();
        let terminated = self.terminated.clone();
        let call_id = self.call_id.clone();
        let handle = self.scheduler.schedule_at(
            Instant::now() + duration,
            Box::new(move || {
                if terminated.load(Ordering::Acquire) {
                    trace!(leg = %call_id, "Expire timer fired after termination");
                    return;
                }
                signaling.expired();
            }),
        );
        self.expire_timer = Some(handle);
    }

    /// Cancel and clear the no-progress timer. Returns whether one was armed.
    pub fn cancel_no_progress_timer(&mut self) -> bool {
        match self.no_progress_timer.take() {
            Some(timer) => {
                timer.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel and clear the expire timer. Returns whether one was armed.
    pub fn cancel_expire_timer(&mut self) -> bool {
        match self.expire_timer.take() {
            Some(timer) => {
                timer.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_timers(&mut self) {
        self.cancel_expire_timer();
        self.cancel_no_progress_timer();
    }

    /// Hand `event` to the renegotiation hook while its body needs updating.
    ///
    /// Returns the event, possibly rewritten by the hook, once it can be
    /// handled; `None` means the hook kept it and no side effect may be
    /// performed.
    pub(crate) fn suspend_for_renegotiation(&self, mut event: CallEvent) -> Option<CallEvent> {
        let Some(hook) = self.on_local_sdp_change.clone() else {
            return Some(event);
        };
        loop {
            let body = match event.body().filter(|body| body.needs_update) {
                Some(body) => body.clone(),
                None => return Some(event),
            };
            debug!(leg = %self.call_id, "Suspending {} pending local SDP update", event);
            match hook.on_local_sdp_change(&body, PendingEvent::new(event)) {
                Some(pending) => event = pending.into_event(),
                None => return None,
            }
        }
    }
}

impl std::fmt::Debug for LegContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegContext")
            .field("call_id", &self.call_id)
            .field("origin", &self.origin)
            .field("no_progress_timer", &self.no_progress_timer)
            .field("expire_timer", &self.expire_timer)
            .field("p1xx_ts", &self.p1xx_ts)
            .field("connect_ts", &self.connect_ts)
            .field("disconnect_ts", &self.disconnect_ts)
            .field("last_scode", &self.last_scode)
            .finish()
    }
}
