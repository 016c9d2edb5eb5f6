//! Integration tests for the UAS call leg in its Trying state

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::time::Instant;

use rvoip_b2bua_core::call_leg::{
    CallEvent, CallEventKind, Dispatch, HeaderSource, LegCallback, LegContext, LegSignaling, LocalSdpChange,
    PendingEvent, ReasonHeader, RedirectData, ResponseData, SessionBody, SipContact, SipHeader, StateId,
    TransitionNotice, UasLeg, UasResponse,
};
use rvoip_b2bua_core::config::UasConfig;
use rvoip_b2bua_core::timer::{Scheduler, TimerHandle, TimerTask};

#[derive(Debug, Clone, PartialEq)]
enum Signal {
    Response(UasResponse),
    Bye(Option<ReasonHeader>),
    Credit(Instant),
    Event(CallEvent),
    NoProgress,
    Expired,
}

#[derive(Default)]
struct RecordingSignaling {
    signals: Mutex<Vec<Signal>>,
}

impl RecordingSignaling {
    fn take(&self) -> Vec<Signal> {
        std::mem::take(&mut *self.signals.lock().unwrap())
    }

    fn responses(&self) -> Vec<UasResponse> {
        self.signals
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Signal::Response(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    fn events(&self) -> Vec<CallEvent> {
        self.signals
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Signal::Event(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, signal: Signal) {
        self.signals.lock().unwrap().push(signal);
    }
}

impl LegSignaling for RecordingSignaling {
    fn send_response(&self, response: UasResponse) {
        self.push(Signal::Response(response));
    }

    fn send_bye(&self, reason: Option<ReasonHeader>) {
        self.push(Signal::Bye(reason));
    }

    fn start_credit_timer(&self, rtime: Instant) {
        self.push(Signal::Credit(rtime));
    }

    fn emit_event(&self, event: CallEvent) {
        self.push(Signal::Event(event));
    }

    fn no_progress_expired(&self) {
        self.push(Signal::NoProgress);
    }

    fn expired(&self) {
        self.push(Signal::Expired);
    }
}

/// Scheduler that only records timers; tests fire them by hand
#[derive(Default)]
struct ManualScheduler {
    timers: Mutex<Vec<(TimerHandle, Option<TimerTask>)>>,
}

impl ManualScheduler {
    fn armed(&self) -> Vec<TimerHandle> {
        self.timers
            .lock()
            .unwrap()
            .iter()
            .map(|(handle, _)| handle.clone())
            .collect()
    }

    fn fire_all(&self) {
        let due: Vec<_> = self
            .timers
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|(handle, _)| !handle.is_cancelled())
            .filter_map(|(_, task)| task.take())
            .collect();
        for task in due {
            task();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_at(&self, deadline: Instant, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle::detached(deadline);
        self.timers.lock().unwrap().push((handle.clone(), Some(task)));
        handle
    }
}

#[derive(Default)]
struct ParkingHook {
    parked: Mutex<Vec<(SessionBody, PendingEvent)>>,
}

impl ParkingHook {
    fn take(&self) -> Option<(SessionBody, PendingEvent)> {
        self.parked.lock().unwrap().pop()
    }
}

impl LocalSdpChange for ParkingHook {
    fn on_local_sdp_change(&self, body: &SessionBody, pending: PendingEvent) -> Option<PendingEvent> {
        self.parked.lock().unwrap().push((body.clone(), pending));
        None
    }
}

/// Renegotiates in place and hands the event straight back
#[derive(Default)]
struct InlineHook {
    calls: Mutex<usize>,
}

impl LocalSdpChange for InlineHook {
    fn on_local_sdp_change(&self, _body: &SessionBody, mut pending: PendingEvent) -> Option<PendingEvent> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        // First pass leaves the body flagged so it is offered again
        if *calls > 1 {
            if let Some(body) = pending.body_mut() {
                body.content = "v=0\r\no=inline\r\n".to_string();
                body.needs_update = false;
            }
        }
        Some(pending)
    }
}

struct Request(Vec<(&'static str, &'static str)>);

impl HeaderSource for Request {
    fn header_value(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

struct Harness {
    signaling: Arc<RecordingSignaling>,
    scheduler: Arc<ManualScheduler>,
    notices: Arc<Mutex<Vec<(&'static str, TransitionNotice)>>>,
    leg: UasLeg,
}

fn recorder(notices: &Arc<Mutex<Vec<(&'static str, TransitionNotice)>>>, label: &'static str) -> LegCallback {
    let notices = notices.clone();
    Arc::new(move |notice: &TransitionNotice| notices.lock().unwrap().push((label, notice.clone())))
}

fn harness_with(config: UasConfig, hook: Option<Arc<dyn LocalSdpChange>>) -> Harness {
    let signaling = Arc::new(RecordingSignaling::default());
    let scheduler = Arc::new(ManualScheduler::default());
    let notices = Arc::new(Mutex::new(Vec::new()));

    let mut ctx = LegContext::new("call-1", signaling.clone(), scheduler.clone())
        .with_origin("caller")
        .with_local_contact(SipContact::new("sip:b2bua@192.0.2.1:5060"))
        .with_config(&config)
        .on_ring(recorder(&notices, "ring"))
        .on_connect(recorder(&notices, "connect"))
        .on_fail(recorder(&notices, "fail"))
        .on_disconnect(recorder(&notices, "disconnect"));
    if let Some(hook) = hook {
        ctx = ctx.with_sdp_hook(hook);
    }

    Harness {
        signaling,
        scheduler,
        notices,
        leg: UasLeg::new(ctx),
    }
}

fn timed() -> UasConfig {
    UasConfig {
        no_progress_secs: Some(5),
        expire_secs: Some(120),
    }
}

fn harness() -> Harness {
    harness_with(timed(), None)
}

fn parking_harness() -> (Harness, Arc<ParkingHook>) {
    let hook = Arc::new(ParkingHook::default());
    let dyn_hook: Arc<dyn LocalSdpChange> = hook.clone();
    (harness_with(timed(), Some(dyn_hook)), hook)
}

/// Clear the renegotiation flag the way a hook would once the body is ready
fn renegotiated(mut pending: PendingEvent) -> (PendingEvent, SessionBody) {
    let body = pending.body_mut().unwrap();
    body.content = "v=0\r\no=answer\r\n".to_string();
    body.needs_update = false;
    let body = body.clone();
    (pending, body)
}

fn event(kind: CallEventKind, rtime: Instant) -> CallEvent {
    CallEvent::new(kind, rtime, "callee")
}

#[test]
fn test_ring_100_is_swallowed() {
    let mut h = harness();
    let ring = event(CallEventKind::Ring(Some(ResponseData::new(100, "Trying", None))), Instant::now());

    assert_eq!(h.leg.recv_event(ring), Dispatch::Ignored);
    assert_eq!(h.leg.state(), StateId::Trying);
    assert!(h.signaling.take().is_empty());
    assert!(h.leg.context().p1xx_ts.is_none());
    assert!(h.leg.context().no_progress_timer.is_some());
}

#[test]
fn test_default_ring_moves_to_ringing() {
    let mut h = harness();
    let rtime = Instant::now();

    let dispatch = h.leg.recv_event(event(CallEventKind::Ring(None), rtime));

    assert_eq!(dispatch, Dispatch::Changed { from: StateId::Trying, to: StateId::Ringing });
    assert_eq!(h.signaling.responses(), vec![UasResponse::new(180, "Ringing")]);
    let ctx = h.leg.context();
    assert_eq!(ctx.p1xx_ts, Some(rtime));
    assert!(ctx.no_progress_timer.is_none());
    assert!(ctx.expire_timer.is_some());
    assert_eq!(ctx.last_scode, 100);

    let notices = h.notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    let (label, notice) = &notices[0];
    assert_eq!(*label, "ring");
    assert_eq!(notice.state, StateId::Ringing);
    assert_eq!(notice.rtime, Some(rtime));
    assert_eq!(notice.origin.as_deref(), Some("callee"));
    assert_eq!(notice.code, Some(180));
}

#[test]
fn test_ring_stores_local_sdp() {
    let mut h = harness();
    let body = SessionBody::sdp("v=0\r\n");
    let ring = event(
        CallEventKind::Ring(Some(ResponseData::new(183, "Session Progress", Some(body.clone())))),
        Instant::now(),
    );

    h.leg.recv_event(ring);

    assert_eq!(h.leg.context().local_sdp, Some(body.clone()));
    assert_eq!(
        h.signaling.responses(),
        vec![UasResponse::new(183, "Session Progress").with_body(Some(body))]
    );
}

#[test]
fn test_expire_timer_armed_once_after_no_progress() {
    let mut h = harness();
    let before = Instant::now();
    h.leg.recv_event(event(CallEventKind::Ring(None), before));

    let armed = h.scheduler.armed();
    assert_eq!(armed.len(), 2);
    assert!(armed[0].is_cancelled(), "no-progress timer cancelled by the first ring");
    assert!(!armed[1].is_cancelled());
    assert!(armed[1].deadline() >= before + Duration::from_secs(120));

    // A second provisional response from Ringing does not re-arm anything
    h.leg.recv_event(event(
        CallEventKind::Ring(Some(ResponseData::new(183, "Session Progress", None))),
        Instant::now(),
    ));
    assert_eq!(h.scheduler.armed().len(), 2);
    assert_eq!(h.leg.context().p1xx_ts, Some(before));
}

#[test]
fn test_expire_timer_not_armed_without_no_progress_timer() {
    let mut h = harness_with(
        UasConfig {
            no_progress_secs: None,
            expire_secs: Some(120),
        },
        None,
    );

    h.leg.recv_event(event(CallEventKind::Ring(None), Instant::now()));

    assert_eq!(h.leg.state(), StateId::Ringing);
    assert!(h.leg.context().expire_timer.is_none());
    assert!(h.scheduler.armed().is_empty());
}

#[test]
fn test_ring_suspends_and_resumes() {
    let hook = Arc::new(ParkingHook::default());
    let dyn_hook: Arc<dyn LocalSdpChange> = hook.clone();
    let mut h = harness_with(UasConfig::default(), Some(dyn_hook));
    let rtime = Instant::now();
    let body = SessionBody::sdp("v=0\r\no=old\r\n").with_needs_update();
    let ring = event(
        CallEventKind::Ring(Some(ResponseData::new(183, "Session Progress", Some(body.clone())))),
        rtime,
    );

    assert_eq!(h.leg.recv_event(ring), Dispatch::Suspended);
    assert_eq!(h.leg.state(), StateId::Trying);
    assert!(h.signaling.take().is_empty());
    assert!(h.leg.context().p1xx_ts.is_none());

    // Handing it back unchanged parks it again
    let (seen, pending) = hook.take().unwrap();
    assert_eq!(seen, body);
    assert_eq!(h.leg.resume(pending), Dispatch::Suspended);

    let (_, mut pending) = hook.take().unwrap();
    let updated = pending.body_mut().unwrap();
    updated.content = "v=0\r\no=new\r\n".to_string();
    updated.needs_update = false;
    let updated = updated.clone();

    assert_eq!(
        h.leg.resume(pending),
        Dispatch::Changed { from: StateId::Trying, to: StateId::Ringing }
    );
    assert_eq!(h.leg.context().local_sdp, Some(updated));
    assert_eq!(h.leg.context().p1xx_ts, Some(rtime));
    assert_eq!(h.signaling.responses().len(), 1);
}

#[test]
fn test_connect_suspends_and_resumes() {
    let (mut h, hook) = parking_harness();
    let rtime = Instant::now();
    let connect = event(
        CallEventKind::Connect {
            data: ResponseData::new(200, "OK", Some(SessionBody::sdp("v=0\r\n").with_needs_update())),
            extra_headers: None,
        },
        rtime,
    );

    assert_eq!(h.leg.recv_event(connect), Dispatch::Suspended);
    assert_eq!(h.leg.state(), StateId::Trying);
    assert!(h.signaling.take().is_empty());
    assert!(h.leg.context().no_progress_timer.is_some());
    assert!(h.scheduler.armed().iter().all(|t| !t.is_cancelled()));
    assert!(h.leg.context().connect_ts.is_none());

    let (_, pending) = hook.take().unwrap();
    let (pending, body) = renegotiated(pending);
    assert_eq!(
        h.leg.resume(pending),
        Dispatch::Changed { from: StateId::Trying, to: StateId::Connected }
    );

    let signals = h.signaling.take();
    assert_eq!(signals.len(), 2);
    assert!(matches!(&signals[0], Signal::Response(r) if r.code == 200 && !r.ack_wait && r.body == Some(body.clone())));
    assert_eq!(signals[1], Signal::Credit(rtime));
    assert_eq!(h.leg.context().connect_ts, Some(rtime));
    assert_eq!(h.leg.context().local_sdp, Some(body));
    assert!(h.leg.context().no_progress_timer.is_none());
    assert_eq!(h.notices.lock().unwrap().last().map(|(l, _)| *l), Some("connect"));
}

#[test]
fn test_pre_connect_suspends_and_resumes() {
    let (mut h, hook) = parking_harness();
    let pre_connect = event(
        CallEventKind::PreConnect {
            data: ResponseData::new(200, "OK", Some(SessionBody::sdp("v=0\r\n").with_needs_update())),
            extra_headers: None,
        },
        Instant::now(),
    );

    assert_eq!(h.leg.recv_event(pre_connect), Dispatch::Suspended);
    assert!(h.signaling.take().is_empty());
    assert!(h.leg.context().no_progress_timer.is_some());

    let (_, pending) = hook.take().unwrap();
    let (pending, body) = renegotiated(pending);
    assert_eq!(
        h.leg.resume(pending),
        Dispatch::Changed { from: StateId::Trying, to: StateId::Connected }
    );

    let responses = h.signaling.responses();
    assert_eq!(responses.len(), 1);
    assert!(responses[0].ack_wait);
    assert_eq!(responses[0].body, Some(body));
    assert!(h.leg.context().connect_ts.is_none());
    assert!(h.notices.lock().unwrap().is_empty());
}

#[test]
fn test_inline_renegotiation_continues_without_suspending() {
    let hook = Arc::new(InlineHook::default());
    let dyn_hook: Arc<dyn LocalSdpChange> = hook.clone();
    let mut h = harness_with(timed(), Some(dyn_hook));
    let rtime = Instant::now();
    let connect = event(
        CallEventKind::Connect {
            data: ResponseData::new(200, "OK", Some(SessionBody::sdp("v=0\r\n").with_needs_update())),
            extra_headers: None,
        },
        rtime,
    );

    assert_eq!(
        h.leg.recv_event(connect),
        Dispatch::Changed { from: StateId::Trying, to: StateId::Connected }
    );
    assert_eq!(*hook.calls.lock().unwrap(), 2);
    let responses = h.signaling.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].body.as_ref().map(|b| b.content.as_str()), Some("v=0\r\no=inline\r\n"));
    assert_eq!(h.leg.context().connect_ts, Some(rtime));
}

#[test]
fn test_connect_answers_without_ack_wait() {
    let mut h = harness();
    h.leg.recv_event(event(CallEventKind::Ring(None), Instant::now()));
    h.signaling.take();

    let rtime = Instant::now();
    let body = SessionBody::sdp("v=0\r\n");
    let extra = vec![SipHeader::new("X-Billing", "on")];
    let connect = event(
        CallEventKind::Connect {
            data: ResponseData::new(200, "OK", Some(body.clone())),
            extra_headers: Some(extra.clone()),
        },
        rtime,
    );

    assert_eq!(
        h.leg.recv_event(connect),
        Dispatch::Changed { from: StateId::Ringing, to: StateId::Connected }
    );
    let expected = UasResponse::new(200, "OK")
        .with_body(Some(body))
        .with_contact(Some(SipContact::new("sip:b2bua@192.0.2.1:5060")))
        .with_ack_wait(false)
        .with_extra_headers(Some(extra));
    assert_eq!(
        h.signaling.take(),
        vec![Signal::Response(expected), Signal::Credit(rtime)]
    );
    let ctx = h.leg.context();
    assert_eq!(ctx.connect_ts, Some(rtime));
    assert_eq!(ctx.last_scode, 200);
    assert!(ctx.expire_timer.is_none());
    assert!(h.scheduler.armed().iter().all(TimerHandle::is_cancelled));
    assert_eq!(h.notices.lock().unwrap().last().map(|(l, _)| *l), Some("connect"));
}

#[test]
fn test_pre_connect_waits_for_ack_without_callbacks() {
    let mut h = harness();
    let pre_connect = event(
        CallEventKind::PreConnect {
            data: ResponseData::new(200, "OK", None),
            extra_headers: None,
        },
        Instant::now(),
    );

    assert_eq!(
        h.leg.recv_event(pre_connect),
        Dispatch::Changed { from: StateId::Trying, to: StateId::Connected }
    );
    let responses = h.signaling.responses();
    assert_eq!(responses.len(), 1);
    assert!(responses[0].ack_wait);
    assert!(h.leg.context().connect_ts.is_none());
    assert!(h.notices.lock().unwrap().is_empty());
    assert!(h.leg.context().no_progress_timer.is_none());
}

#[test]
fn test_redirect_defaults_and_target() {
    let mut h = harness();
    let rtime = Instant::now();
    assert_eq!(
        h.leg.recv_event(event(CallEventKind::Redirect(None), rtime)),
        Dispatch::Changed { from: StateId::Trying, to: StateId::Failed }
    );
    assert_eq!(h.signaling.responses(), vec![UasResponse::new(500, "Failed")]);
    assert_eq!(h.leg.context().disconnect_ts, Some(rtime));

    let mut h = harness();
    let redirect = RedirectData {
        code: 302,
        reason: "Moved Temporarily".to_string(),
        body: None,
        target: Some("sip:alice@192.0.2.9".to_string()),
    };
    h.leg.recv_event(event(CallEventKind::Redirect(Some(redirect)), rtime));
    assert_eq!(
        h.signaling.responses(),
        vec![UasResponse::new(302, "Moved Temporarily").with_contact(Some(SipContact::new("sip:alice@192.0.2.9")))]
    );
    let (label, notice) = h.notices.lock().unwrap()[0].clone();
    assert_eq!(label, "fail");
    assert_eq!(notice.code, Some(302));
    assert!(h.scheduler.armed().iter().all(TimerHandle::is_cancelled));
}

#[test]
fn test_fail_merges_challenge_and_reason() {
    let mut h = harness();
    let reason = ReasonHeader::new("Q.850", 17, Some("User busy"));
    let fail = event(
        CallEventKind::Fail {
            status: Some((407, "Proxy Authentication Required".to_string())),
            extra_headers: Some(vec![SipHeader::new("X-Trace", "7")]),
            challenge: Some(SipHeader::new("Proxy-Authenticate", "Digest realm=\"b2bua\"")),
            reason: Some(reason.clone()),
        },
        Instant::now(),
    );

    h.leg.recv_event(fail);

    let responses = h.signaling.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].code, 407);
    assert_eq!(
        responses[0].extra_headers,
        Some(vec![
            SipHeader::new("X-Trace", "7"),
            SipHeader::new("Proxy-Authenticate", "Digest realm=\"b2bua\""),
        ])
    );
    assert_eq!(responses[0].reason_rfc3326, Some(reason));
    assert_eq!(h.leg.state(), StateId::Failed);
    assert_eq!(h.notices.lock().unwrap()[0].1.code, Some(407));
}

#[test]
fn test_fail_defaults_send_no_extra_headers() {
    let mut h = harness();
    let fail = event(
        CallEventKind::Fail {
            status: None,
            extra_headers: Some(Vec::new()),
            challenge: None,
            reason: None,
        },
        Instant::now(),
    );

    h.leg.recv_event(fail);

    let responses = h.signaling.responses();
    assert_eq!(responses[0].code, 500);
    assert_eq!(responses[0].reason, "Failed");
    assert_eq!(responses[0].extra_headers, None);
    assert_eq!(h.leg.context().last_scode, 500);
}

#[test]
fn test_disconnect_reports_last_final_code() {
    let mut h = harness();
    let rtime = Instant::now();
    let reason = ReasonHeader::new("SIP", 487, None);

    h.leg.recv_event(event(CallEventKind::Disconnect { reason: Some(reason.clone()) }, rtime));

    assert_eq!(
        h.signaling.responses(),
        vec![UasResponse::new(500, "Disconnected").with_reason(Some(reason))]
    );
    let notices = h.notices.lock().unwrap();
    assert_eq!(notices[0].0, "disconnect");
    assert_eq!(notices[0].1.code, Some(500));
    assert_eq!(h.leg.context().disconnect_ts, Some(rtime));
    assert!(h.leg.context().is_terminated());
}

#[test]
fn test_cancel_emits_one_disconnect_with_reason() {
    let mut h = harness();
    let rtime = Instant::now();
    let req = Request(vec![("Reason", "SIP;cause=487;text=\"Request Terminated\"")]);

    assert_eq!(
        h.leg.cancel(rtime, Some(&req as &dyn HeaderSource)),
        Dispatch::Changed { from: StateId::Trying, to: StateId::Disconnected }
    );

    let events = h.signaling.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].rtime, rtime);
    assert_eq!(events[0].origin, "caller");
    assert_eq!(
        events[0].kind,
        CallEventKind::Disconnect {
            reason: Some(ReasonHeader::new("SIP", 487, Some("Request Terminated")))
        }
    );
    assert_eq!(h.leg.context().disconnect_ts, Some(rtime));
    let notices = h.notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].1.origin.as_deref(), Some("caller"));
}

#[test]
fn test_cancel_without_or_with_bad_reason() {
    let rtime = Instant::now();
    let bad = Request(vec![("Reason", "SIP;cause=abc")]);
    let empty = Request(Vec::new());
    let requests: [Option<&dyn HeaderSource>; 3] = [None, Some(&bad as &dyn HeaderSource), Some(&empty as &dyn HeaderSource)];

    for req in requests {
        let mut h = harness();
        assert_eq!(h.leg.cancel(rtime, req), Dispatch::Changed { from: StateId::Trying, to: StateId::Disconnected });
        let events = h.signaling.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, CallEventKind::Disconnect { reason: None });
        assert_eq!(h.leg.context().disconnect_ts, Some(rtime));
    }
}

#[test]
fn test_timers_firing_after_cancel_are_noops() {
    let mut h = harness();
    h.leg.cancel(Instant::now(), None);
    h.signaling.take();

    h.scheduler.fire_all();

    assert!(h.signaling.take().is_empty());
}

#[test]
fn test_no_progress_timer_fires_while_trying() {
    let h = harness();
    h.scheduler.fire_all();
    assert_eq!(h.signaling.take(), vec![Signal::NoProgress]);
}

#[test]
fn test_info_is_discarded_while_trying() {
    let mut h = harness();
    let info = event(CallEventKind::Info { body: None }, Instant::now());

    assert_eq!(h.leg.recv_event(info), Dispatch::Ignored);
    assert_eq!(h.leg.state(), StateId::Trying);
    assert!(h.signaling.take().is_empty());
}

#[test]
fn test_connected_disconnect_sends_bye() {
    let mut h = harness();
    h.leg.recv_event(event(
        CallEventKind::Connect {
            data: ResponseData::new(200, "OK", None),
            extra_headers: None,
        },
        Instant::now(),
    ));
    h.signaling.take();

    let rtime = Instant::now();
    h.leg.recv_event(event(CallEventKind::Disconnect { reason: None }, rtime));

    assert_eq!(h.signaling.take(), vec![Signal::Bye(None)]);
    assert_eq!(h.leg.state(), StateId::Disconnected);
    assert_eq!(h.leg.context().disconnect_ts, Some(rtime));
}

#[test]
fn test_timer_cancellation_is_idempotent() {
    let mut h = harness();
    let ctx = h.leg.context_mut();

    assert!(ctx.cancel_no_progress_timer());
    assert!(!ctx.cancel_no_progress_timer());
    assert!(!ctx.cancel_expire_timer());
    assert!(!ctx.cancel_expire_timer());
    assert!(ctx.no_progress_timer.is_none());
    assert!(ctx.expire_timer.is_none());
}

#[test]
fn test_expire_timer_fires_while_ringing() {
    let mut h = harness();
    h.leg.recv_event(event(CallEventKind::Ring(None), Instant::now()));
    h.signaling.take();

    h.scheduler.fire_all();

    assert_eq!(h.signaling.take(), vec![Signal::Expired]);
}
