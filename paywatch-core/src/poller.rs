//! The deposit payment-confirmation poller.
//!
//! [`DepositPoller`] owns the request → poll → terminate lifecycle for one
//! deposit attempt. After a payment is created it drives a bounded polling
//! loop against the status endpoint: each tick queries the transport, and
//! the session ends when the payment is confirmed, the attempt budget runs
//! out, or the session is cancelled or superseded.
//!
//! Ticks are strictly sequential — the loop awaits each query before
//! scheduling the next, so a session never has two queries in flight. The
//! at-most-one-active-session invariant is enforced structurally: the
//! poller stores the active task handle and aborts it before spawning a
//! replacement, and every session carries a generation token. Terminal
//! transitions claim the token under the same lock that serializes every
//! generation bump, so a session racing a cancel or restart either wins
//! the claim outright or does nothing: no callback and no state update
//! from a superseded session, ever.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use compact_str::CompactString;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::PollConfig;
use crate::presenter::Presenter;
use crate::transport::{DepositRequest, DepositResult, PaymentStatus, Transport, TransportError};

/// User-visible message when the attempt budget runs out.
///
/// A timeout is not an error: the payment may still confirm later, so the
/// message directs the user elsewhere instead of asking them to retry.
pub const TIMEOUT_MESSAGE: &str =
    "Payment not confirmed yet. Please check your dashboard later or contact support.";

/// User-visible message when deposit creation fails.
pub const CREATION_FAILED_MESSAGE: &str = "Failed to process deposit. Please try again.";

/// Observable state of the polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session running.
    Idle,
    /// A session is actively querying the status endpoint.
    Polling,
    /// Terminal: the payment was confirmed.
    Succeeded,
    /// Terminal: the attempt budget ran out without a confirmation.
    TimedOut,
}

/// Errors returned by [`DepositPoller::submit`].
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The request failed the fail-fast precondition check.
    #[error("invalid deposit request: {0}")]
    Invalid(&'static str),

    /// The creation call failed; the user must resubmit.
    #[error("deposit creation failed: {0}")]
    Creation(#[from] TransportError),
}

struct PollHandle {
    payment_id: CompactString,
    task: JoinHandle<()>,
}

/// Shared session bookkeeping: the generation counter plus the state
/// channel, both mutated only while the generation lock is held.
///
/// The lock is what makes terminal transitions race-free on multi-thread
/// runtimes: a session task that wants to finish must [`claim`] its token
/// under the lock, and a cancel or restart bumps the generation under the
/// same lock, so exactly one side observes itself as current.
///
/// [`claim`]: SessionLifecycle::claim_terminal
struct SessionLifecycle {
    generation: Mutex<u64>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionLifecycle {
    fn new() -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            generation: Mutex::new(0),
            state_tx,
        }
    }

    fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    // The guarded value is a plain counter, so a poisoned lock is still
    // coherent; recover the guard instead of propagating the panic.
    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidate the current session token. Resets an in-flight state to
    /// `Idle`; terminal states stay visible.
    fn invalidate(&self) {
        let mut generation = self.lock_generation();
        *generation += 1;
        if *self.state_tx.borrow() == SessionState::Polling {
            self.state_tx.send_replace(SessionState::Idle);
        }
    }

    /// Invalidate any current token and mint the next one, publishing
    /// `Polling` before the lock is released so the new session's state
    /// cannot be clobbered by a stale terminal send.
    fn begin(&self) -> u64 {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.state_tx.send_replace(SessionState::Polling);
        *generation
    }

    /// Whether `token` is still the live session. Advisory only — callers
    /// must still [`claim_terminal`] before acting.
    ///
    /// [`claim_terminal`]: SessionLifecycle::claim_terminal
    fn is_current(&self, token: u64) -> bool {
        *self.lock_generation() == token
    }

    /// Atomically claim the terminal transition for `token`.
    ///
    /// Fails if the token has been invalidated. On success the generation
    /// is bumped and `state` is published before the lock is released, so
    /// no concurrent cancel or restart can interleave between the check
    /// and the transition.
    fn claim_terminal(&self, token: u64, state: SessionState) -> bool {
        let mut generation = self.lock_generation();
        if *generation != token {
            return false;
        }
        *generation += 1;
        self.state_tx.send_replace(state);
        true
    }
}

/// Drives the deposit lifecycle for one deposit attempt.
///
/// At most one polling session is active per poller instance; starting a
/// new session cancels any prior one before activation.
pub struct DepositPoller<T, P> {
    transport: Arc<T>,
    presenter: Arc<P>,
    config: PollConfig,
    lifecycle: Arc<SessionLifecycle>,
    session: Option<PollHandle>,
}

impl<T, P> DepositPoller<T, P>
where
    T: Transport + 'static,
    P: Presenter + 'static,
{
    pub fn new(transport: Arc<T>, presenter: Arc<P>, config: PollConfig) -> Self {
        Self {
            transport,
            presenter,
            config,
            lifecycle: Arc::new(SessionLifecycle::new()),
            session: None,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    /// Subscribe to session state transitions.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.lifecycle.subscribe()
    }

    /// Whether a polling session is currently active.
    pub fn is_polling(&self) -> bool {
        self.state() == SessionState::Polling
    }

    /// Create a payment for `request`.
    ///
    /// Re-checks the preconditions (positive amount, non-empty currency)
    /// and fails fast without a network call if they do not hold. On
    /// success the presenter renders the deposit; on creation failure the
    /// presenter shows a user-facing message — never the raw error — and
    /// no session is started either way.
    pub async fn submit(&self, request: &DepositRequest) -> Result<DepositResult, SubmitError> {
        if request.amount <= Decimal::ZERO {
            return Err(SubmitError::Invalid("amount must be positive"));
        }
        if request.currency.trim().is_empty() {
            return Err(SubmitError::Invalid("currency must be selected"));
        }

        match self.transport.create_deposit(request).await {
            Ok(result) => {
                info!(
                    payment_id = %result.payment_id,
                    amount = %request.amount,
                    currency = %request.currency,
                    "Deposit created"
                );
                self.presenter.show_deposit(&result);
                Ok(result)
            }
            Err(e) => {
                error!(
                    amount = %request.amount,
                    currency = %request.currency,
                    error = %e,
                    "Deposit creation failed"
                );
                self.presenter.show_error(CREATION_FAILED_MESSAGE);
                Err(SubmitError::Creation(e))
            }
        }
    }

    /// Create a payment and immediately start watching it.
    pub async fn submit_and_poll(
        &mut self,
        request: &DepositRequest,
    ) -> Result<DepositResult, SubmitError> {
        let result = self.submit(request).await?;
        self.start_polling(result.payment_id.clone());
        Ok(result)
    }

    /// Start a polling session for `payment_id` with the poller's config.
    ///
    /// Unconditionally supersedes any prior session (cancel-then-replace).
    pub fn start_polling(&mut self, payment_id: impl Into<CompactString>) {
        self.start_polling_with(payment_id, self.config)
    }

    /// Start a polling session with an explicit per-session config.
    pub fn start_polling_with(&mut self, payment_id: impl Into<CompactString>, config: PollConfig) {
        let payment_id = payment_id.into();
        self.cancel_session();

        let token = self.lifecycle.begin();
        debug!(%payment_id, token, "Starting polling session");

        let task = tokio::spawn(poll_session(
            Arc::clone(&self.transport),
            Arc::clone(&self.presenter),
            Arc::clone(&self.lifecycle),
            token,
            payment_id.clone(),
            config,
        ));

        self.session = Some(PollHandle { payment_id, task });
    }

    /// Stop any active session. Silent, idempotent, safe in every state.
    pub fn cancel(&mut self) {
        self.cancel_session();
    }

    fn cancel_session(&mut self) {
        if let Some(handle) = self.session.take() {
            handle.task.abort();
            debug!(payment_id = %handle.payment_id, "Cancelled polling session");
        }
        self.lifecycle.invalidate();
    }
}

impl<T, P> Drop for DepositPoller<T, P> {
    fn drop(&mut self) {
        if let Some(handle) = self.session.take() {
            handle.task.abort();
        }
    }
}

/// One polling session: sleep, query, process, repeat.
///
/// Every terminal action claims the session token via
/// [`SessionLifecycle::claim_terminal`]; a response processed concurrently
/// with a cancel or restart loses the claim and is dropped, so the
/// presenter never hears from a superseded session.
async fn poll_session<T, P>(
    transport: Arc<T>,
    presenter: Arc<P>,
    lifecycle: Arc<SessionLifecycle>,
    token: u64,
    payment_id: CompactString,
    config: PollConfig,
) where
    T: Transport,
    P: Presenter,
{
    let mut completed_ticks: u32 = 0;

    loop {
        tokio::time::sleep(config.delay(completed_ticks)).await;
        if !lifecycle.is_current(token) {
            debug!(%payment_id, "Session superseded while waiting, stopping");
            return;
        }

        match transport.get_status(&payment_id).await {
            Ok(PaymentStatus::Completed) => {
                if !lifecycle.claim_terminal(token, SessionState::Succeeded) {
                    debug!(%payment_id, "Discarding stale completion");
                    return;
                }
                info!(%payment_id, ticks = completed_ticks + 1, "Payment confirmed");
                presenter.on_success();
                return;
            }
            Ok(PaymentStatus::Pending) => {
                completed_ticks += 1;
                debug!(
                    %payment_id,
                    attempt = completed_ticks,
                    max_attempts = config.max_attempts,
                    "Payment still pending"
                );
            }
            Err(e) => {
                // Transient failure: logged and counted against the attempt
                // budget so a stuck failure loop still terminates, but the
                // session stays in Polling and the user is not notified.
                completed_ticks += 1;
                warn!(
                    %payment_id,
                    attempt = completed_ticks,
                    error = %e,
                    "Status query failed"
                );
            }
        }

        if completed_ticks >= config.max_attempts {
            if !lifecycle.claim_terminal(token, SessionState::TimedOut) {
                debug!(%payment_id, "Discarding stale timeout");
                return;
            }
            info!(
                %payment_id,
                ticks = completed_ticks,
                "Attempt budget exhausted without confirmation"
            );
            presenter.on_timeout(TIMEOUT_MESSAGE);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    enum Event {
        ShowDeposit(CompactString),
        ShowError(String),
        Success,
        Timeout,
    }

    #[derive(Default)]
    struct RecordingPresenter {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingPresenter {
        fn events(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| format!("{e:?}"))
                .collect()
        }

        fn count(&self, matcher: impl Fn(&Event) -> bool) -> usize {
            self.events.lock().unwrap().iter().filter(|e| matcher(e)).count()
        }
    }

    impl Presenter for RecordingPresenter {
        fn show_deposit(&self, result: &DepositResult) {
            self.events
                .lock()
                .unwrap()
                .push(Event::ShowDeposit(result.payment_id.clone()));
        }

        fn show_error(&self, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Event::ShowError(message.to_string()));
        }

        fn on_success(&self) {
            self.events.lock().unwrap().push(Event::Success);
        }

        fn on_timeout(&self, _message: &str) {
            self.events.lock().unwrap().push(Event::Timeout);
        }
    }

    /// Transport that replays a scripted status sequence.
    ///
    /// An exhausted script keeps answering `Pending`. When a gate is set,
    /// the first status query signals `started`, blocks on `release`, and
    /// then reports `Completed` without consuming the script.
    #[derive(Default)]
    struct ScriptedTransport {
        create: Mutex<Option<Result<DepositResult, TransportError>>>,
        statuses: Mutex<VecDeque<Result<PaymentStatus, TransportError>>>,
        status_calls: AtomicU32,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl ScriptedTransport {
        fn with_statuses(
            statuses: impl IntoIterator<Item = Result<PaymentStatus, TransportError>>,
        ) -> Self {
            Self {
                statuses: Mutex::new(statuses.into_iter().collect()),
                ..Self::default()
            }
        }

        fn status_calls(&self) -> u32 {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn create_deposit(
            &self,
            _request: &DepositRequest,
        ) -> Result<DepositResult, TransportError> {
            self.create
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(sample_result()))
        }

        async fn get_status(&self, _payment_id: &str) -> Result<PaymentStatus, TransportError> {
            let call = self.status_calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                if let Some((started, release)) = &self.gate {
                    started.notify_one();
                    release.notified().await;
                    return Ok(PaymentStatus::Completed);
                }
            }
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(PaymentStatus::Pending))
        }
    }

    fn sample_result() -> DepositResult {
        DepositResult {
            payment_id: "5745459419".into(),
            pay_address: "3EZ2uTdVDAMWJisRyfyLVTq7F6HFXzJbgS".into(),
            pay_amount: Decimal::new(171203, 8),
            qr_code_url: "https://example.com/qr.png".into(),
        }
    }

    fn fast_config(max_attempts: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(1),
            max_attempts,
            ..PollConfig::default()
        }
    }

    fn poller(
        transport: Arc<ScriptedTransport>,
        config: PollConfig,
    ) -> (
        DepositPoller<ScriptedTransport, RecordingPresenter>,
        Arc<RecordingPresenter>,
    ) {
        let presenter = Arc::new(RecordingPresenter::default());
        let poller = DepositPoller::new(transport, Arc::clone(&presenter), config);
        (poller, presenter)
    }

    async fn wait_for(rx: &mut watch::Receiver<SessionState>, state: SessionState) {
        loop {
            if *rx.borrow_and_update() == state {
                return;
            }
            rx.changed().await.unwrap();
        }
    }

    #[tokio::test]
    async fn submit_success_presents_deposit() {
        let transport = Arc::new(ScriptedTransport::default());
        let (poller, presenter) = poller(Arc::clone(&transport), PollConfig::default());

        let request = DepositRequest {
            amount: Decimal::new(100, 0),
            currency: "btc".into(),
        };
        let result = poller.submit(&request).await.unwrap();

        assert_eq!(result.payment_id, "5745459419");
        assert_eq!(
            presenter.events(),
            vec!["ShowDeposit(\"5745459419\")".to_string()]
        );
        assert_eq!(poller.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn submit_failure_presents_user_message_and_no_session() {
        let transport = Arc::new(ScriptedTransport {
            create: Mutex::new(Some(Err(TransportError::Rejected("boom".into())))),
            ..ScriptedTransport::default()
        });
        let (poller, presenter) = poller(Arc::clone(&transport), PollConfig::default());

        let request = DepositRequest {
            amount: Decimal::new(100, 0),
            currency: "btc".into(),
        };
        let err = poller.submit(&request).await.unwrap_err();

        assert!(matches!(err, SubmitError::Creation(_)));
        let events = presenter.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::ShowError(message) => {
                assert_eq!(message, CREATION_FAILED_MESSAGE);
                assert!(!message.contains("boom"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        drop(events);
        assert_eq!(poller.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn submit_fails_fast_on_bad_input() {
        let transport = Arc::new(ScriptedTransport::default());
        let (poller, presenter) = poller(Arc::clone(&transport), PollConfig::default());

        let zero = DepositRequest {
            amount: Decimal::ZERO,
            currency: "btc".into(),
        };
        assert!(matches!(
            poller.submit(&zero).await,
            Err(SubmitError::Invalid(_))
        ));

        let blank = DepositRequest {
            amount: Decimal::new(100, 0),
            currency: "  ".into(),
        };
        assert!(matches!(
            poller.submit(&blank).await,
            Err(SubmitError::Invalid(_))
        ));

        assert!(presenter.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn completed_tick_finishes_session() {
        let transport =
            Arc::new(ScriptedTransport::with_statuses([Ok(PaymentStatus::Completed)]));
        let (mut poller, presenter) = poller(Arc::clone(&transport), fast_config(20));
        let mut rx = poller.watch_state();

        poller.start_polling("pay-1");
        wait_for(&mut rx, SessionState::Succeeded).await;

        assert_eq!(transport.status_calls(), 1);
        assert_eq!(presenter.count(|e| *e == Event::Success), 1);

        // Terminal: no further ticks however long we wait.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.status_calls(), 1);
        assert_eq!(presenter.count(|e| *e == Event::Success), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_exhausts_budget_exactly() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut poller, presenter) = poller(Arc::clone(&transport), fast_config(3));
        let mut rx = poller.watch_state();

        poller.start_polling("pay-1");
        wait_for(&mut rx, SessionState::TimedOut).await;

        // Exactly max_attempts ticks, never more.
        assert_eq!(transport.status_calls(), 3);
        assert_eq!(presenter.count(|e| *e == Event::Timeout), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.status_calls(), 3);
        assert_eq!(presenter.count(|e| *e == Event::Timeout), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_do_not_block_success() {
        let transport = Arc::new(ScriptedTransport::with_statuses([
            Err(TransportError::Rejected("connect reset".into())),
            Err(TransportError::Rejected("connect reset".into())),
            Err(TransportError::Rejected("connect reset".into())),
            Ok(PaymentStatus::Completed),
        ]));
        let (mut poller, presenter) = poller(Arc::clone(&transport), fast_config(4));
        let mut rx = poller.watch_state();

        poller.start_polling("pay-1");
        wait_for(&mut rx, SessionState::Succeeded).await;

        assert_eq!(transport.status_calls(), 4);
        assert_eq!(presenter.count(|e| *e == Event::Success), 1);
        assert_eq!(presenter.count(|e| *e == Event::Timeout), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_failures_surface_as_timeout() {
        let transport = Arc::new(ScriptedTransport::with_statuses([
            Err(TransportError::Rejected("down".into())),
            Err(TransportError::Rejected("down".into())),
            Err(TransportError::Rejected("down".into())),
        ]));
        let (mut poller, presenter) = poller(Arc::clone(&transport), fast_config(3));
        let mut rx = poller.watch_state();

        poller.start_polling("pay-1");
        wait_for(&mut rx, SessionState::TimedOut).await;

        // Repeated query failure is reported as a timeout, not an error.
        assert_eq!(presenter.count(|e| *e == Event::Timeout), 1);
        assert_eq!(presenter.count(|e| matches!(e, Event::ShowError(_))), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_stops_ticks() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut poller, presenter) = poller(Arc::clone(&transport), fast_config(20));

        poller.start_polling("pay-1");
        tokio::time::sleep(Duration::from_millis(2500)).await;
        let calls_at_cancel = transport.status_calls();
        assert!(calls_at_cancel >= 2);

        poller.cancel();
        poller.cancel();
        assert_eq!(poller.state(), SessionState::Idle);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.status_calls(), calls_at_cancel);
        assert!(presenter.events().is_empty());
    }

    // The interleaving a paused-clock test cannot pin down: the worker has
    // already observed its token as current when the owner restarts. The
    // claim must lose and leave the fresh session's state untouched.
    #[test]
    fn terminal_claim_loses_to_concurrent_restart() {
        let lifecycle = SessionLifecycle::new();
        let stale = lifecycle.begin();
        assert!(lifecycle.is_current(stale));

        // Owner supersedes between the worker's check and its claim.
        lifecycle.invalidate();
        let fresh = lifecycle.begin();

        assert!(!lifecycle.claim_terminal(stale, SessionState::Succeeded));
        assert_eq!(lifecycle.state(), SessionState::Polling);

        // The fresh session still owns its terminal transition.
        assert!(lifecycle.claim_terminal(fresh, SessionState::TimedOut));
        assert_eq!(lifecycle.state(), SessionState::TimedOut);
    }

    #[test]
    fn terminal_claim_is_exclusive() {
        let lifecycle = SessionLifecycle::new();
        let token = lifecycle.begin();

        assert!(lifecycle.claim_terminal(token, SessionState::Succeeded));
        assert!(!lifecycle.claim_terminal(token, SessionState::Succeeded));

        // Cancelling after the claim leaves the terminal state visible.
        lifecycle.invalidate();
        assert_eq!(lifecycle.state(), SessionState::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_supersedes_in_flight_session() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let transport = Arc::new(ScriptedTransport {
            gate: Some((Arc::clone(&started), Arc::clone(&release))),
            ..ScriptedTransport::default()
        });
        let (mut poller, presenter) = poller(Arc::clone(&transport), fast_config(2));
        let mut rx = poller.watch_state();

        // First session reaches its first query and blocks inside it.
        poller.start_polling("pay-stale");
        started.notified().await;

        // Superseding while that query is in flight: the stale session's
        // `Completed` answer must not fire any callback.
        poller.start_polling("pay-fresh");
        release.notify_one();
        tokio::task::yield_now().await;
        assert_eq!(presenter.count(|e| *e == Event::Success), 0);

        // The fresh session runs to its own conclusion.
        wait_for(&mut rx, SessionState::TimedOut).await;
        assert_eq!(presenter.count(|e| *e == Event::Success), 0);
        assert_eq!(presenter.count(|e| *e == Event::Timeout), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_restarts_leave_one_active_session() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut poller, presenter) = poller(Arc::clone(&transport), fast_config(2));
        let mut rx = poller.watch_state();

        for i in 0..5 {
            poller.start_polling(format!("pay-{i}"));
        }
        wait_for(&mut rx, SessionState::TimedOut).await;

        // Only the final session ever ticked.
        assert_eq!(transport.status_calls(), 2);
        assert_eq!(presenter.count(|e| *e == Event::Timeout), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn default_cadence_confirms_on_final_tick() {
        let mut script: Vec<Result<PaymentStatus, TransportError>> =
            (0..19).map(|_| Ok(PaymentStatus::Pending)).collect();
        script.push(Ok(PaymentStatus::Completed));
        let transport = Arc::new(ScriptedTransport::with_statuses(script));
        let (mut poller, presenter) = poller(Arc::clone(&transport), PollConfig::default());
        let mut rx = poller.watch_state();

        let started_at = Instant::now();
        poller.start_polling("pay-1");
        wait_for(&mut rx, SessionState::Succeeded).await;

        assert_eq!(transport.status_calls(), 20);
        assert_eq!(presenter.count(|e| *e == Event::Success), 1);
        assert!(started_at.elapsed() >= Duration::from_secs(19 * 30));
    }

    #[tokio::test(start_paused = true)]
    async fn default_cadence_times_out_after_ten_minutes() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut poller, presenter) = poller(Arc::clone(&transport), PollConfig::default());
        let mut rx = poller.watch_state();

        let started_at = Instant::now();
        poller.start_polling("pay-1");
        wait_for(&mut rx, SessionState::TimedOut).await;

        assert_eq!(transport.status_calls(), 20);
        assert_eq!(presenter.count(|e| *e == Event::Timeout), 1);
        assert!(started_at.elapsed() >= Duration::from_secs(20 * 30));
    }

    #[tokio::test(start_paused = true)]
    async fn submit_and_poll_runs_to_confirmation() {
        let transport =
            Arc::new(ScriptedTransport::with_statuses([Ok(PaymentStatus::Completed)]));
        let (mut poller, presenter) = poller(Arc::clone(&transport), fast_config(20));
        let mut rx = poller.watch_state();

        let request = DepositRequest {
            amount: Decimal::new(100, 0),
            currency: "btc".into(),
        };
        let result = poller.submit_and_poll(&request).await.unwrap();
        assert_eq!(poller.state(), SessionState::Polling);

        wait_for(&mut rx, SessionState::Succeeded).await;
        assert_eq!(
            presenter.count(|e| *e == Event::ShowDeposit(result.payment_id.clone())),
            1
        );
        assert_eq!(presenter.count(|e| *e == Event::Success), 1);
    }
}
