//! Parent-side run orchestration.
//!
//! The runner owns everything that happens around gesture dispatch: frame
//! message routing, whole-step delegation into child frames, before-unload
//! and download disambiguation, native-dialog policy and the uncaught
//! script-error policy. Failures funnel through [`Runner::fail`], which
//! stamps step context, hands the record to the step iterator and surfaces
//! a test-failed event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use enact_core_types::timing::{ANIMATIONS_SETTLE_DELAY, FILE_DOWNLOAD_POLL};
use enact_core_types::{ErrorKind, ErrorRecord, WindowId};
use enact_event_bus::InMemoryBus;
use enact_frame_sync::{
    cmd, FrameBus, FrameChannel, FrameEnvelope, FrameMessage, RequestId, StepDelegation,
};
use enact_page_adapter::{ActionTargetSpec, DialogEvent, PageEvent};
use enact_step_context::{StepState, WaitingFlags};

use crate::context::RunnerContext;
use crate::events::RunnerEvent;
use crate::frames::normalize_frame_target;

/// How long a frame gets to answer the existence ping before a delegated
/// step is declared unreachable.
const FRAME_PING_TIMEOUT: Duration = Duration::from_millis(7000);

/// Orchestrates one document's test run.
///
/// Created once per document; [`Runner::reset`] clears everything a
/// finished run may have left behind so the next one starts clean.
pub struct Runner {
    ctx: RunnerContext,
    bus: Arc<FrameBus>,
    delegation: Arc<StepDelegation>,
    events: Arc<InMemoryBus<RunnerEvent>>,
    stopped: AtomicBool,
    listen_native_dialogs: AtomicBool,
    /// A delegated frame reported target waiting and has not reported the
    /// action run yet. Decides whether its step is rerun or skipped when
    /// the frame goes away.
    frame_waiting: AtomicBool,
    download_watch: Mutex<Option<CancellationToken>>,
    delegation_task: Mutex<Option<JoinHandle<()>>>,
    listener_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Runner {
    pub fn new(ctx: RunnerContext, channel: Arc<dyn FrameChannel>) -> Arc<Self> {
        let listen_dialogs = ctx.settings.read().native_dialogs_info.is_some();
        let bus = FrameBus::new(channel);
        let delegation = StepDelegation::new(bus.clone());
        let runner = Arc::new(Self {
            ctx,
            bus,
            delegation,
            events: InMemoryBus::new(64),
            stopped: AtomicBool::new(false),
            listen_native_dialogs: AtomicBool::new(listen_dialogs),
            frame_waiting: AtomicBool::new(false),
            download_watch: Mutex::new(None),
            delegation_task: Mutex::new(None),
            listener_tasks: Mutex::new(Vec::new()),
        });
        runner.install_frame_handlers();
        runner.spawn_page_listeners();
        runner
    }

    /// Bus carrying the runner's progress notifications.
    pub fn events(&self) -> Arc<InMemoryBus<RunnerEvent>> {
        self.events.clone()
    }

    /// Wait for the page, then open the run. With `skip_page_waiting` the
    /// readiness waits are bypassed entirely.
    pub async fn start(&self, skip_page_waiting: bool) {
        if !skip_page_waiting {
            self.ctx.readiness.document_ready().await;
            sleep(ANIMATIONS_SETTLE_DELAY).await;
            let (collection, additional) = {
                let settings = self.ctx.settings.read();
                (
                    Duration::from_millis(settings.requests_collection_delay_ms),
                    Duration::from_millis(settings.additional_requests_collection_delay_ms),
                )
            };
            self.ctx.readiness.requests_settled(collection, additional).await;
        }
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        self.listen_native_dialogs.store(true, Ordering::SeqCst);
        self.events.publish_lossy(RunnerEvent::TestStarted);
    }

    /// All steps ran; the run is over.
    pub fn complete(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.events.publish_lossy(RunnerEvent::TestCompleted);
    }

    /// Halt the run: cancel the download watch, abandon any delegated step
    /// and stop the step machinery.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.clear_download_watch();
        self.clear_delegation_task();
        self.ctx.iterator.stop();
    }

    /// Clear everything a run leaves behind so the next one starts clean.
    pub fn reset(&self) {
        self.stopped.store(false, Ordering::SeqCst);
        self.frame_waiting.store(false, Ordering::SeqCst);
        self.clear_download_watch();
        self.clear_delegation_task();
        *self.ctx.iterator.state().write() = StepState::default();
    }

    /// Report a failure the runner itself detected. The record picks up the
    /// current step context when it carries none, goes to the step iterator
    /// once, and surfaces as a test-failed event.
    pub fn fail(&self, record: ErrorRecord) -> ErrorRecord {
        let record = if record.needs_step_context() {
            let name = self.ctx.iterator.current_step_name().unwrap_or_default();
            record.with_step(name, self.ctx.iterator.current_step())
        } else {
            record
        };
        warn!(kind = %record.kind, "test run failed");
        self.ctx.iterator.on_error(record.clone());
        self.emit_failure(record.clone());
        record
    }

    /// Surface a failure that already went through the step iterator.
    pub fn emit_failure(&self, record: ErrorRecord) {
        let step_num = self.ctx.iterator.current_step() - 1;
        self.events
            .publish_lossy(RunnerEvent::TestFailed { step_num, record });
    }

    /// The local iterator moved to its next step.
    pub fn on_next_step_started(&self) {
        self.clear_download_watch();
        self.events.publish_lossy(RunnerEvent::NextStepStarted {
            step: self.ctx.iterator.current_step(),
        });
    }

    /// Mirror of the iterator's target-waiting notification, also used for
    /// waits reported by delegated frames.
    pub fn notify_target_waiting_started(&self, flags: WaitingFlags) {
        self.events
            .publish_lossy(RunnerEvent::ActionTargetWaitingStarted { flags });
    }

    pub fn notify_action_run(&self) {
        self.events.publish_lossy(RunnerEvent::ActionRun);
    }

    /// Capture the page into `file_path`, bracketed by the screenshot
    /// progress events. Frame-side requests relay through here too.
    pub async fn take_screenshot(&self, file_path: &str) {
        self.events.publish_lossy(RunnerEvent::ScreenshotStarted {
            file_path: file_path.to_string(),
        });
        self.ctx.screenshots.take(file_path).await;
        self.events.publish_lossy(RunnerEvent::ScreenshotFinished {
            file_path: file_path.to_string(),
        });
    }

    /// Run the current step inside the frame `frame` denotes. The argument
    /// must reduce to exactly one iframe element; the step body travels to
    /// the frame's own engine and the local iterator resumes once the frame
    /// reports completion or disappears.
    pub async fn run_in_frame(
        self: &Arc<Self>,
        frame: ActionTargetSpec,
        body: Value,
    ) -> Result<(), ErrorRecord> {
        let node = match normalize_frame_target(&frame, &self.ctx.query, &self.ctx.inspector).await
        {
            Ok(node) => node,
            Err(kind) => return Err(self.fail(ErrorRecord::new(kind))),
        };
        let window = match self.ctx.inspector.content_window(&node).await {
            Some(window) => window,
            None => {
                return Err(self.fail(ErrorRecord::new(ErrorKind::InIFrameTargetLoadingTimeout)))
            }
        };

        let step_num = self.ctx.iterator.current_step();
        let step_name = self.ctx.iterator.current_step_name().unwrap_or_default();
        self.ctx.iterator.state().write().in_async_action = true;
        debug!(window = %window, step = step_num, "delegating step to frame");

        let weak = Arc::downgrade(self);
        let delegation = self.delegation.clone();
        let inspector = self.ctx.inspector.clone();
        let task = tokio::spawn(async move {
            let result = delegation
                .run(&window, &step_name, step_num, body, FRAME_PING_TIMEOUT, {
                    let node = node.clone();
                    move || {
                        let inspector = inspector.clone();
                        let node = node.clone();
                        async move { inspector.is_in_document(&node).await }
                    }
                })
                .await;
            let Some(runner) = weak.upgrade() else { return };
            match result {
                Ok(outcome) => {
                    debug!(?outcome, "delegated step finished");
                    runner.on_frame_step_executed();
                }
                Err(record) => {
                    runner.fail(record);
                }
            }
        });
        if let Some(previous) = self.delegation_task.lock().replace(task) {
            previous.abort();
        }
        Ok(())
    }

    /// The delegated step is over, completed or abandoned. A frame that was
    /// still waiting for an action target gets its step rerun; otherwise
    /// iteration moves on.
    fn on_frame_step_executed(&self) {
        {
            let state = self.ctx.iterator.state();
            let mut state = state.write();
            state.delegated_frame = None;
            state.in_async_action = false;
        }
        if self.frame_waiting.swap(false, Ordering::SeqCst) {
            self.ctx.iterator.rerun_last_step();
        } else {
            self.ctx.iterator.run_next_step();
        }
    }

    fn route_step_completed(&self, from: &WindowId) {
        let (awaited, delegated) = {
            let state = self.ctx.iterator.state();
            let state = state.read();
            (state.awaited_frame.clone(), state.delegated_frame.clone())
        };
        if awaited.as_ref() == Some(from) {
            self.ctx.iterator.on_frame_action_completed();
        } else if delegated.as_ref() == Some(from) {
            self.delegation.complete();
        } else {
            debug!(window = %from, "step completion from an untracked window");
        }
    }

    fn on_frame_assertion_failed(&self, mut err: Value) {
        if self.ctx.settings.read().playback {
            self.ctx.iterator.state().write().delegated_frame = None;
        }
        let step_num = self.ctx.iterator.current_step() - 1;
        if let Some(fields) = err.as_object_mut() {
            fields.insert("stepNum".to_string(), Value::from(step_num));
        }
        self.events
            .publish_lossy(RunnerEvent::AssertionFailed { step_num, err });
    }

    fn on_dialogs_info_changed(&self, info: Value) {
        self.ctx.settings.write().native_dialogs_info = Some(info.clone());
        self.events
            .publish_lossy(RunnerEvent::NativeDialogsInfoChanged { info });
    }

    fn on_dialog_event(&self, event: DialogEvent) {
        match event {
            DialogEvent::Unexpected { dialog, message } => {
                if self.listen_native_dialogs.load(Ordering::SeqCst) {
                    self.fail(
                        ErrorRecord::new(ErrorKind::UnexpectedDialog)
                            .with_dialog(dialog)
                            .with_dialog_message(message),
                    );
                }
            }
            DialogEvent::ExpectedMissing { dialog } => {
                if self.listen_native_dialogs.load(Ordering::SeqCst) {
                    self.fail(
                        ErrorRecord::new(ErrorKind::ExpectedDialogDoesntAppear).with_dialog(dialog),
                    );
                }
            }
            DialogEvent::InfoChanged { info } => self.on_dialogs_info_changed(info),
        }
    }

    fn on_page_event(self: &Arc<Self>, event: PageEvent) {
        match event {
            PageEvent::UncaughtJsError {
                message,
                page_url,
                in_iframe,
            } => {
                let (skip_js_errors, recording, playback) = {
                    let settings = self.ctx.settings.read();
                    (settings.skip_js_errors, settings.recording, settings.playback)
                };
                if in_iframe && !playback {
                    // The frame's own iteration cannot continue past this.
                    self.ctx.iterator.stop();
                } else if !skip_js_errors || recording {
                    self.fail(
                        ErrorRecord::new(ErrorKind::UncaughtJsError)
                            .with_script_err(message)
                            .with_page_error(page_url),
                    );
                }
            }
            PageEvent::BeforeUnload => {
                self.ctx.iterator.state().write().page_unloading = true;
                self.start_download_watch(None);
            }
            PageEvent::Unload => {
                self.clear_download_watch();
            }
        }
    }

    /// Poll the transport for the file-downloading flag. Once it is seen,
    /// either resume the suspended local step or answer the frame that
    /// asked. The watch dies on cancellation; a new step or an unload
    /// cancels it.
    fn start_download_watch(self: &Arc<Self>, reply_to: Option<(WindowId, RequestId)>) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        let token = CancellationToken::new();
        {
            let mut slot = self.download_watch.lock();
            if let Some(previous) = slot.replace(token.clone()) {
                previous.cancel();
            }
        }
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = sleep(FILE_DOWNLOAD_POLL) => {}
                }
                let Some(runner) = weak.upgrade() else { return };
                if !runner.ctx.transport.take_file_downloading_flag().await {
                    continue;
                }
                {
                    let mut slot = runner.download_watch.lock();
                    if token.is_cancelled() {
                        return;
                    }
                    slot.take();
                }
                match &reply_to {
                    Some((to, request_id)) => {
                        runner
                            .bus
                            .send(to, FrameMessage::BeforeUnloadResponse {
                                request_id: *request_id,
                            })
                            .await;
                    }
                    None => {
                        {
                            let state = runner.ctx.iterator.state();
                            let mut state = state.write();
                            if let Some(delay) = state.step_delay.take() {
                                delay.cancel();
                            }
                            state.page_unloading = false;
                        }
                        runner.ctx.iterator.resume_step();
                    }
                }
                return;
            }
        });
    }

    fn clear_download_watch(&self) {
        if let Some(token) = self.download_watch.lock().take() {
            token.cancel();
        }
    }

    fn clear_delegation_task(&self) {
        if let Some(task) = self.delegation_task.lock().take() {
            task.abort();
        }
    }

    fn on_frame_cmd<F>(self: &Arc<Self>, command: &'static str, apply: F)
    where
        F: Fn(&Arc<Runner>, FrameEnvelope) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(self);
        self.bus.on(command, move |envelope| {
            if let Some(runner) = weak.upgrade() {
                apply(&runner, envelope);
            }
        });
    }

    fn install_frame_handlers(self: &Arc<Self>) {
        self.on_frame_cmd(cmd::STEP_COMPLETED, |runner, env| {
            runner.route_step_completed(&env.from);
        });

        self.on_frame_cmd(cmd::ERROR, |runner, env| {
            if let FrameMessage::Error { record } = env.message {
                runner.clear_delegation_task();
                runner.fail(record);
            }
        });

        self.on_frame_cmd(cmd::FAILED_ASSERTION, |runner, env| {
            if let FrameMessage::FailedAssertion { err } = env.message {
                runner.on_frame_assertion_failed(err);
            }
        });

        self.on_frame_cmd(cmd::GET_SHARED_DATA_REQUEST, |runner, env| {
            if let FrameMessage::GetSharedDataRequest { request_id } = env.message {
                let data = runner.ctx.iterator.shared_data();
                let bus = runner.bus.clone();
                let to = env.from.clone();
                tokio::spawn(async move {
                    bus.send(&to, FrameMessage::GetSharedDataResponse { request_id, data })
                        .await;
                });
            }
        });

        self.on_frame_cmd(cmd::SET_SHARED_DATA, |runner, env| {
            if let FrameMessage::SetSharedData { data } = env.message {
                runner.ctx.iterator.set_shared_data(data);
            }
        });

        self.on_frame_cmd(cmd::NEXT_STEP_STARTED, |runner, env| {
            runner.ctx.iterator.state().write().delegated_frame = Some(env.from.clone());
            runner.clear_download_watch();
        });

        self.on_frame_cmd(cmd::ACTION_TARGET_WAITING_STARTED, |runner, env| {
            if let FrameMessage::ActionTargetWaitingStarted {
                max_timeout_ms,
                is_wait_action,
            } = env.message
            {
                runner.frame_waiting.store(true, Ordering::SeqCst);
                runner.notify_target_waiting_started(WaitingFlags {
                    max_timeout_ms,
                    is_wait_action,
                });
            }
        });

        self.on_frame_cmd(cmd::ACTION_RUN, |runner, _env| {
            runner.frame_waiting.store(false, Ordering::SeqCst);
            runner.notify_action_run();
        });

        self.on_frame_cmd(cmd::WAITING_STEP_COMPLETION_REQUEST, |runner, env| {
            if let FrameMessage::WaitingStepCompletionRequest { request_id } = env.message {
                let tracked = {
                    let state = runner.ctx.iterator.state();
                    let state = state.read();
                    state.awaited_frame.as_ref() == Some(&env.from)
                        || state.delegated_frame.as_ref() == Some(&env.from)
                };
                if tracked {
                    let bus = runner.bus.clone();
                    let to = env.from.clone();
                    tokio::spawn(async move {
                        bus.send(&to, FrameMessage::WaitingStepCompletionResponse { request_id })
                            .await;
                    });
                } else {
                    debug!(window = %env.from, "liveness probe from an untracked window ignored");
                }
            }
        });

        self.on_frame_cmd(cmd::TAKE_SCREENSHOT_REQUEST, |runner, env| {
            if let FrameMessage::TakeScreenshotRequest {
                request_id,
                file_path,
            } = env.message
            {
                let runner = runner.clone();
                let to = env.from.clone();
                tokio::spawn(async move {
                    runner.take_screenshot(&file_path).await;
                    runner
                        .bus
                        .send(&to, FrameMessage::TakeScreenshotResponse { request_id })
                        .await;
                });
            }
        });

        self.on_frame_cmd(cmd::NATIVE_DIALOGS_INFO_CHANGED, |runner, env| {
            if let FrameMessage::NativeDialogsInfoChanged { info } = env.message {
                runner.on_dialogs_info_changed(info);
            }
        });

        self.on_frame_cmd(cmd::BEFORE_UNLOAD_REQUEST, |runner, env| {
            if let FrameMessage::BeforeUnloadRequest { request_id } = env.message {
                runner.notify_action_run();
                runner.start_download_watch(Some((env.from.clone(), request_id)));
            }
        });
    }

    fn spawn_page_listeners(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let mut dialog_rx = self.ctx.dialog_events.subscribe();
        let dialogs = tokio::spawn(async move {
            while let Ok(event) = dialog_rx.recv().await {
                let Some(runner) = weak.upgrade() else { return };
                runner.on_dialog_event(event);
            }
        });

        let weak = Arc::downgrade(self);
        let mut page_rx = self.ctx.page_events.subscribe();
        let pages = tokio::spawn(async move {
            while let Ok(event) = page_rx.recv().await {
                let Some(runner) = weak.upgrade() else { return };
                runner.on_page_event(event);
            }
        });

        let mut tasks = self.listener_tasks.lock();
        tasks.push(dialogs);
        tasks.push(pages);
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.clear_download_watch();
        self.clear_delegation_task();
        for task in self.listener_tasks.lock().drain(..) {
            task.abort();
        }
    }
}
