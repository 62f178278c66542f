use std::sync::Arc;

use tracing::debug;

use enact_core_types::{ErrorKind, ErrorRecord, GestureName};
use enact_page_adapter::{TargetInput, TypeOptions};
use enact_step_context::ActionFuture;

use crate::args::{parse_file_paths, parse_select_args, CallArg, FilePathsArg};
use crate::dispatcher::{ActionDispatcher, TargetGesture};

impl ActionDispatcher {
    /// Type `text` into the targets. Empty text fails before any target
    /// resolves.
    pub async fn type_text(
        self: &Arc<Self>,
        input: impl Into<TargetInput>,
        text: impl Into<String>,
        options: TypeOptions,
    ) -> Result<(), ErrorRecord> {
        let text = text.into();
        if text.is_empty() {
            let record =
                ErrorRecord::new(ErrorKind::EmptyTypeActionArgument).with_action(GestureName::Type);
            return Err(self.fail(record));
        }
        self.dispatch_series(
            input.into(),
            GestureName::Type,
            TargetGesture::Type { text, options },
        )
        .await
    }

    /// Select content of the targets. The positional arguments decide
    /// between a character span and a node-to-node range; an argument list
    /// that fits neither fails before any target resolves.
    pub async fn select(
        self: &Arc<Self>,
        input: impl Into<TargetInput>,
        args: Vec<CallArg>,
    ) -> Result<(), ErrorRecord> {
        let parsed = match parse_select_args(&args) {
            Some(parsed) => parsed,
            None => {
                let record = ErrorRecord::new(ErrorKind::IncorrectSelectActionArguments)
                    .with_action(GestureName::Select);
                return Err(self.fail(record));
            }
        };
        self.dispatch_series(input.into(), GestureName::Select, TargetGesture::Select(parsed))
            .await
    }

    /// Press key sequences against the dispatcher's own window. Targetless;
    /// never announces waiting or an action run.
    pub async fn press(self: &Arc<Self>, sequence: &str) -> Result<(), ErrorRecord> {
        let combinations = match self.ctx.key_parser.parse(sequence) {
            Ok(combinations) => combinations,
            Err(err) => {
                debug!(%err, "press argument rejected");
                let record = ErrorRecord::new(ErrorKind::IncorrectPressActionArgument)
                    .with_action(GestureName::Press);
                return Err(self.fail(record));
            }
        };
        let this = Arc::clone(self);
        let action: ActionFuture = Box::pin(async move {
            let set = this.ctx.automations.automations(&this.ctx.local_window);
            if let Err(rejection) = set.press(combinations).run().await {
                let record = ErrorRecord::new(ErrorKind::UncaughtJsError)
                    .with_script_err(rejection.to_string())
                    .with_action(GestureName::Press);
                return Err(this.fail(record));
            }
            Ok(())
        });
        self.ctx.iterator.async_action(action).await
    }

    /// Attach files to the target inputs. An unusable paths argument is
    /// reported but does not stop the call; it proceeds with no files.
    pub async fn upload(
        self: &Arc<Self>,
        input: impl Into<TargetInput>,
        paths_arg: CallArg,
    ) -> Result<(), ErrorRecord> {
        let parsed = parse_file_paths(&paths_arg);
        if matches!(parsed, FilePathsArg::Invalid) {
            self.fail(
                ErrorRecord::new(ErrorKind::UploadInvalidFilePathArgument)
                    .with_action(GestureName::Upload),
            );
        }
        self.dispatch_series(
            input.into(),
            GestureName::Upload,
            TargetGesture::Upload {
                file_paths: parsed.paths(),
            },
        )
        .await
    }
}
