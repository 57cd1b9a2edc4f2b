//! User-intent commands bound to session operations.
//!
//! Each [`Command`] maps to exactly one session operation. File paths come
//! from a [`PathPicker`] and must pass the calibration [`FileFilter`];
//! failures are shown to the operator through an [`OperatorNotifier`].
//! Commands are always eligible to run: the snapshot's readiness flags only
//! suggest which buttons to enable.

use std::path::PathBuf;

use crate::config::FileFilter;
use crate::error::SessionError;
use crate::session::{Operation, SessionHandle, SessionSnapshot};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadCalibration,
    SaveCalibration,
    CaptureCalibrationImage,
    CalibrateCamera,
    ResetCalibration,
    SetShowOverlay(bool),
    /// Primary click at frame-normalized coordinates.
    Point { x: f32, y: f32 },
    /// Secondary click.
    SecondaryAction,
}

impl Command {
    /// Message shown to the operator when the command fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Command::LoadCalibration => "Failed to load camera calibration data",
            Command::SaveCalibration => "Failed to save camera calibration data",
            Command::CaptureCalibrationImage => "Failed to capture calibration image",
            Command::CalibrateCamera => "Failed to calibrate camera",
            Command::ResetCalibration => "Failed to reset camera calibration",
            Command::SetShowOverlay(_) => "Failed to change overlay setting",
            Command::Point { .. } | Command::SecondaryAction => "Failed to handle click",
        }
    }
}

/// Which file dialog to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickMode {
    Open,
    Save,
}

/// File selection, supplied by the presentation layer.
pub trait PathPicker {
    /// Ask the operator for a path. `None` means the pick was cancelled.
    fn pick(&self, mode: PickMode, filter: &FileFilter) -> Option<PathBuf>;
}

/// User-visible messages, supplied by the presentation layer.
pub trait OperatorNotifier {
    fn notify(&self, message: &str);
}

/// Outcome of dispatching a command.
#[derive(Debug)]
pub enum Dispatch {
    /// Operation completed; snapshot published on completion.
    Completed(SessionSnapshot),
    /// File pick cancelled, nothing ran.
    Cancelled,
    /// Operation failed; the operator has been notified.
    Failed(SessionError),
}

/// Runs commands against a session.
pub struct CommandDispatcher<P, N> {
    session: SessionHandle,
    picker: P,
    notifier: N,
    filter: FileFilter,
}

impl<P: PathPicker, N: OperatorNotifier> CommandDispatcher<P, N> {
    pub fn new(session: SessionHandle, picker: P, notifier: N, filter: FileFilter) -> Self {
        Self {
            session,
            picker,
            notifier,
            filter,
        }
    }

    /// Ask the picker for a path and check it against the file filter.
    ///
    /// `Ok(None)` means the pick was cancelled.
    fn pick_path(&self, mode: PickMode) -> Result<Option<PathBuf>, SessionError> {
        let Some(mut path) = self.picker.pick(mode, &self.filter) else {
            return Ok(None);
        };

        if mode == PickMode::Save && path.extension().is_none() {
            if let Some(extension) = self.filter.extensions.first() {
                path.set_extension(extension);
            }
        }

        if self.filter.matches(&path) {
            Ok(Some(path))
        } else {
            Err(SessionError::UnsupportedFileType { path })
        }
    }

    /// Resolve `command` into an operation, asking for a path if needed.
    fn operation(&self, command: &Command) -> Result<Option<Operation>, SessionError> {
        let op = match command {
            Command::LoadCalibration => match self.pick_path(PickMode::Open)? {
                Some(path) => Operation::LoadCalibration(path),
                None => return Ok(None),
            },
            Command::SaveCalibration => match self.pick_path(PickMode::Save)? {
                Some(path) => Operation::SaveCalibration(path),
                None => return Ok(None),
            },
            Command::CaptureCalibrationImage => Operation::CaptureCalibrationImage,
            Command::CalibrateCamera => Operation::CalibrateCamera,
            Command::ResetCalibration => Operation::ResetCalibration,
            Command::SetShowOverlay(show) => Operation::SetShowOverlay(*show),
            Command::Point { x, y } => Operation::HandlePoint { x: *x, y: *y },
            Command::SecondaryAction => Operation::HandleSecondaryAction,
        };
        Ok(Some(op))
    }

    /// Run one command, notifying the operator on failure.
    pub fn dispatch(&self, command: Command) -> Dispatch {
        let result = match self.operation(&command) {
            Ok(Some(op)) => self.session.execute(op),
            Ok(None) => {
                log::debug!("{:?} cancelled by operator", command);
                return Dispatch::Cancelled;
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(snapshot) => Dispatch::Completed(snapshot),
            Err(e) => {
                self.notifier.notify(command.failure_message());
                Dispatch::Failed(e)
            }
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::camera::{SyntheticCamera, SyntheticCameraConfig};
    use crate::config::SessionConfig;
    use crate::session::CalibrationSession;

    struct FixedPicker(Option<PathBuf>);

    impl PathPicker for FixedPicker {
        fn pick(&self, _mode: PickMode, _filter: &FileFilter) -> Option<PathBuf> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier(RefCell<Vec<String>>);

    impl OperatorNotifier for &RecordingNotifier {
        fn notify(&self, message: &str) {
            self.0.borrow_mut().push(message.to_string());
        }
    }

    fn session() -> CalibrationSession {
        let camera = SyntheticCamera::new(SyntheticCameraConfig {
            width: 96,
            height: 72,
            ..Default::default()
        });
        CalibrationSession::start(camera, &SessionConfig::default()).unwrap()
    }

    fn dispatcher<'a>(
        session: &CalibrationSession,
        picked: Option<PathBuf>,
        notifier: &'a RecordingNotifier,
    ) -> CommandDispatcher<FixedPicker, &'a RecordingNotifier> {
        CommandDispatcher::new(
            session.handle(),
            FixedPicker(picked),
            notifier,
            FileFilter::default(),
        )
    }

    #[test]
    fn test_failed_load_notifies_operator() {
        let session = session();
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(
            &session,
            Some(PathBuf::from("/does/not/exist.csv")),
            &notifier,
        );

        let result = dispatcher.dispatch(Command::LoadCalibration);
        assert!(matches!(
            result,
            Dispatch::Failed(SessionError::CalibrationLoadFailed { .. })
        ));
        assert_eq!(
            *notifier.0.borrow(),
            vec!["Failed to load camera calibration data".to_string()]
        );
    }

    #[test]
    fn test_cancelled_pick_runs_nothing() {
        let session = session();
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(&session, None, &notifier);

        assert!(matches!(
            dispatcher.dispatch(Command::SaveCalibration),
            Dispatch::Cancelled
        ));
        assert!(notifier.0.borrow().is_empty());
        assert_eq!(session.stats().commands_executed(), 0);
    }

    #[test]
    fn test_save_uncalibrated_notifies_operator() {
        let dir = tempfile::tempdir().unwrap();
        let session = session();
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(&session, Some(dir.path().join("calib.csv")), &notifier);

        assert!(matches!(
            dispatcher.dispatch(Command::SaveCalibration),
            Dispatch::Failed(_)
        ));
        assert_eq!(
            *notifier.0.borrow(),
            vec!["Failed to save camera calibration data".to_string()]
        );
        assert!(!dir.path().join("calib.csv").exists());
    }

    #[test]
    fn test_load_with_wrong_extension_is_rejected() {
        let session = session();
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(&session, Some(PathBuf::from("calib.txt")), &notifier);

        match dispatcher.dispatch(Command::LoadCalibration) {
            Dispatch::Failed(SessionError::UnsupportedFileType { path }) => {
                assert_eq!(path, PathBuf::from("calib.txt"));
            }
            other => panic!("unexpected dispatch result: {:?}", other),
        }
        assert_eq!(
            *notifier.0.borrow(),
            vec!["Failed to load camera calibration data".to_string()]
        );
        assert_eq!(session.stats().commands_executed(), 0);
    }

    #[test]
    fn test_save_without_extension_gets_filter_extension() {
        let dir = tempfile::tempdir().unwrap();
        let session = session();
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(&session, Some(dir.path().join("calib")), &notifier);

        // Uncalibrated, so the save itself fails, but against the corrected path.
        match dispatcher.dispatch(Command::SaveCalibration) {
            Dispatch::Failed(SessionError::CalibrationSaveFailed { path, .. }) => {
                assert_eq!(path, dir.path().join("calib.csv"));
            }
            other => panic!("unexpected dispatch result: {:?}", other),
        }
        assert_eq!(session.stats().commands_executed(), 1);
    }

    #[test]
    fn test_overlay_and_clicks_complete() {
        let session = session();
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(&session, None, &notifier);

        match dispatcher.dispatch(Command::SetShowOverlay(false)) {
            Dispatch::Completed(snapshot) => assert!(!snapshot.show_overlay),
            other => panic!("unexpected dispatch result: {:?}", other),
        }
        assert!(matches!(
            dispatcher.dispatch(Command::Point { x: 0.5, y: 0.5 }),
            Dispatch::Completed(_)
        ));
        assert!(matches!(
            dispatcher.dispatch(Command::SecondaryAction),
            Dispatch::Completed(_)
        ));
        assert!(notifier.0.borrow().is_empty());
    }

    #[test]
    fn test_calibrate_without_samples_notifies_operator() {
        let session = session();
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(&session, None, &notifier);

        assert!(matches!(
            dispatcher.dispatch(Command::CalibrateCamera),
            Dispatch::Failed(SessionError::CalibrationComputeFailed)
        ));
        assert_eq!(
            *notifier.0.borrow(),
            vec!["Failed to calibrate camera".to_string()]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dispatch_from_async_context() {
        let session = session();
        let notifier = RecordingNotifier::default();
        let dispatcher = dispatcher(&session, None, &notifier);

        match dispatcher.dispatch(Command::CaptureCalibrationImage) {
            Dispatch::Completed(snapshot) => assert!(snapshot.calibration_image_count <= 1),
            other => panic!("unexpected dispatch result: {:?}", other),
        }
        assert!(notifier.0.borrow().is_empty());
    }
}
