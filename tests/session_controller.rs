/// Session Controller lifecycle tests against a scripted backend.

mod common;

use common::{at, ScriptedProcess, Stop};
use flowtrace::application::{SessionController, StartOutcome};
use flowtrace::domain::error::TraceError;
use flowtrace::domain::location::SourceLocation;
use flowtrace::domain::session::{Granularity, SessionState, StopReason};

#[test]
fn test_start_launches_and_passes_arguments() {
    let process = ScriptedProcess::new("/tmp/gol", vec![at("gol.c", 10)]);
    let mut controller = SessionController::new(process, true);
    assert_eq!(controller.state(), &SessionState::NotStarted);

    let outcome = controller.start(&["5".to_string(), "glider".to_string()]).unwrap();
    assert_eq!(outcome, StartOutcome::Launched);
    assert_eq!(controller.state(), &SessionState::Running);

    let process = controller.into_inner();
    assert_eq!(process.launches, 1);
    assert_eq!(process.arguments, vec!["5", "glider"]);
}

#[test]
fn test_second_start_is_a_notice_not_an_error() {
    let mut controller = SessionController::new(ScriptedProcess::new("gol", vec![at("gol.c", 1)]), true);
    controller.start(&[]).unwrap();
    let outcome = controller.start(&[]).unwrap();
    assert_eq!(outcome, StartOutcome::AlreadyRunning);
    assert_eq!(controller.into_inner().launches, 1);
}

#[test]
fn test_adopts_running_target() {
    let process = ScriptedProcess::new("gol", vec![at("gol.c", 7)]).already_running();
    let mut controller = SessionController::new(process, true);
    assert_eq!(controller.start(&[]).unwrap(), StartOutcome::AlreadyRunning);
    assert_eq!(
        controller.current_location().unwrap(),
        Some(SourceLocation::new("gol.c", 7))
    );
    assert_eq!(controller.into_inner().launches, 0);
}

#[test]
fn test_step_before_start_fails() {
    let mut controller = SessionController::new(ScriptedProcess::new("gol", vec![]), true);
    assert!(matches!(
        controller.step_once(Granularity::Statement),
        Err(TraceError::SteppingError(_))
    ));
}

#[test]
fn test_exit_surfaces_as_stepping_error() {
    let mut controller = SessionController::new(ScriptedProcess::new("gol", vec![at("gol.c", 1)]), true);
    controller.start(&[]).unwrap();
    let err = controller.step_once(Granularity::Instruction).unwrap_err();
    assert!(matches!(err, TraceError::SteppingError(_)));
    assert!(controller.is_terminated());
}

#[test]
fn test_backend_step_failure_is_reported_as_stepping_error() {
    let process = ScriptedProcess::new("gol", vec![at("gol.c", 1), at("gol.c", 2)]).fail_step_after(0);
    let mut controller = SessionController::new(process, true);
    controller.start(&[]).unwrap();
    let err = controller.step_once(Granularity::Statement).unwrap_err();
    assert!(matches!(err, TraceError::SteppingError(msg) if msg.contains("Cannot access memory")));
    assert!(!controller.is_terminated());
}

#[test]
fn test_stopped_states_are_terminal() {
    let mut controller = SessionController::new(ScriptedProcess::new("gol", vec![at("gol.c", 1)]), true);
    controller.start(&[]).unwrap();
    assert_eq!(controller.finish(StopReason::Interrupted), &StopReason::Interrupted);
    // The first terminal reason sticks.
    assert_eq!(controller.finish(StopReason::Normal), &StopReason::Interrupted);
    assert!(controller.step_once(Granularity::Statement).is_err());
    assert!(controller.start(&[]).is_err());
}

#[test]
fn test_missing_symbols_are_none() {
    let mut controller = SessionController::new(ScriptedProcess::new("gol", vec![Stop::NoSymbols]), false);
    controller.start(&[]).unwrap();
    assert_eq!(controller.current_location().unwrap(), None);
}

#[test]
fn test_lookup_errors_depend_on_fault_tolerance() {
    let stops = vec![Stop::LookupError("frame unavailable".to_string())];

    let mut tolerant = SessionController::new(ScriptedProcess::new("gol", stops.clone()), true);
    tolerant.start(&[]).unwrap();
    assert_eq!(tolerant.current_location().unwrap(), None);

    let mut strict = SessionController::new(ScriptedProcess::new("gol", stops), false);
    strict.start(&[]).unwrap();
    assert!(matches!(strict.current_location(), Err(TraceError::Backend(_))));
}
