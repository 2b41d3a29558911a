mod common;

use uuid::Uuid;

use assessment_engine::error::Error;
use assessment_engine::models::answer::AnswerValue;
use assessment_engine::models::attempt::{AttemptStatus, SubmitReason};

use common::{engine, identity, StubBackend};

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_until_the_backend_recovers() {
    common::init_tracing();
    let stub = StubBackend::new(600);
    stub.fail_next_submits(vec![
        Error::BackendUnavailable("connection refused".into()),
        Error::BackendUnavailable("connection refused".into()),
    ]);
    let engine = engine(stub.clone());

    let session = engine
        .attempt_service
        .start(Uuid::new_v4(), &identity("alice"))
        .await
        .expect("start");

    for view in session.questions() {
        let value = if view.options.is_empty() {
            AnswerValue::Text("shared access, no ownership transfer".into())
        } else {
            AnswerValue::Choice(view.options[1].id)
        };
        session.answer(view.id, value).expect("answer");
    }
    let before = session.attempt().answers;

    // Two transient failures, then success on the third bounded retry.
    let result = session.confirm_submit(false).await.expect("submit");
    assert_eq!(stub.submit_count(), 3);
    assert_eq!(session.status(), AttemptStatus::Completed);
    assert!(!result.time_expired);

    // The delivered answers are exactly what was accumulated beforehand.
    let payload = stub.last_submitted().expect("payload");
    for record in &before {
        let delivered = payload
            .answers
            .iter()
            .find(|a| a.question_id == record.question_id)
            .expect("delivered answer");
        assert_eq!(delivered.selected_option_id, record.selected_option_id);
        assert_eq!(delivered.free_text, record.free_text);
    }
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_leave_the_attempt_recoverable() {
    let stub = StubBackend::new(600);
    stub.fail_next_submits(vec![
        Error::BackendUnavailable("down".into()),
        Error::BackendUnavailable("down".into()),
        Error::BackendUnavailable("down".into()),
    ]);
    let engine = engine(stub.clone());

    let session = engine
        .attempt_service
        .start(Uuid::new_v4(), &identity("bob"))
        .await
        .expect("start");

    session.answer(1, AnswerValue::Choice(2)).expect("answer");
    session.answer(2, AnswerValue::Choice(1)).expect("answer");

    let err = session.confirm_submit(true).await.unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable(_)));
    assert_eq!(stub.submit_count(), 3);

    // Not completed, not corrupted: the attempt stays in Submitting with the
    // accumulated answers intact, waiting for a manual retry.
    assert_eq!(session.status(), AttemptStatus::Submitting);
    let preserved = session.attempt().answers;
    assert_eq!(preserved.len(), 2);

    let result = session.retry_submit().await.expect("manual retry");
    assert_eq!(session.status(), AttemptStatus::Completed);
    assert_eq!(stub.submit_count(), 4);
    assert_eq!(result.attempt_id, session.attempt_id());

    let payload = stub.last_submitted().expect("payload");
    assert_eq!(payload.reason, SubmitReason::UserConfirmed);
    assert_eq!(
        payload.answers.iter().filter(|a| a.is_answered()).count(),
        2
    );
}

#[tokio::test]
async fn retry_is_only_valid_while_submitting() {
    let stub = StubBackend::new(600);
    let engine = engine(stub.clone());

    let session = engine
        .attempt_service
        .start(Uuid::new_v4(), &identity("carol"))
        .await
        .expect("start");

    assert!(matches!(
        session.retry_submit().await,
        Err(Error::InvalidState(_))
    ));

    session.confirm_submit(true).await.expect("submit");
    assert!(matches!(
        session.retry_submit().await,
        Err(Error::InvalidState(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn starting_again_while_a_submission_is_in_flight_is_refused() {
    let stub = StubBackend::new(600);
    stub.fail_next_submits(vec![
        Error::BackendUnavailable("down".into()),
        Error::BackendUnavailable("down".into()),
        Error::BackendUnavailable("down".into()),
    ]);
    let engine = engine(stub.clone());
    let assessment_id = Uuid::new_v4();
    let user = identity("dave");

    let session = engine
        .attempt_service
        .start(assessment_id, &user)
        .await
        .expect("start");
    let attempt_id = session.attempt_id();

    session.confirm_submit(true).await.unwrap_err();
    assert_eq!(session.status(), AttemptStatus::Submitting);

    let err = engine
        .attempt_service
        .start(assessment_id, &user)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyStarted(id) if id == attempt_id));
    assert_eq!(stub.start_count(), 1);
}

#[tokio::test]
async fn expired_flag_from_the_backend_drives_the_terminal_status() {
    // The backend corroborates expiry on its own clock; if it flags the
    // submission as late, the attempt ends as Expired even though the
    // learner pressed submit in time by local reckoning.
    let stub = StubBackend::new(600);
    stub.force_expired
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let engine = engine(stub.clone());

    let session = engine
        .attempt_service
        .start(Uuid::new_v4(), &identity("erin"))
        .await
        .expect("start");

    session.answer(1, AnswerValue::Choice(2)).expect("answer");
    let result = session.confirm_submit(true).await.expect("submit");

    assert!(result.time_expired);
    assert_eq!(session.status(), AttemptStatus::Expired);

    let payload = stub.last_submitted().expect("payload");
    assert_eq!(payload.reason, SubmitReason::UserConfirmed);
    assert!(!payload.time_expired);
}
