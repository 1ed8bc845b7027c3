//! End-to-end runs of the contacts vocabulary against the reference server

use contacts_api::{serve, ContactStore};
use std::path::PathBuf;
use step_engine::{
    contact_steps, load_feature, Cleanup, FailureKind, HarnessConfig, Outcome, Scenario,
    ScenarioRunner, StepInput, StepStatus,
};
use tokio::net::TcpListener;

async fn start_api() -> (String, ContactStore) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let store = ContactStore::new();
    tokio::spawn(serve(listener, store.clone()));
    (base_url, store)
}

fn runner(base_url: &str) -> ScenarioRunner {
    ScenarioRunner::new(
        contact_steps().unwrap(),
        HarnessConfig::new(base_url).with_timeout_secs(5),
    )
    .unwrap()
}

fn scenario(name: &str, steps: &[(&str, &str)]) -> Scenario {
    steps
        .iter()
        .fold(Scenario::new("Contacts", name), |scenario, (keyword, text)| {
            scenario.with_step(StepInput::new(*keyword, *text))
        })
}

#[tokio::test]
async fn contract_feature_passes_and_leaves_nothing_behind() {
    let (base_url, store) = start_api().await;
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../features/contacts.feature");
    let scenarios = load_feature(&path).unwrap();

    let report = runner(&base_url).run_all(&scenarios).await;

    for scenario in &report.scenarios {
        assert!(
            scenario.passed(),
            "{} did not pass: {:?}",
            scenario.name,
            scenario.failure
        );
    }
    assert!(report.scenarios.len() >= 5);
    assert!(store.is_empty(), "teardown left {} records", store.len());
}

#[tokio::test]
async fn teardown_runs_after_a_failed_assertion() {
    let (base_url, store) = start_api().await;
    let failing = scenario(
        "failing read",
        &[
            ("Given", "a contact exists with ID {id}"),
            ("When", r#"I send a GET request to "/records/{lastCreatedID}""#),
            ("Then", "the response status code should be 418"),
            ("And", "the response should contain the contact ID"),
        ],
    );

    let report = runner(&base_url).run_scenario(&failing).await;

    assert_eq!(report.outcome, Outcome::Failed);
    assert_eq!(report.steps[3].status, StepStatus::Skipped);
    let failure = report.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert_eq!(failure.status_code, Some(200));
    assert!(failure.message.starts_with("expected status code 418, got 200"));
    assert_eq!(report.teardown.len(), 1);
    assert_eq!(report.teardown[0].result, Cleanup::Deleted);
    assert!(store.is_empty());
}

#[tokio::test]
async fn teardown_tolerates_records_the_scenario_deleted() {
    let (base_url, store) = start_api().await;
    let deleting = scenario(
        "self cleaning",
        &[
            ("Given", "a contact exists with ID {id}"),
            ("When", r#"I DELETE "/records/{lastCreatedID}""#),
            ("Then", "the response status should be 204"),
            ("And", r#"a subsequent GET request to "/records/{lastCreatedID}" should return 404"#),
        ],
    );

    let report = runner(&base_url).run_scenario(&deleting).await;

    assert_eq!(report.outcome, Outcome::Passed);
    assert_eq!(report.teardown.len(), 1);
    assert_eq!(report.teardown[0].result, Cleanup::AlreadyGone);
    assert!(store.is_empty());
}

#[tokio::test]
async fn shape_mismatch_reports_a_diff() {
    let (base_url, _store) = start_api().await;
    let mut mismatch = scenario(
        "wrong name",
        &[
            ("Given", r#"a contact exists with first name "John" and phone "1234567890""#),
            ("When", r#"I GET "/records/{lastCreatedID}""#),
        ],
    );
    mismatch.steps.push(
        StepInput::new("Then", "the response should contain the contact details").with_docstring(
            r#"{"id": {lastCreatedID}, "first_name": "Jane", "middle_name": "", "last_name": "Doe",
                "street": "123 Main St", "city": "Anytown", "state": "CA", "zip": "12345",
                "phone": "1234567890", "email": "john@example.com"}"#,
        ),
    );

    let report = runner(&base_url).run_scenario(&mismatch).await;

    assert_eq!(report.outcome, Outcome::Failed);
    let failure = report.failure.unwrap();
    assert!(failure.message.starts_with("response mismatch (-expected +actual):"));
    assert!(failure.message.contains("-  \"first_name\": \"Jane\","));
    assert!(failure.message.contains("+  \"first_name\": \"John\","));
    assert!(failure.body.unwrap().contains("\"first_name\":\"John\""));
}

#[tokio::test]
async fn list_count_mismatch_is_reported_before_elements() {
    let (base_url, _store) = start_api().await;
    let counting = scenario(
        "too few",
        &[
            ("Given", "the contact store is empty"),
            ("And", "I have created 2 contacts"),
            ("When", r#"I GET "/records""#),
            ("Then", "the response should contain 3 contacts"),
        ],
    );

    let report = runner(&base_url).run_scenario(&counting).await;

    assert_eq!(report.outcome, Outcome::Failed);
    assert!(report
        .failure
        .unwrap()
        .message
        .starts_with("expected 3 contacts, got 2"));
    assert_eq!(report.teardown.len(), 2);
}

#[tokio::test]
async fn scenarios_do_not_share_identifiers() {
    let (base_url, _store) = start_api().await;
    let creating = scenario("creates", &[("Given", "a contact exists with ID {id}")]);
    let reusing = scenario(
        "reuses",
        &[
            ("When", r#"I send a GET request to "/records/{lastCreatedID}""#),
            ("Then", "the response status code should be 404"),
        ],
    );

    let report = runner(&base_url).run_all(&[creating, reusing]).await;

    assert!(report.is_success(), "{:?}", report.scenarios[1].failure);
}

#[tokio::test]
async fn undefined_step_aborts_without_touching_the_api() {
    let (base_url, store) = start_api().await;
    let typo = scenario(
        "typo",
        &[
            ("When", "I fetch every contact"),
            ("Then", "the response status code should be 200"),
        ],
    );

    let report = runner(&base_url).run_scenario(&typo).await;

    assert_eq!(report.outcome, Outcome::Aborted);
    let failure = report.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Configuration);
    assert_eq!(failure.status_code, None);
    assert!(store.is_empty());
}

#[tokio::test]
async fn mismatched_base_url_aborts() {
    let (base_url, _store) = start_api().await;
    let elsewhere = scenario(
        "elsewhere",
        &[("Given", r#"the API server is running on "http://api.invalid:8080""#)],
    );

    let report = runner(&base_url).run_scenario(&elsewhere).await;

    assert_eq!(report.outcome, Outcome::Aborted);
    assert!(report
        .failure
        .unwrap()
        .message
        .starts_with("base URL is fixed for the run"));
}

#[tokio::test]
async fn unreachable_api_aborts_as_environment_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let probing = scenario("down", &[("Given", "the API is running")]);

    let report = runner(&base_url).run_scenario(&probing).await;

    assert_eq!(report.outcome, Outcome::Aborted);
    assert_eq!(report.failure.unwrap().kind, FailureKind::Environment);
    assert!(report.teardown.is_empty());
}
