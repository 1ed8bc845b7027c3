//! Contacts step vocabulary
//!
//! Every phrase a contacts scenario may use, bound to its handler. Fixture
//! steps create records through the API and insist on `201 Created`; request
//! steps only record what came back; assertion steps read the recorded
//! response.

use crate::context::ScenarioContext;
use crate::error::{Result, StepError};
use crate::registry::{StepArgs, StepFuture, StepRegistry};
use contract_core::{
    compare, compare_list, contains, endpoints, extract_id, ContactPatch, ContractError, NewContact,
    ResourceId,
};
use serde_json::{Map, Value};
use tracing::info;

/// Build the registry holding the full contacts vocabulary
pub fn contact_steps() -> Result<StepRegistry> {
    let mut registry = StepRegistry::new();

    registry
        .given("the API is running", api_is_running)?
        .given("the API server is running on {string}", api_server_is_running_on)?
        .given("the contact store is empty", contact_store_is_empty)?
        .given("a contact exists with ID {{{word}}}", contact_exists)?
        .given(
            "a contact exists with first name {string} and phone {string}",
            contact_exists_with_name_and_phone,
        )?
        .given("I have created {int} contact(s)", created_contacts)?
        .given(
            "I have created {int} contact(s) with first_name {string}",
            created_contacts_with_first_name,
        )?
        .given("I have created a contact with ID {int}", created_contact_with_id)?;

    registry
        .when("I send a POST request to {string} with contact details", post_details)?
        .when("I POST a contact with:", post_table)?
        .when("I send a GET request to {string}", get)?
        .when("I GET {string}", get)?
        .when("I send a PUT request to {string} with updated details", put_details)?
        .when("I PUT contact ID {int} with first_name {string}", put_first_name)?
        .when("I send a DELETE request to {string}", delete)?
        .when("I DELETE {string}", delete)?;

    registry
        .then("the response status code should be {int}", status_should_be)?
        .then("the response status should be {int}", status_should_be)?
        .then("the response should contain the contact ID", should_contain_id)?
        .then("the response should contain the contact details", should_equal_docstring)?
        .then(
            "the response should contain the updated contact details",
            should_equal_docstring,
        )?
        .then("the response should contain a list with the contact", should_equal_list)?
        .then("the response should contain {int} contact(s)", should_contain_count)?
        .then("the response should contain {string}", should_contain_text)?
        .then("the response should include:", should_include_table)?
        .then("the response field {string} should be {string}", field_should_be)?
        .then(
            "a subsequent GET request to {string} should return {int}",
            subsequent_get_should_return,
        )?;

    Ok(registry)
}

// Given

fn api_is_running<'a>(ctx: &'a mut ScenarioContext, _args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move { ctx.probe().await })
}

fn api_server_is_running_on<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let requested = args.string(0)?;
        if requested.trim_end_matches('/') != ctx.state().base_url() {
            return Err(StepError::BaseUrlMismatch {
                configured: ctx.state().base_url().to_string(),
                requested,
            });
        }
        ctx.probe().await
    })
}

fn contact_store_is_empty<'a>(ctx: &'a mut ScenarioContext, _args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        ctx.delete(endpoints::RESET).await?;
        ctx.expect_success()
    })
}

fn contact_exists<'a>(ctx: &'a mut ScenarioContext, _args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        ctx.create_contact(endpoints::RECORDS, &NewContact::sample())
            .await?;
        Ok(())
    })
}

fn contact_exists_with_name_and_phone<'a>(
    ctx: &'a mut ScenarioContext,
    args: StepArgs,
) -> StepFuture<'a> {
    Box::pin(async move {
        let contact = NewContact::sample()
            .with_first_name(args.string(0)?)
            .with_phone(args.string(1)?);
        ctx.create_contact(endpoints::RECORDS, &contact).await?;
        Ok(())
    })
}

fn created_contacts<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let count = count(&args, 0)?;
        create_numbered(ctx, count, "John").await
    })
}

fn created_contacts_with_first_name<'a>(
    ctx: &'a mut ScenarioContext,
    args: StepArgs,
) -> StepFuture<'a> {
    Box::pin(async move {
        let count = count(&args, 0)?;
        let first_name = args.string(1)?;
        create_numbered(ctx, count, &first_name).await
    })
}

/// The server assigns identifiers, so the requested one is only logged
fn created_contact_with_id<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let requested = args.int(0)?;
        let id = ctx
            .create_contact(endpoints::RECORDS, &NewContact::sample())
            .await?;
        if id as i64 != requested {
            info!(requested, assigned = id, "Server assigned a different contact id");
        }
        Ok(())
    })
}

async fn create_numbered(ctx: &mut ScenarioContext, count: usize, first_name: &str) -> Result<()> {
    for i in 0..count {
        let contact = NewContact::default()
            .with_first_name(first_name)
            .with_last_name(format!("User{i}"))
            .with_phone(format!("123456789{i}"));
        ctx.create_contact(endpoints::RECORDS, &contact).await?;
    }
    Ok(())
}

// When

fn post_details<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let path = args.string(0)?;
        ctx.create(&path, args.docstring()?).await?;
        Ok(())
    })
}

fn post_table<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let payload = table_object(args.table()?)?.to_string();
        ctx.create(endpoints::RECORDS, &payload).await?;
        Ok(())
    })
}

fn get<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move { ctx.read(&args.string(0)?).await })
}

fn put_details<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let path = args.string(0)?;
        ctx.update(&path, args.docstring()?).await
    })
}

fn put_first_name<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let id = resource_id(&args, 0)?;
        let patch = ContactPatch {
            first_name: Some(args.string(1)?),
            ..ContactPatch::default()
        };
        let payload = serde_json::to_string(&patch).map_err(ContractError::from)?;
        ctx.update(&endpoints::record(id), &payload).await
    })
}

fn delete<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move { ctx.delete(&args.string(0)?).await })
}

// Then

fn status_should_be<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move { ctx.expect_status(status(&args, 0)?) })
}

fn should_contain_id<'a>(ctx: &'a mut ScenarioContext, _args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        ctx.response_json()?;
        if extract_id(ctx.state().last_body()).is_none() {
            return Err(ContractError::MissingField {
                field: "id".to_string(),
                body: ctx.state().last_body_text().into_owned(),
            }
            .into());
        }
        Ok(())
    })
}

fn should_equal_docstring<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let expected = expected_json(args.docstring()?)?;
        let actual = ctx.response_json()?;
        Ok(compare(&expected, &actual).into_result()?)
    })
}

fn should_equal_list<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let expected = expected_json(args.docstring()?)?;
        let actual = ctx.response_json()?;
        Ok(compare_list(&expected, &actual)?)
    })
}

fn should_contain_count<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let expected = count(&args, 0)?;
        let actual = ctx.response_json()?;
        let body = ctx.state().last_body_text().into_owned();
        let Some(items) = actual.as_array() else {
            return Err(ContractError::MalformedBody {
                reason: "expected a JSON array".to_string(),
                body,
            }
            .into());
        };
        if items.len() != expected {
            return Err(ContractError::CountMismatch {
                expected,
                actual: items.len(),
                body,
            }
            .into());
        }
        Ok(())
    })
}

fn should_contain_text<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let expected = args.string(0)?;
        if ctx.state().last_status().is_none() {
            return Err(StepError::NoResponse);
        }
        let body = ctx.state().last_body_text();
        if body.contains(expected.as_str()) {
            return Ok(());
        }
        Err(StepError::MissingText {
            expected,
            body: body.into_owned(),
        })
    })
}

fn should_include_table<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let expected = table_object(args.table()?)?;
        let actual = ctx.response_json()?;
        Ok(contains(&expected, &actual).into_result()?)
    })
}

fn field_should_be<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let field = args.string(0)?;
        let expected = Value::String(args.string(1)?);
        let body = ctx.response_json()?;
        let Some(actual) = body.get(&field) else {
            return Err(ContractError::MissingField {
                field,
                body: ctx.state().last_body_text().into_owned(),
            }
            .into());
        };
        Ok(compare(&expected, actual).into_result()?)
    })
}

fn subsequent_get_should_return<'a>(
    ctx: &'a mut ScenarioContext,
    args: StepArgs,
) -> StepFuture<'a> {
    Box::pin(async move {
        let expected = status(&args, 1)?;
        ctx.read(&args.string(0)?).await?;
        ctx.expect_status(expected)
    })
}

// Argument helpers

fn count(args: &StepArgs, index: usize) -> Result<usize> {
    let raw = args.int(index)?;
    usize::try_from(raw).map_err(|_| StepError::InvalidArgument {
        value: raw.to_string(),
        reason: "expected a non-negative count".to_string(),
    })
}

fn resource_id(args: &StepArgs, index: usize) -> Result<ResourceId> {
    let raw = args.int(index)?;
    ResourceId::try_from(raw).map_err(|_| StepError::InvalidArgument {
        value: raw.to_string(),
        reason: "expected a non-negative contact id".to_string(),
    })
}

fn status(args: &StepArgs, index: usize) -> Result<u16> {
    let raw = args.int(index)?;
    u16::try_from(raw).map_err(|_| StepError::InvalidArgument {
        value: raw.to_string(),
        reason: "expected an HTTP status code".to_string(),
    })
}

/// Parse the JSON a scenario expects
fn expected_json(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|err| {
        ContractError::InvalidPayload {
            reason: format!("expected JSON does not parse: {err}"),
        }
        .into()
    })
}

/// Turn a `| field | value |` table into a JSON object of strings. The first
/// row is a header and is skipped.
fn table_object(table: &[Vec<String>]) -> Result<Value> {
    let mut object = Map::new();
    for row in table.iter().skip(1) {
        let [key, value, ..] = row.as_slice() else {
            return Err(StepError::InvalidArgument {
                value: row.join(" | "),
                reason: "table rows need a field and a value".to_string(),
            });
        };
        object.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
    }
    Ok(Value::Object(object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::error::FailureKind;
    use crate::executor::RequestExecutor;
    use crate::pattern::Arg;
    use crate::registry::{StepInput, StepKeyword};
    use contract_core::ScenarioState;

    fn context() -> ScenarioContext {
        let config = HarnessConfig::default();
        ScenarioContext::new(
            ScenarioState::new(&config.base_url),
            RequestExecutor::new(&config).unwrap(),
        )
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn vocabulary_registers_without_conflicts() {
        let registry = contact_steps().unwrap();
        assert_eq!(registry.len(), 27);
        assert!(registry
            .definitions()
            .iter()
            .any(|d| d.keyword() == StepKeyword::Then && d.pattern() == "the response should include:"));
    }

    #[test]
    fn every_vocabulary_phrase_resolves_to_exactly_one_step() {
        let registry = contact_steps().unwrap();
        let phrases = [
            "the API is running",
            r#"the API server is running on "http://localhost:8080""#,
            "the contact store is empty",
            "a contact exists with ID {id}",
            r#"a contact exists with first name "Jane" and phone "5551234567""#,
            "I have created 3 contacts",
            "I have created 1 contact",
            r#"I have created 2 contacts with first_name "Jane""#,
            "I have created a contact with ID 1",
            r#"I send a POST request to "/records" with contact details"#,
            "I POST a contact with:",
            r#"I send a GET request to "/records/{lastCreatedID}""#,
            r#"I GET "/records""#,
            r#"I send a PUT request to "/records/{lastCreatedID}" with updated details"#,
            r#"I PUT contact ID 1 with first_name "Jane""#,
            r#"I send a DELETE request to "/records/{lastCreatedID}""#,
            r#"I DELETE "/records/1""#,
            "the response status code should be 201",
            "the response status should be 200",
            "the response should contain the contact ID",
            "the response should contain the contact details",
            "the response should contain the updated contact details",
            "the response should contain a list with the contact",
            "the response should contain 3 contacts",
            r#"the response should contain "Jane""#,
            "the response should include:",
            r#"the response field "first_name" should be "Jane""#,
            r#"a subsequent GET request to "/records/{lastCreatedID}" should return 404"#,
        ];
        for phrase in phrases {
            if let Err(err) = registry.find(phrase) {
                panic!("{phrase}: {err}");
            }
        }
    }

    #[test]
    fn count_steps_choose_the_right_pattern() {
        let registry = contact_steps().unwrap();
        let (definition, args) = registry
            .find(r#"I have created 2 contacts with first_name "Jane""#)
            .unwrap();
        assert_eq!(
            definition.pattern(),
            "I have created {int} contact(s) with first_name {string}"
        );
        assert_eq!(args, vec![Arg::Int(2), Arg::Str("Jane".to_string())]);
    }

    #[test]
    fn table_rows_become_string_fields() {
        let table = vec![
            row(&["field", "value"]),
            row(&[" first_name ", " Jane "]),
            row(&["phone", "5551234567"]),
        ];
        let object = table_object(&table).unwrap();
        assert_eq!(
            object,
            serde_json::json!({"first_name": "Jane", "phone": "5551234567"})
        );
    }

    #[test]
    fn short_table_rows_are_rejected() {
        let table = vec![row(&["field", "value"]), row(&["first_name"])];
        assert!(matches!(
            table_object(&table),
            Err(StepError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn numeric_arguments_are_range_checked() {
        let args = StepArgs::new(vec![Arg::Int(-1), Arg::Int(70_000)]);
        assert!(count(&args, 0).is_err());
        assert!(resource_id(&args, 0).is_err());
        assert!(status(&args, 1).is_err());
    }

    #[test]
    fn unparseable_expectation_is_a_configuration_error() {
        let err = expected_json("{not json").unwrap_err();
        assert_eq!(err.kind(), crate::error::FailureKind::Configuration);
    }

    #[tokio::test]
    async fn contact_id_must_be_a_usable_identifier() {
        let registry = contact_steps().unwrap();
        let step = StepInput::new("Then", "the response should contain the contact ID");

        for body in [r#"{"id": null}"#, r#"{"id": "abc"}"#, r#"{"id": -3}"#, r#"{"name": "x"}"#] {
            let mut ctx = context();
            ctx.state_mut().record_response(201, body.as_bytes().to_vec());

            let err = registry.dispatch(&mut ctx, &step).await.unwrap_err();

            assert!(
                matches!(
                    err,
                    StepError::Contract(ContractError::MissingField { ref field, .. }) if field == "id"
                ),
                "{body}: {err}"
            );
            assert_eq!(err.kind(), FailureKind::Assertion);
        }

        let mut ctx = context();
        ctx.state_mut().record_response(201, br#"{"id": 42}"#.to_vec());
        registry.dispatch(&mut ctx, &step).await.unwrap();
    }
}
