//! BDD Tests for the Step Engine

use cucumber::{given, then, when, World};
use step_engine::{contact_steps, Arg, ScenarioContext, StepArgs, StepFuture, StepRegistry};

#[derive(Debug, World)]
#[world(init = Self::new)]
struct EngineWorld {
    registry: StepRegistry,
    matched_pattern: Option<String>,
    args: Vec<Arg>,
    lookup_error: Option<String>,
    registration_error: Option<String>,
}

impl EngineWorld {
    fn new() -> Self {
        Self {
            registry: StepRegistry::new(),
            matched_pattern: None,
            args: Vec::new(),
            lookup_error: None,
            registration_error: None,
        }
    }
}

fn noop<'a>(_ctx: &'a mut ScenarioContext, _args: StepArgs) -> StepFuture<'a> {
    Box::pin(async { Ok(()) })
}

#[given("the contacts vocabulary")]
async fn given_vocabulary(world: &mut EngineWorld) {
    world.registry = contact_steps().expect("the contacts vocabulary should register");
}

#[given(expr = "an extra step {string}")]
async fn given_extra_step(world: &mut EngineWorld, pattern: String) {
    world
        .registry
        .when(&pattern, noop)
        .expect("the extra step should register");
}

#[when(expr = "I register the extra step {string}")]
async fn when_register(world: &mut EngineWorld, pattern: String) {
    world.registration_error = world.registry.given(&pattern, noop).err().map(|e| e.to_string());
}

#[when(regex = r"^I look up the step '(.*)'$")]
async fn when_look_up(world: &mut EngineWorld, text: String) {
    match world.registry.find(&text) {
        Ok((definition, args)) => {
            world.matched_pattern = Some(definition.pattern().to_string());
            world.args = args;
            world.lookup_error = None;
        }
        Err(err) => {
            world.matched_pattern = None;
            world.args.clear();
            world.lookup_error = Some(err.to_string());
        }
    }
}

#[then(expr = "the step resolves to {string}")]
async fn then_resolves(world: &mut EngineWorld, pattern: String) {
    assert_eq!(world.matched_pattern.as_deref(), Some(pattern.as_str()));
}

#[then(expr = "argument {int} is the text {string}")]
async fn then_text_argument(world: &mut EngineWorld, position: usize, expected: String) {
    assert_eq!(world.args.get(position - 1), Some(&Arg::Str(expected)));
}

#[then(expr = "argument {int} is the number {int}")]
async fn then_number_argument(world: &mut EngineWorld, position: usize, expected: i64) {
    assert_eq!(world.args.get(position - 1), Some(&Arg::Int(expected)));
}

#[then(expr = "the lookup fails with {string}")]
async fn then_lookup_fails(world: &mut EngineWorld, expected: String) {
    let error = world.lookup_error.as_deref().expect("lookup should have failed");
    assert!(error.starts_with(&expected), "unexpected error: {error}");
}

#[then(expr = "the lookup error lists {string}")]
async fn then_lookup_lists(world: &mut EngineWorld, pattern: String) {
    let error = world.lookup_error.as_deref().expect("lookup should have failed");
    assert!(error.contains(&pattern), "unexpected error: {error}");
}

#[then(expr = "registration fails with {string}")]
async fn then_registration_fails(world: &mut EngineWorld, expected: String) {
    let error = world
        .registration_error
        .as_deref()
        .expect("registration should have failed");
    assert!(error.contains(&expected), "unexpected error: {error}");
}

#[tokio::main]
async fn main() {
    EngineWorld::run("tests/features").await;
}
