//! Full lifecycle against a real Docker daemon.
//!
//! Needs `dgraph/standalone:v21.03.2` in the local image cache:
//! `cargo test --test lifecycle -- --ignored`

use dgraph_sandbox::{Fixture, SandboxConfig};

const SCHEMA: &str = r#"
type User {
    userID: ID!
    name: String!
    lastSignIn: DateTime
    recentScores: [Float]
    reputation: Int
    active: Boolean
}
"#;

#[tokio::test]
#[ignore = "requires a docker daemon and the dgraph image"]
async fn start_load_drop_and_teardown() {
    let config = SandboxConfig::from_env();
    let fixture = Fixture::start(&config, None)
        .await
        .expect("dgraph container must start");

    fixture.require_ready().expect("instance must become ready");
    fixture.load_schema(SCHEMA).await.expect("schema must load");
    fixture.drop_data().await.expect("drop data must succeed");

    fixture.teardown().await.expect("stop and remove must succeed");
}

#[tokio::test]
#[ignore = "requires a docker daemon and the dgraph image"]
async fn drop_all_is_repeatable() {
    let config = SandboxConfig::from_env();
    let fixture = Fixture::start(&config, None)
        .await
        .expect("dgraph container must start");

    fixture.load_schema(SCHEMA).await.expect("schema must load");
    fixture.drop_all().await.expect("first drop all");
    fixture.drop_all().await.expect("second drop all");

    fixture.teardown().await.expect("stop and remove must succeed");
}
