//! End-to-end checks against a real gateway.
//!
//! Requires AWS credentials plus `AGENTGATE_TEST_REGION` and
//! `AGENTGATE_TEST_GATEWAY_ID`; run with `cargo test -- --ignored`.

use agentgate_targets::gateway::{self, GatewayTargets};

#[tokio::test]
#[ignore = "requires AWS credentials and an existing AgentCore gateway"]
async fn describe_and_list_real_gateway() {
    let region = std::env::var("AGENTGATE_TEST_REGION").expect("AGENTGATE_TEST_REGION");
    let gateway_id = std::env::var("AGENTGATE_TEST_GATEWAY_ID").expect("AGENTGATE_TEST_GATEWAY_ID");

    let aws_config = gateway::load_aws_config(&region).await;
    let targets = GatewayTargets::new(&aws_config, &gateway_id);

    let info = targets.describe().await.expect("describe gateway");
    assert_eq!(info.id, gateway_id);
    assert!(!info.name.is_empty());
    assert!(!info.status.is_empty());

    let listed = targets.list_targets().await.expect("list targets");
    for target in &listed {
        assert!(!target.id.is_empty());
        assert!(!target.status.is_empty());
    }

    let absent = targets
        .find_target("agentgate-no-such-target")
        .await
        .expect("scan listing for an unregistered name");
    assert!(absent.is_none());
}
