//! End-to-end upsert flows against a mock GitHub API.

use httpmock::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use waymark_core::{
    format_marker, CommentTracker, IssueRef, MetadataCodec, TrackerTag, UpsertError,
};
use waymark_github::GithubCommentClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct DeployMeta {
    deployment_id: String,
    attempt: u32,
}

fn issue() -> IssueRef {
    IssueRef {
        owner: "owner".to_string(),
        repo: "repo".to_string(),
        number: 42,
    }
}

fn client(server: &MockServer) -> GithubCommentClient {
    GithubCommentClient::new(server.base_url(), "token", 2_000, 1, 1).expect("github client")
}

fn tracked_body(tag: &TrackerTag, meta: &DeployMeta, content: &str) -> String {
    let payload = MetadataCodec::encode(meta).expect("encode");
    format!("{}\n{content}", format_marker(tag, &payload))
}

#[tokio::test]
async fn integration_first_upsert_creates_a_marked_comment() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET).path("/repos/owner/repo/issues/42/comments");
        then.status(200).json_body(json!([
            { "id": 1, "body": "unrelated human comment" }
        ]));
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/owner/repo/issues/42/comments")
            .body_includes("<!-- CommentTracker(DeploymentService) ")
            .body_includes("Deployed to staging.");
        then.status(201).json_body(json!({ "id": 900, "body": "created" }));
    });

    let tag = TrackerTag::parse("DeploymentService").expect("tag");
    let tracker = CommentTracker::new(tag, issue(), client(&server));

    let url = tracker
        .upsert(|previous: Option<DeployMeta>| async move {
            assert!(previous.is_none());
            Ok::<_, std::convert::Infallible>((
                "Deployed to staging.".to_string(),
                DeployMeta {
                    deployment_id: "deploy-1".to_string(),
                    attempt: 1,
                },
                "https://example.com/deploy-1".to_string(),
            ))
        })
        .await
        .expect("upsert");

    assert_eq!(url, "https://example.com/deploy-1");
    list.assert_calls(1);
    create.assert_calls(1);
}

#[tokio::test]
async fn integration_second_upsert_reads_previous_metadata_and_updates_in_place() {
    let server = MockServer::start();
    let tag = TrackerTag::parse("DeploymentService").expect("tag");
    let previous_meta = DeployMeta {
        deployment_id: "deploy-1".to_string(),
        attempt: 1,
    };

    let list = server.mock(|when, then| {
        when.method(GET).path("/repos/owner/repo/issues/42/comments");
        then.status(200).json_body(json!([
            { "id": 1, "body": "unrelated human comment" },
            { "id": 2, "body": tracked_body(&tag, &previous_meta, "Old deployment text") }
        ]));
    });
    let update = server.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/owner/repo/issues/comments/2")
            .body_includes("Redeployed after deploy-1.");
        then.status(200).json_body(json!({ "id": 2, "body": "updated" }));
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/repos/owner/repo/issues/42/comments");
        then.status(201).json_body(json!({ "id": 901, "body": "unexpected" }));
    });

    let tracker = CommentTracker::new(tag, issue(), client(&server));
    tracker
        .upsert(|previous: Option<DeployMeta>| async move {
            let previous = previous.expect("previous metadata");
            assert_eq!(previous.deployment_id, "deploy-1");
            Ok::<_, std::convert::Infallible>((
                format!("Redeployed after {}.", previous.deployment_id),
                DeployMeta {
                    deployment_id: "deploy-2".to_string(),
                    attempt: previous.attempt + 1,
                },
                (),
            ))
        })
        .await
        .expect("upsert");

    list.assert_calls(1);
    update.assert_calls(1);
    create.assert_calls(0);
}

#[tokio::test]
async fn integration_foreign_tracker_comments_are_left_alone() {
    let server = MockServer::start();
    let report_tag = TrackerTag::parse("TestReportService").expect("tag");
    let report_meta = DeployMeta {
        deployment_id: "report-1".to_string(),
        attempt: 1,
    };

    server.mock(|when, then| {
        when.method(GET).path("/repos/owner/repo/issues/42/comments");
        then.status(200).json_body(json!([
            { "id": 5, "body": tracked_body(&report_tag, &report_meta, "Report output") }
        ]));
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/repos/owner/repo/issues/42/comments");
        then.status(201).json_body(json!({ "id": 902, "body": "created" }));
    });

    let deploy_tag = TrackerTag::parse("DeploymentService").expect("tag");
    let tracker = CommentTracker::new(deploy_tag, issue(), client(&server));
    tracker
        .upsert(|previous: Option<DeployMeta>| async move {
            assert!(previous.is_none());
            Ok::<_, std::convert::Infallible>((
                "Deployed.".to_string(),
                DeployMeta {
                    deployment_id: "deploy-1".to_string(),
                    attempt: 1,
                },
                (),
            ))
        })
        .await
        .expect("upsert");

    create.assert_calls(1);
}

#[tokio::test]
async fn integration_transport_failures_surface_as_upsert_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/owner/repo/issues/42/comments");
        then.status(500).body("internal error");
    });

    let tag = TrackerTag::parse("DeploymentService").expect("tag");
    let tracker = CommentTracker::new(tag, issue(), client(&server));

    let error = tracker
        .upsert(|_previous: Option<DeployMeta>| async move {
            Ok::<_, std::convert::Infallible>((
                "never posted".to_string(),
                DeployMeta {
                    deployment_id: "deploy-1".to_string(),
                    attempt: 1,
                },
                (),
            ))
        })
        .await
        .expect_err("transport failure must surface");

    assert!(matches!(error, UpsertError::Transport(_)));
}
