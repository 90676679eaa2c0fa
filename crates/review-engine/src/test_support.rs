//! Shared fixtures for engine tests.

use review_host::{FixtureClient, PullRequestFixture};

pub const FIXTURE: &str = r#"{
    "owner": "acme",
    "repo": "widgets",
    "pull_request": {
        "number": 7,
        "title": "Tidy up app",
        "author": "octocat",
        "head_sha": "head1",
        "base_sha": "base1",
        "head_branch": "tidy",
        "base_branch": "main"
    },
    "files": [
        {
            "filename": "src/app.ts",
            "status": "modified",
            "additions": 1,
            "deletions": 1,
            "sha": "sha-app",
            "patch": "@@ -1,3 +1,3 @@\n a\n-b\n+B\n c"
        },
        {
            "filename": "README.md",
            "status": "modified",
            "additions": 1,
            "deletions": 1,
            "sha": "sha-readme",
            "patch": "@@ -1 +1 @@\n-old\n+new"
        },
        {
            "filename": "src/util/math.ts",
            "status": "added",
            "additions": 2,
            "sha": "sha-math",
            "patch": "@@ -0,0 +1,2 @@\n+x\n+y"
        }
    ],
    "comments": [
        {
            "id": 1,
            "path": "src/app.ts",
            "line": 2,
            "side": "RIGHT",
            "body": "Why uppercase?",
            "author": "reviewer",
            "created_at": "2024-01-01T10:00:00Z"
        },
        {
            "id": 2,
            "path": "src/app.ts",
            "body": "Style guide.",
            "author": "octocat",
            "created_at": "2024-01-01T11:00:00Z",
            "in_reply_to_id": 1
        },
        {
            "id": 3,
            "path": "src/app.ts",
            "line": 3,
            "side": "RIGHT",
            "body": "Nice.",
            "author": "reviewer",
            "created_at": "2024-01-01T12:00:00Z"
        }
    ],
    "threads": [
        { "id": "thread-1", "is_resolved": false, "comment_ids": [1, 2] },
        { "id": "thread-3", "is_resolved": false, "comment_ids": [3] }
    ],
    "contents": {
        "head1:src/app.ts": "a\nB\nc\nd\ne\nf\n",
        "head1:README.md": "new\n",
        "head1:src/util/math.ts": "x\ny\n"
    }
}"#;

pub fn fixture() -> PullRequestFixture {
    PullRequestFixture::from_json(FIXTURE).unwrap()
}

pub fn client() -> FixtureClient {
    FixtureClient::new(fixture())
}
