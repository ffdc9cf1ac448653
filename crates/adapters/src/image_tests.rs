// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn unparseable_inspect_output_is_platform_error() {
    // `echo` prints its arguments, which is not an os/arch pair
    let images = DockerImages::with_docker(DockerCmd::with_program("echo"));
    let err = images.platform("alpine:latest").await.unwrap_err();
    assert!(matches!(err, ImageError::Platform { ref image, .. } if image == "alpine:latest"), "{err:?}");
}

#[tokio::test]
async fn failed_inspect_and_pull_is_exec_error() {
    let images = DockerImages::with_docker(DockerCmd::with_program("false"));
    let err = images.platform("alpine:latest").await.unwrap_err();
    assert!(matches!(err, ImageError::Exec(_)), "{err:?}");
}

#[tokio::test]
async fn fake_records_build_with_dockerfile() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Dockerfile"), "FROM $IMAGE\n").unwrap();
    let images = FakeImages::new();
    images.set_platform(Platform::new("linux", "arm64"));

    let tag = ImageRef::parse("web-patch:latest").unwrap();
    let platform = images.platform("alpine:latest").await.unwrap();
    images.build(dir.path(), "alpine:latest", &tag, &platform).await.unwrap();
    images.push(&tag).await.unwrap();

    assert_eq!(
        images.calls(),
        vec![
            ImageCall::Platform { image: "alpine:latest".into() },
            ImageCall::Build {
                base: "alpine:latest".into(),
                tag: "web-patch:latest".into(),
                platform: "linux/arm64".into(),
                dockerfile: "FROM $IMAGE\n".into(),
            },
            ImageCall::Push { image: "web-patch:latest".into() },
        ]
    );
}
