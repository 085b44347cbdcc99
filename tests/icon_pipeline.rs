//! End-to-end behaviour of the icon pipeline against a fake engine.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{FakeEngine, icns, image};
use dmg_bundler::bundler::icon::{
    Availability, AvailabilityGate, IconContainer, IconError, IconOutcome, VariantTag,
    compose_icon, compose_variants,
};

fn tag(code: &str) -> VariantTag {
    code.parse().unwrap()
}

fn text(container: &IconContainer, code: &str) -> String {
    String::from_utf8(container.get(tag(code)).unwrap().to_vec()).unwrap()
}

#[tokio::test]
async fn forces_maximum_from_largest_app_image() {
    let app = icns(&[
        (b"icp4", image(16, "app-16")),
        (b"ic09", image(512, "app-512-large")),
    ]);
    let template = icns(&[
        (b"icp4", image(16, "disk-16")),
        (b"ic09", image(512, "disk-512")),
        (b"ic10", image(1024, "disk-1024")),
    ]);

    let composed = compose_variants(Arc::new(FakeEngine::available()), &app, &template)
        .await
        .unwrap();

    let tags: Vec<_> = composed.container.tags().map(|t| t.to_string()).collect();
    assert_eq!(tags, ["ic09", "ic10", "icp4"]);
    assert_eq!(
        text(&composed.container, "icp4"),
        "distorted(png:16:app-16) on png:16:disk-16"
    );
    assert_eq!(
        text(&composed.container, "ic10"),
        "distorted(png:512:app-512-large) on png:1024:disk-1024"
    );
    assert_eq!(composed.report.forced_from, Some(tag("ic09")));
    assert_eq!(composed.report.composed, vec![tag("ic09"), tag("icp4")]);
}

#[tokio::test]
async fn single_variant_is_reused_for_maximum() {
    let app = icns(&[(b"ic08", image(256, "app-256"))]);
    let template = icns(&[
        (b"ic08", image(256, "disk-256")),
        (b"ic10", image(1024, "disk-1024")),
    ]);

    let composed = compose_variants(Arc::new(FakeEngine::available()), &app, &template)
        .await
        .unwrap();

    let tags: Vec<_> = composed.container.tags().map(|t| t.to_string()).collect();
    assert_eq!(tags, ["ic08", "ic10"]);
    assert_eq!(
        text(&composed.container, "ic10"),
        "distorted(png:256:app-256) on png:1024:disk-1024"
    );
}

#[tokio::test]
async fn app_maximum_is_not_forced_again() {
    let engine = Arc::new(FakeEngine::available());
    let app = icns(&[(b"ic10", image(1024, "app-1024"))]);
    let template = icns(&[(b"ic10", image(1024, "disk-1024"))]);

    let composed = compose_variants(Arc::clone(&engine), &app, &template)
        .await
        .unwrap();

    assert_eq!(composed.report.forced_from, None);
    assert_eq!(engine.distortions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unmatched_app_variants_are_skipped() {
    let app = icns(&[
        (b"ic07", image(128, "app-128")),
        (b"ic09", image(512, "app-512")),
    ]);
    let template = icns(&[
        (b"ic09", image(512, "disk-512")),
        (b"ic10", image(1024, "disk-1024")),
    ]);

    let composed = compose_variants(Arc::new(FakeEngine::available()), &app, &template)
        .await
        .unwrap();

    assert!(!composed.container.contains(tag("ic07")));
    assert_eq!(composed.report.skipped, vec![tag("ic07")]);
    assert!(composed.container.contains(VariantTag::MAXIMUM));
}

#[tokio::test]
async fn auxiliary_elements_are_ignored() {
    let app = icns(&[
        (b"TOC ", b"table".to_vec()),
        (b"s8mk", vec![0xff; 256]),
        (b"ic09", image(512, "app-512")),
    ]);
    let template = icns(&[
        (b"icnV", vec![0, 0, 0, 1]),
        (b"ic09", image(512, "disk-512")),
        (b"ic10", image(1024, "disk-1024")),
    ]);

    let composed = compose_variants(Arc::new(FakeEngine::available()), &app, &template)
        .await
        .unwrap();

    let tags: Vec<_> = composed.container.tags().map(|t| t.to_string()).collect();
    assert_eq!(tags, ["ic09", "ic10"]);
    assert!(composed.report.skipped.is_empty());
}

#[tokio::test]
async fn failed_pass_fails_the_whole_composition() {
    let app = icns(&[
        (b"icp4", image(16, "app-16")),
        (b"ic09", image(512, "broken")),
    ]);
    let template = icns(&[
        (b"icp4", image(16, "disk-16")),
        (b"ic09", image(512, "disk-512")),
        (b"ic10", image(1024, "disk-1024")),
    ]);

    let err = compose_variants(Arc::new(FakeEngine::failing_on("broken")), &app, &template)
        .await
        .unwrap_err();
    assert!(matches!(err, IconError::EngineFailed { .. }), "{err}");
}

#[tokio::test]
async fn undecodable_variant_is_an_image_error() {
    let app = icns(&[(b"ic09", b"not an image".to_vec())]);
    let template = icns(&[
        (b"ic09", image(512, "disk-512")),
        (b"ic10", image(1024, "disk-1024")),
    ]);

    let err = compose_variants(Arc::new(FakeEngine::available()), &app, &template)
        .await
        .unwrap_err();
    assert!(
        matches!(err, IconError::ImageDecode { tag, .. } if tag == "ic09".parse().unwrap()),
        "{err}"
    );
}

#[tokio::test]
async fn missing_template_maximum_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let app_path = dir.path().join("app.icns");
    let template_path = dir.path().join("disk.icns");
    let destination = dir.path().join("out/volume.icns");
    std::fs::write(&app_path, icns(&[(b"ic09", image(512, "app-512"))])).unwrap();
    std::fs::write(&template_path, icns(&[(b"ic09", image(512, "disk-512"))])).unwrap();

    let engine = Arc::new(FakeEngine::available());
    let mut gate = AvailabilityGate::new();
    let err = compose_icon(engine.clone(), &mut gate, &app_path, &template_path, &destination)
        .await
        .unwrap_err();

    assert!(matches!(err, IconError::MissingMaximumVariant { .. }), "{err}");
    assert!(!destination.exists());
    assert_eq!(engine.distortions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bad_template_magic_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let app_path = dir.path().join("app.icns");
    let template_path = dir.path().join("disk.icns");
    let destination = dir.path().join("volume.icns");
    std::fs::write(&app_path, icns(&[(b"ic09", image(512, "app-512"))])).unwrap();
    let mut bad = icns(&[(b"ic10", image(1024, "disk-1024"))]);
    bad[..4].copy_from_slice(b"PNG!");
    std::fs::write(&template_path, bad).unwrap();

    let engine = Arc::new(FakeEngine::available());
    let mut gate = AvailabilityGate::new();
    let err = compose_icon(engine.clone(), &mut gate, &app_path, &template_path, &destination)
        .await
        .unwrap_err();

    assert!(matches!(err, IconError::MalformedContainer { .. }), "{err}");
    assert!(!destination.exists());
    assert_eq!(engine.distortions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unavailable_engine_copies_template_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let app_path = dir.path().join("app.icns");
    let template_path = dir.path().join("disk.icns");
    let destination = dir.path().join("volume.icns");
    let template = icns(&[
        (b"ic09", image(512, "disk-512")),
        (b"ic10", image(1024, "disk-1024")),
    ]);
    std::fs::write(&app_path, icns(&[(b"ic09", image(512, "app-512"))])).unwrap();
    std::fs::write(&template_path, &template).unwrap();

    let engine = Arc::new(FakeEngine::missing());
    let mut gate = AvailabilityGate::new();
    let outcome = compose_icon(engine.clone(), &mut gate, &app_path, &template_path, &destination)
        .await
        .unwrap();

    assert_eq!(outcome, IconOutcome::Fallback);
    assert_eq!(std::fs::read(&destination).unwrap(), template);
    assert_eq!(gate.state(), Availability::Unavailable);
    assert_eq!(engine.probes.load(Ordering::SeqCst), 2);
    assert_eq!(engine.installs.load(Ordering::SeqCst), 1);
    assert_eq!(engine.distortions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn composed_icon_is_written_and_decodable() {
    let dir = tempfile::tempdir().unwrap();
    let app_path = dir.path().join("app.icns");
    let template_path = dir.path().join("disk.icns");
    let destination = dir.path().join("nested/volume.icns");
    std::fs::write(&app_path, icns(&[(b"ic09", image(512, "app-512"))])).unwrap();
    std::fs::write(
        &template_path,
        icns(&[
            (b"ic09", image(512, "disk-512")),
            (b"ic10", image(1024, "disk-1024")),
        ]),
    )
    .unwrap();

    let mut gate = AvailabilityGate::new();
    let outcome = compose_icon(
        Arc::new(FakeEngine::available()),
        &mut gate,
        &app_path,
        &template_path,
        &destination,
    )
    .await
    .unwrap();

    let IconOutcome::Composed(report) = outcome else {
        panic!("expected a composed icon");
    };
    assert_eq!(report.forced_from, Some(tag("ic09")));

    let written = IconContainer::decode(&std::fs::read(&destination).unwrap()).unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(
        text(&written, "ic10"),
        "distorted(png:512:app-512) on png:1024:disk-1024"
    );
    assert!(!dir.path().join("nested/volume.icns.partial").exists());
}

#[tokio::test]
async fn gate_installs_once_and_memoises() {
    let engine = FakeEngine::installable();
    let mut gate = AvailabilityGate::new();

    assert_eq!(gate.resolve(&engine).await, Availability::Available);
    assert_eq!(gate.resolve(&engine).await, Availability::Available);

    assert_eq!(engine.probes.load(Ordering::SeqCst), 2);
    assert_eq!(engine.installs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn gate_skips_install_when_present() {
    let engine = FakeEngine::available();
    let mut gate = AvailabilityGate::new();

    assert_eq!(gate.resolve(&engine).await, Availability::Available);
    assert_eq!(engine.probes.load(Ordering::SeqCst), 1);
    assert_eq!(engine.installs.load(Ordering::SeqCst), 0);
}
