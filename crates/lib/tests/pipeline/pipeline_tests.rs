use std::time::Duration;

use serde_json::json;

use reportbox_lib::error::{Error, ErrorKind};
use reportbox_lib::image::{ArchiveStore, BuildRequest, ImageBuilder, ImageLoader, PackageError};
use reportbox_lib::invoke::{InvokeOptions, Invoker};
use reportbox_lib::schema::FieldSchema;

use super::common::{Host, demo_descriptor, fixture_content};

#[tokio::test]
async fn package_on_one_host_and_invoke_on_another() {
  let build_host = Host::new();
  let archives = build_host.path("archives");
  std::fs::create_dir_all(&archives).unwrap();
  let store = ArchiveStore::open(&archives).unwrap();

  let mut request = BuildRequest::new(demo_descriptor(), "sales");
  request.archive = Some(store.archive_path("sales"));
  let built = ImageBuilder::new(build_host.runtime()).build(&request).await.unwrap();
  assert_eq!(built.digest.len(), 64);
  assert_eq!(store.list().unwrap()[0].image, "sales");

  let run_host = Host::new();
  assert!(!run_host.has_image("sales"));
  run_host.install_engine("sales", &fixture_content("sales-engine.sh"));
  store.load(&ImageLoader::new(run_host.runtime()), "sales").await.unwrap();
  assert!(run_host.has_image("sales"));

  let schema = FieldSchema::load(demo_descriptor().schema()).unwrap();
  let options = InvokeOptions {
    validator: Some(&schema),
    require_image: true,
    deadline: Some(Duration::from_secs(30)),
  };
  let report = Invoker::new(run_host.runtime())
    .invoke_with("sales", &json!({"title": "T", "values": [10.0, 20.0]}), options)
    .await
    .unwrap();
  let text = String::from_utf8(report).unwrap();
  assert_eq!(text, "Report Title: T\nSale: $10.00\nSale: $20.00\nTotal: 30.00\n");
}

#[tokio::test]
async fn same_inputs_give_same_context_digest() {
  let host = Host::new();
  let builder = ImageBuilder::new(host.runtime());
  let request = BuildRequest::new(demo_descriptor(), "sales");

  let first = builder.build(&request).await.unwrap();
  let second = builder.build(&request).await.unwrap();
  assert_eq!(first.digest, second.digest);

  let mut other = request.clone();
  other.base_images.build = "rust:1.85-slim".to_string();
  let third = builder.build(&other).await.unwrap();
  assert_ne!(first.digest, third.digest);
}

#[tokio::test]
async fn errors_classify_by_kind() {
  let host = Host::new();

  let mut request = BuildRequest::new(demo_descriptor(), "sales");
  request.base_images.build = "fail".to_string();
  let err: Error = ImageBuilder::new(host.runtime()).build(&request).await.unwrap_err().into();
  assert_eq!(err.kind(), ErrorKind::BuildFailed);
  assert!(err.diagnostics().unwrap().contains("failed to resolve source metadata"));

  let err: Error = ImageLoader::new(host.runtime())
    .load(&host.path("missing.tar"))
    .await
    .unwrap_err()
    .into();
  assert_eq!(err.kind(), ErrorKind::ImageNotFound);

  let mut request = BuildRequest::new(demo_descriptor(), "sales");
  request.archive = Some(host.path("no/such/dir/sales.tar"));
  let err = ImageBuilder::new(host.runtime()).build(&request).await.unwrap_err();
  assert!(matches!(err, PackageError::ExportFailed { .. }));
  assert_eq!(Error::from(err).kind(), ErrorKind::ExportFailed);
}
