//! Validate, convert and run built-in scenarios end to end

use preflight_core::{ClientError, ClientResult, ComputeClient, Image, Outcome};
use preflight_rules::default_registry;
use preflight_scenarios::{
    BootRequest, Catalog, GlanceImages, ImageService, ImageSpec, ImageUpdate, ScenarioError,
    Server, ServerService, CREATE_AND_LIST_IMAGE, CREATE_IMAGE_AND_BOOT_INSTANCES, LIST_IMAGES,
};
use preflight_test_utils::{init_test_tracing, scenario_config, FakeClients, FakeDeployment};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use std::sync::Mutex;

#[derive(Default)]
struct InMemoryImages {
    images: Mutex<Vec<Image>>,
    created: Mutex<Vec<ImageSpec>>,
}

impl ImageService for InMemoryImages {
    fn create_image(&self, spec: &ImageSpec) -> ClientResult<Image> {
        let mut images = self.images.lock().unwrap();
        let image = Image {
            id: format!("img-{}", images.len()),
            name: "bench-image".to_string(),
            ..Image::default()
        };
        images.push(image.clone());
        self.created.lock().unwrap().push(spec.clone());
        Ok(image)
    }

    fn list_images(&self) -> ClientResult<Vec<Image>> {
        Ok(self.images.lock().unwrap().clone())
    }

    fn get_image(&self, id: &str) -> ClientResult<Image> {
        self.images
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| ClientError::not_found("image", id))
    }

    fn delete_image(&self, id: &str) -> ClientResult<()> {
        self.images.lock().unwrap().retain(|i| i.id != id);
        Ok(())
    }

    fn update_image(&self, id: &str, _update: &ImageUpdate) -> ClientResult<Image> {
        self.get_image(id)
    }
}

#[derive(Default)]
struct RecordingServers {
    requests: Mutex<Vec<BootRequest>>,
}

impl ServerService for RecordingServers {
    fn boot_servers(&self, request: &BootRequest) -> ClientResult<Vec<Server>> {
        self.requests.lock().unwrap().push(request.clone());
        Ok((0..request.count)
            .map(|i| Server {
                id: format!("srv-{i}"),
                name: format!("server-{i}"),
            })
            .collect())
    }
}

fn cloud() -> FakeClients {
    FakeClients::new()
        .with_service("image")
        .with_service("compute")
        .with_flavor("1", "m1.tiny", 512, 1)
        .with_flavor("2", "m1.small", 2048, 20)
}

#[test]
fn test_list_images_flow() {
    init_test_tracing();
    let catalog = Catalog::builtin(default_registry().unwrap()).unwrap();
    let deployment = FakeDeployment::with_single_user(cloud());
    let config = scenario_config(json!({"args": {}, "context": {"cleanup": ["glance"]}}));

    let args = catalog
        .prepare(LIST_IMAGES, &config, &deployment, None, None)
        .unwrap()
        .unwrap();
    GlanceImages::new(&InMemoryImages::default())
        .run(LIST_IMAGES, &args)
        .unwrap();
}

#[test]
fn test_restricted_name_blocks_create() {
    init_test_tracing();
    let catalog = Catalog::builtin(default_registry().unwrap()).unwrap();
    let deployment = FakeDeployment::with_single_user(cloud());
    let config = scenario_config(json!({"args": {
        "container_format": "bare",
        "image_location": "http://example.com/cirros.img",
        "disk_format": "qcow2",
        "name": "fixed",
    }}));

    let outcome = catalog
        .prepare(CREATE_AND_LIST_IMAGE, &config, &deployment, None, None)
        .unwrap()
        .unwrap_err();
    assert_eq!(
        outcome,
        Outcome::invalid("You can't specify parameters 'name' in 'args'")
    );
}

#[test]
fn test_missing_users_reported_first() {
    init_test_tracing();
    let catalog = Catalog::builtin(default_registry().unwrap()).unwrap();
    let outcome = catalog
        .validate(LIST_IMAGES, &scenario_config(json!({})), &FakeDeployment::new(), None)
        .unwrap();
    assert_eq!(outcome, Outcome::invalid("No user credentials for cloud"));
}

#[test]
fn test_missing_image_service() {
    init_test_tracing();
    let catalog = Catalog::builtin(default_registry().unwrap()).unwrap();
    let deployment = FakeDeployment::with_single_user(FakeClients::new().with_service("compute"));
    let outcome = catalog
        .validate(LIST_IMAGES, &scenario_config(json!({})), &deployment, None)
        .unwrap();
    assert!(outcome.message().unwrap().starts_with("'image' service is not available."));
}

#[test]
fn test_boot_flow_converts_flavor_and_location() {
    init_test_tracing();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "image bytes").unwrap();
    let location = file.path().to_str().unwrap().to_string();

    let catalog = Catalog::builtin(default_registry().unwrap()).unwrap();
    let clients = cloud();
    let deployment = FakeDeployment::with_single_user(cloud());
    let config = scenario_config(json!({"args": {
        "container_format": "bare",
        "image_location": location,
        "disk_format": "qcow2",
        "flavor": {"name": "m1.small"},
        "number_instances": 2,
        "boot_server_kwargs": {"key_name": "demo"},
    }}));

    let args = catalog
        .prepare(
            CREATE_IMAGE_AND_BOOT_INSTANCES,
            &config,
            &deployment,
            None,
            Some(&clients as &dyn ComputeClient),
        )
        .unwrap()
        .unwrap();
    assert_eq!(args["flavor"], json!("2"));
    assert!(std::path::Path::new(args["image_location"].as_str().unwrap()).is_absolute());

    let images = InMemoryImages::default();
    let servers = RecordingServers::default();
    GlanceImages::new(&images)
        .with_servers(&servers)
        .run(CREATE_IMAGE_AND_BOOT_INSTANCES, &args)
        .unwrap();

    assert_eq!(
        images.created.lock().unwrap()[0].image_location,
        args["image_location"].as_str().unwrap()
    );
    let requests = servers.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].image_id, "img-0");
    assert_eq!(requests[0].flavor_id, "2");
    assert_eq!(requests[0].count, 2);
}

#[test]
fn test_unknown_flavor_fails_validation_before_conversion() {
    init_test_tracing();
    let catalog = Catalog::builtin(default_registry().unwrap()).unwrap();
    let deployment = FakeDeployment::with_single_user(cloud());
    let config = scenario_config(json!({"args": {
        "container_format": "bare",
        "image_location": "http://example.com/cirros.img",
        "disk_format": "qcow2",
        "flavor": {"name": "m1.huge"},
        "number_instances": 1,
    }}));

    let outcome = catalog
        .prepare(CREATE_IMAGE_AND_BOOT_INSTANCES, &config, &deployment, None, None)
        .unwrap()
        .unwrap_err();
    assert_eq!(
        outcome,
        Outcome::invalid(r#"Flavor '{"name":"m1.huge"}' not found"#)
    );
}

#[test]
fn test_unknown_scenario() {
    let catalog = Catalog::builtin(default_registry().unwrap()).unwrap();
    assert!(matches!(
        catalog.validate("Nope.nope", &scenario_config(json!({})), &FakeDeployment::new(), None),
        Err(ScenarioError::Unknown(_))
    ));
}
