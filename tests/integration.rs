use std::path::{Path, PathBuf};

use oasdir::codec::Codec;
use oasdir::disk::{load, read_tree, save, write_tree};
use oasdir::mutations::{add_group, add_path, delete_operation, move_path_to_group};
use oasdir::naming::{RandomNouns, unused_path};
use oasdir::spec::{Operation, PathItem, Response, Schema};
use oasdir::{Codecs, Error, FileNode, HttpMethod, RefOr, Serializer};

/// Copy a fixture into a fresh temporary directory and return its root.
fn copy_fixture(name: &str) -> (tempfile::TempDir, PathBuf) {
    let tree = read_tree(&Path::new("tests/fixtures").join(name)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join(name);
    write_tree(&root, &tree).unwrap();
    return (dir, root);
}

/// A path item with a single GET operation.
fn get_only() -> PathItem {
    let mut item = PathItem::default();
    item.set_operation(HttpMethod::Get, Some(Operation::default()));
    return item;
}

/// Codec that refuses to encode anything.
struct RefusingCodec;

impl Codec for RefusingCodec {
    fn decode_value(&self, _bytes: &[u8]) -> Result<serde_json::Value, String> {
        return Err("refusing".to_string());
    }

    fn encode_value(&self, _value: &serde_json::Value) -> Result<Vec<u8>, String> {
        return Err("refusing".to_string());
    }
}

#[test]
fn load_then_save_is_byte_identical() {
    let (_dir, root) = copy_fixture("petstore");
    std::fs::create_dir_all(root.join("paths/drafts")).unwrap();
    std::fs::create_dir_all(root.join("assets/empty")).unwrap();
    let before = read_tree(&root).unwrap();

    let document = load(&root, None).unwrap();
    save(&root, &document).unwrap();

    assert_eq!(read_tree(&root).unwrap(), before);
}

#[test]
fn loaded_document_resolves_across_files() {
    let document = load(Path::new("tests/fixtures/petstore"), None).unwrap();

    let names: Vec<&str> = document.paths.keys().map(String::as_str).collect();
    assert_eq!(names, ["/health", "/pets", "/pets/{petId}"]);

    let pets = document.paths.get("/pets").unwrap().resolve(&document).unwrap().unwrap();
    assert_eq!(pets.get.as_ref().unwrap().operation_id.as_deref(), Some("listPets"));

    let by_id = document.paths.get("/pets/{petId}").unwrap().resolve(&document).unwrap().unwrap();
    let not_found: &RefOr<Response> = by_id.get.as_ref().unwrap().responses.get("404").unwrap();
    let response = not_found.resolve_from(&document, "paths/pets/pet_by_id.yaml").unwrap().unwrap();
    assert_eq!(response.description, "Pet not found");

    let schema = response.content.get("application/json").unwrap().schema.as_ref().unwrap();
    let pet = schema.resolve_from(&document, "components/responses/NotFound.json").unwrap().unwrap();
    assert_eq!(pet.0["type"], "object");

    let problem = RefOr::<Schema>::reference("#/components/schemas/Problem");
    assert!(problem.resolve(&document).unwrap().is_some());
    assert!(document.other_files.contains_key("README.md"));
}

#[test]
fn edits_only_rewrite_touched_files() {
    let (_dir, root) = copy_fixture("petstore");
    let before = read_tree(&root).unwrap();

    let mut document = load(&root, None).unwrap();
    delete_operation(&mut document, "/pets", HttpMethod::Post).unwrap();
    save(&root, &document).unwrap();

    let after = read_tree(&root).unwrap();
    assert_ne!(after.get_file("paths/pets.yaml"), before.get_file("paths/pets.yaml"));
    assert!(!String::from_utf8_lossy(after.get_file("paths/pets.yaml").unwrap()).contains("createPet"));
    for untouched in ["openapi.yaml", "paths/pets/pet_by_id.yaml", "components/schemas/Pet.yaml", "README.md"] {
        assert_eq!(after.get_file(untouched), before.get_file(untouched), "{untouched} changed");
    }
}

#[test]
fn add_then_delete_leaves_no_orphan_file() {
    let (_dir, root) = copy_fixture("petstore");
    let mut document = load(&root, None).unwrap();

    add_group(&mut document, &["store"], "orders").unwrap();
    let key = add_path(&mut document, "/store/orders", &["store", "orders"], get_only()).unwrap();
    save(&root, &document).unwrap();
    assert!(root.join(&key).is_file());

    let mut document = load(&root, None).unwrap();
    assert!(document.paths.contains_key("/store/orders"));
    delete_operation(&mut document, "/store/orders", HttpMethod::Get).unwrap();
    assert!(!document.paths.contains_key("/store/orders"));
    assert!(!document.component_files.as_ref().unwrap().paths.contains_key(&key));

    save(&root, &document).unwrap();
    assert!(!root.join(&key).exists());
    assert!(root.join("paths/store/orders").is_dir());
}

#[test]
fn moving_a_path_moves_its_file() {
    let (_dir, root) = copy_fixture("petstore");
    let mut document = load(&root, None).unwrap();

    let key = move_path_to_group(&mut document, "/health", &["ops"]).unwrap();
    assert_eq!(key, "paths/ops/health.yaml");
    let key = move_path_to_group(&mut document, "/pets", &["v2"]).unwrap();
    assert_eq!(key, "paths/v2/pets.yaml");
    save(&root, &document).unwrap();

    assert!(root.join("paths/ops/health.yaml").is_file());
    assert!(root.join("paths/v2/pets.yaml").is_file());
    assert!(!root.join("paths/pets.yaml").exists());

    let reloaded = load(&root, None).unwrap();
    let health = reloaded.paths.get("/health").unwrap();
    assert_eq!(health.as_reference(), Some("paths/ops/health.yaml"));
    assert!(health.resolve(&reloaded).unwrap().unwrap().get.is_some());
}

#[test]
fn failed_encode_writes_nothing() {
    let (_dir, root) = copy_fixture("petstore");
    let before = read_tree(&root).unwrap();

    let mut document = load(&root, None).unwrap();
    let name = unused_path(&document, &mut RandomNouns::seeded(3));
    add_path::<&str>(&mut document, &name, &[], get_only()).unwrap();

    let serializer = Serializer::with_codecs(Codecs::new(Box::new(RefusingCodec), Box::new(RefusingCodec)));
    let previous = FileNode::Directory(before.clone());
    let result = serializer.serialize(&document, Some(&previous));
    assert!(matches!(result, Err(Error::Encode { .. })));
    assert_eq!(read_tree(&root).unwrap(), before);
}

#[test]
fn directory_without_main_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("paths")).unwrap();
    std::fs::write(dir.path().join("paths/a.yaml"), "get: {}\n").unwrap();

    let err = load(dir.path(), None).unwrap_err();
    assert!(matches!(err, Error::MissingMainFile { .. }));
    assert!(oasdir::diagnostics::render_error(&err).contains("openapi.yaml"));
}

#[test]
fn single_file_documents_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("api.json");
    let source = "{\n    \"openapi\": \"3.0.3\",\n    \"info\": {\"title\": \"Tiny\", \"version\": \"0\"}\n}\n";
    std::fs::write(&file, source).unwrap();

    let mut document = load(&file, None).unwrap();
    save(&file, &document).unwrap();
    assert_eq!(std::fs::read_to_string(&file).unwrap(), source);

    document.info.title = "Renamed".to_string();
    save(&file, &document).unwrap();
    assert!(std::fs::read_to_string(&file).unwrap().contains("\"Renamed\""));
}
