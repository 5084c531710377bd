use std::fs;
use std::path::PathBuf;
use std::process::Output;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("field_schema_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(&path, contents).expect("failed to write file");
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Minimal fragment set: `host` reuses `geo`, which stays top-level.
fn write_schemas(dir: &TempDir) -> PathBuf {
    dir.write(
        "schemas/geo.yml",
        r#"
name: geo
group: 2
fields:
  city_name:
    type: keyword
    description: City name.
"#,
    );
    dir.write(
        "schemas/host.yml",
        r#"
name: host
group: 2
fields:
  name:
    type: keyword
    description: Name of the host.
  os:
    fields:
      platform:
        type: keyword
        description: Operating system platform.
reuse:
  - source_group: geo
    target_path: geo
    contributes_to_top_level: true
"#,
    );
    dir.write(
        "schemas/base.yml",
        r#"
name: base
root: true
group: 1
fields:
  "@timestamp":
    type: date
    description: Date/time when the event originated.
"#,
    );
    dir.write("version", "8.11.0\n");
    dir.join("schemas")
}

fn run(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_field-schema"))
        .args(args)
        .output()
        .expect("failed to run field-schema")
}

fn path_str(path: &PathBuf) -> &str {
    path.to_str().unwrap()
}

// ---------------------------------------------------------------------------
// Generate
// ---------------------------------------------------------------------------

#[test]
fn generate_writes_intermediate_files_and_manifest() {
    let dir = TempDir::new("generate_full");
    let schemas = write_schemas(&dir);
    let out = dir.join("out");

    let output = run(&[
        "generate",
        "--schemas",
        path_str(&schemas),
        "--out",
        path_str(&out),
        "--version-file",
        path_str(&dir.join("version")),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let generated = out.join("generated");
    let flat = fs::read_to_string(generated.join("flat.yml")).unwrap();
    assert!(flat.contains("host.geo.city_name"));
    assert!(flat.contains("host.os.platform"));
    assert!(flat.contains("@timestamp"));
    assert!(generated.join("nested.yml").exists());

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(generated.join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["version"], "8.11.0");
    assert_eq!(manifest["field_count"], 5);
    assert_eq!(manifest["group_count"], 3);
    assert_eq!(manifest["subset_applied"], false);
}

#[test]
fn generate_with_subset_restricts_output() {
    let dir = TempDir::new("generate_subset");
    let schemas = write_schemas(&dir);
    let subset = dir.write("subset.yml", "host:\n  fields:\n    os:\n      fields: '*'\n");
    let out = dir.join("out");

    let output = run(&[
        "generate",
        "--schemas",
        path_str(&schemas),
        "--subset",
        path_str(&subset),
        "--out",
        path_str(&out),
        "--version-file",
        path_str(&dir.join("version")),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let flat = fs::read_to_string(out.join("generated").join("flat.yml")).unwrap();
    assert!(flat.contains("host.os.platform"));
    assert!(!flat.contains("host.name"));
    assert!(!flat.contains("geo.city_name"));
}

#[test]
fn generate_intermediate_only_skips_manifest() {
    let dir = TempDir::new("generate_intermediate_only");
    let schemas = write_schemas(&dir);
    let out = dir.join("out");

    let output = run(&[
        "generate",
        "--schemas",
        path_str(&schemas),
        "--out",
        path_str(&out),
        "--version-file",
        path_str(&dir.join("version")),
        "--intermediate-only",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let generated = out.join("generated");
    assert!(generated.join("nested.yml").exists());
    assert!(generated.join("flat.yml").exists());
    assert!(!generated.join("manifest.json").exists());
}

#[test]
fn generate_reads_intermediate_only_from_config() {
    let dir = TempDir::new("generate_config_intermediate_only");
    write_schemas(&dir);
    let config = dir.write(
        "field-schema.yml",
        &format!(
            "schemas: {}\nout: {}\nversion_file: {}\nintermediate_only: true\n",
            path_str(&dir.join("schemas")),
            path_str(&dir.join("configured")),
            path_str(&dir.join("version")),
        ),
    );

    let output = run(&["generate", "--config", path_str(&config)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let generated = dir.join("configured").join("generated");
    assert!(generated.join("flat.yml").exists());
    assert!(!generated.join("manifest.json").exists());
}

#[test]
fn generate_reads_config_file() {
    let dir = TempDir::new("generate_config");
    write_schemas(&dir);
    let config = dir.write(
        "field-schema.yml",
        &format!(
            "schemas: {}\nout: {}\nversion_file: {}\n",
            path_str(&dir.join("schemas")),
            path_str(&dir.join("configured")),
            path_str(&dir.join("version")),
        ),
    );

    let output = run(&["generate", "--config", path_str(&config)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.join("configured").join("generated").join("flat.yml").exists());
}

#[test]
fn generate_fails_on_subset_matching_nothing() {
    let dir = TempDir::new("generate_empty_subset");
    let schemas = write_schemas(&dir);
    let subset = dir.write("subset.yml", "nothing:\n  fields: '*'\n");
    let out = dir.join("out");

    let output = run(&[
        "generate",
        "--schemas",
        path_str(&schemas),
        "--subset",
        path_str(&subset),
        "--out",
        path_str(&out),
        "--version-file",
        path_str(&dir.join("version")),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("subset matched no fields"));
    assert!(!out.join("generated").exists(), "no partial output");
}

#[test]
fn generate_fails_on_duplicate_include() {
    let dir = TempDir::new("generate_duplicate");
    let schemas = write_schemas(&dir);
    let custom = dir.write("custom/host.yml", "name: host\nfields: {}\n");

    let output = run(&[
        "generate",
        "--schemas",
        path_str(&schemas),
        "--include",
        path_str(&custom),
        "--out",
        path_str(&dir.join("out")),
        "--version-file",
        path_str(&dir.join("version")),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate key: host"));
}

// ---------------------------------------------------------------------------
// Lookup / Validate
// ---------------------------------------------------------------------------

#[test]
fn lookup_prints_field_yaml() {
    let dir = TempDir::new("lookup");
    let schemas = write_schemas(&dir);

    let output = run(&["lookup", "--schemas", path_str(&schemas), "host.geo.city_name"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("type: keyword"));
    assert!(stdout.contains("City name."));
}

#[test]
fn lookup_path_after_repeated_include_is_positional() {
    let dir = TempDir::new("lookup_include");
    let schemas = write_schemas(&dir);
    let acme = dir.write(
        "custom/acme.yml",
        "name: acme\nfields:\n  tenant:\n    type: keyword\n    description: Tenant.\n",
    );
    let billing = dir.write(
        "custom/billing.yml",
        "name: billing\nfields:\n  plan:\n    type: keyword\n    description: Plan.\n",
    );

    let output = run(&[
        "lookup",
        "--schemas",
        path_str(&schemas),
        "--include",
        path_str(&acme),
        "--include",
        path_str(&billing),
        "acme.tenant",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Tenant."));
}

#[test]
fn lookup_missing_path_fails() {
    let dir = TempDir::new("lookup_missing");
    let schemas = write_schemas(&dir);

    let output = run(&["lookup", "--schemas", path_str(&schemas), "host.os.kernel"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("path not found: host.os.kernel"));
}

#[test]
fn validate_lists_groups_in_priority_order() {
    let dir = TempDir::new("validate");
    let schemas = write_schemas(&dir);

    let output = run(&["validate", "--schemas", path_str(&schemas)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Resolved 3 group(s) with 5 field(s)."));
    assert!(stdout.contains("base, geo, host"));
    assert!(dir.path().exists());
}
