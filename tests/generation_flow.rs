//! End-to-end generation flow: generate, hand-edit, regenerate.

use std::fs;
use std::path::Path;

use modelforge::batch::{BuiltinSource, GenerationRun, check_tree};
use modelforge::config::ForgeConfig;
use modelforge::entity::{AttributeSpec, EntitySpec};

fn config_in(dir: &Path, json: bool) -> ForgeConfig {
    ForgeConfig::parse(&format!(
        concat!(
            "[project]\nname = \"shop\"\n\n",
            "[paths]\noutput_root = \"{}\"\nbackup_root = \"{}\"\n\n",
            "[report]\njson = {}\n",
        ),
        dir.join("out").display(),
        dir.join("backup").display(),
        json,
    ))
    .unwrap()
}

fn entities() -> Vec<EntitySpec> {
    vec![
        EntitySpec {
            name: "Party".to_owned(),
            namespace: "shop".to_owned(),
            parents: Vec::new(),
            attributes: Vec::new(),
            doc: None,
        },
        EntitySpec {
            name: "Customer".to_owned(),
            namespace: "shop".to_owned(),
            parents: vec!["Party".to_owned()],
            attributes: vec![
                AttributeSpec {
                    name: "id".to_owned(),
                    ty: "String".to_owned(),
                    mutable: false,
                    doc: None,
                },
                AttributeSpec {
                    name: "name".to_owned(),
                    ty: "String".to_owned(),
                    mutable: true,
                    doc: None,
                },
            ],
            doc: Some("A customer of the shop.".to_owned()),
        },
    ]
}

const HAND_EDITED: &str = r#"record Customer(id: String, name: String) : Party() {
    fun describe(): String {
        return "hand edited"
    }

    fun loyaltyTier(): String {
        return "gold"
    }
}
"#;

#[test]
fn regeneration_preserves_hand_edits_and_logs_the_difference() {
    let dir = tempfile::tempdir().unwrap();
    let run = GenerationRun::new(config_in(dir.path(), false));
    let customer_path = dir.path().join("out/shop/Customer.mf");

    let first = run.run(entities(), &BuiltinSource).unwrap();
    assert!(first.is_success());
    assert_eq!(first.conflicts, 0);
    let generated = fs::read_to_string(&customer_path).unwrap();
    assert!(generated.contains("record Customer(id: String, name: String) : Party() {"));
    assert!(generated.contains("return \"Customer(\" + id + \", \" + name + \")\""));

    // A developer rewrites the method body and adds a method of their own.
    fs::write(&customer_path, HAND_EDITED).unwrap();

    let second = run.run(entities(), &BuiltinSource).unwrap();
    assert!(second.is_success());
    assert_eq!(second.conflicts, 1);

    let merged = fs::read_to_string(&customer_path).unwrap();
    assert!(merged.contains("return \"hand edited\""));
    assert!(merged.contains("fun loyaltyTier(): String"));
    assert!(!merged.contains("return \"Customer(\""));

    // The regeneration's rejected version is itemized in the log.
    let log_path = second.log_path.expect("conflict log written");
    assert!(
        log_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("shop-")
    );
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Customer.describe()"));
    assert!(log.contains("-- old --"));
    assert!(log.contains("-- new --"));
    assert!(log.contains("hand edited"));
    assert!(log.contains("Customer(\" + id"));

    // The hand-edited version was backed up before the overwrite.
    let backup = fs::read_to_string(dir.path().join("backup/shop/Customer.mf")).unwrap();
    assert!(backup.contains("return \"hand edited\""));
    assert!(backup.contains("fun loyaltyTier(): String"));
}

#[test]
fn repeated_regeneration_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let run = GenerationRun::new(config_in(dir.path(), false));
    let customer_path = dir.path().join("out/shop/Customer.mf");

    run.run(entities(), &BuiltinSource).unwrap();
    fs::write(&customer_path, HAND_EDITED).unwrap();

    let second = run.run(entities(), &BuiltinSource).unwrap();
    let after_second = fs::read_to_string(&customer_path).unwrap();

    let third = run.run(entities(), &BuiltinSource).unwrap();
    let after_third = fs::read_to_string(&customer_path).unwrap();

    // The merged file settles: later runs re-report the same divergence but
    // never rewrite the developer's resolution.
    assert_eq!(after_second, after_third);
    assert_eq!(second.conflicts, third.conflicts);

    let summary = check_tree(&dir.path().join("out"), "mf").unwrap();
    assert!(summary.is_clean(), "problems: {:?}", summary.problems);
}

#[test]
fn brace_in_string_body_does_not_lose_following_members() {
    let dir = tempfile::tempdir().unwrap();
    let run = GenerationRun::new(config_in(dir.path(), false));
    let customer_path = dir.path().join("out/shop/Customer.mf");

    run.run(entities(), &BuiltinSource).unwrap();
    let edited = r#"record Customer(id: String, name: String) : Party() {
    fun describe(): String {
        return "}"
    }

    fun closer(): String {
        return "kept"
    }
}
"#;
    fs::write(&customer_path, edited).unwrap();

    let summary = run.run(entities(), &BuiltinSource).unwrap();
    assert!(summary.is_success());
    let merged = fs::read_to_string(&customer_path).unwrap();
    assert!(merged.contains("return \"}\""));
    assert!(merged.contains("fun closer(): String"));
}

#[test]
fn json_report_mirrors_the_text_log() {
    let dir = tempfile::tempdir().unwrap();
    let run = GenerationRun::new(config_in(dir.path(), true));
    let customer_path = dir.path().join("out/shop/Customer.mf");

    run.run(entities(), &BuiltinSource).unwrap();
    fs::write(&customer_path, HAND_EDITED).unwrap();
    let summary = run.run(entities(), &BuiltinSource).unwrap();

    let log_path = summary.log_path.expect("conflict log written");
    let json_path = log_path.with_extension("json");
    let entries: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();

    let entry = &entries.as_array().unwrap()[0];
    assert_eq!(entry["entity"], "Customer");
    let conflict = &entry["conflicts"][0];
    assert_eq!(conflict["location"], "Customer.describe()");
    assert!(
        conflict["existing"]
            .as_str()
            .unwrap()
            .contains("hand edited")
    );
}

#[test]
fn parent_file_is_written_before_child_uses_its_reference() {
    let dir = tempfile::tempdir().unwrap();
    let run = GenerationRun::new(config_in(dir.path(), false));

    let mut batch = entities();
    // Move the parent into another namespace so the child gains an import.
    batch[0].namespace = "core".to_owned();

    let summary = run.run(batch, &BuiltinSource).unwrap();
    assert!(summary.is_success());
    assert!(dir.path().join("out/core/Party.mf").exists());
    let customer = fs::read_to_string(dir.path().join("out/shop/Customer.mf")).unwrap();
    assert!(customer.starts_with("use core.Party\n"));
}
