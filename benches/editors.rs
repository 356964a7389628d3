//! Benchmarks for document editing and rule application.
//!
//! These measure how key-path edits scale with document size, and the cost
//! of parsing configurations and applying a rule set to a working tree.

use bulk_pr::applier;
use bulk_pr::config::{self, DocumentType};
use bulk_pr::editor;
use bulk_pr::filesystem::MemoryFS;
use bulk_pr::path::KeyPath;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

/// A pretty-printed package.json with `deps` dependencies.
fn generate_package_json(deps: usize) -> String {
    let mut out = String::from("{\n  \"name\": \"bench\",\n  \"version\": \"1.0.0\",\n  \"dependencies\": {\n");
    for i in 0..deps {
        let sep = if i + 1 == deps { "" } else { "," };
        out.push_str(&format!("    \"package-{}\": \"^{}.0.0\"{}\n", i, i, sep));
    }
    out.push_str("  }\n}\n");
    out
}

/// A Helm-style values file with `services` commented sections.
fn generate_values_yaml(services: usize) -> String {
    let mut out = String::from("# generated values\n");
    for i in 0..services {
        out.push_str(&format!(
            "service{}:\n  # image settings\n  image:\n    repository: registry/app-{}\n    tag: \"1.{}\"\n  replicas: {}\n",
            i, i, i, i % 5 + 1
        ));
    }
    out
}

fn generate_config(rules: usize) -> String {
    let mut out = String::from("repos: [acme/api]\nrules:\n");
    for i in 0..rules {
        out.push_str(&format!(
            "  - file: config/app-{}.json\n    type: json\n    changes:\n      - action: update_key\n        path: dependencies.package-{}\n        value: \"^9.0.0\"\n",
            i, i
        ));
    }
    out
}

fn bench_json_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_update");
    for deps in [10, 100, 1000] {
        let content = generate_package_json(deps);
        let path = KeyPath::parse(&format!("dependencies.package-{}", deps / 2)).unwrap();
        let value = json!("^99.0.0");
        group.bench_with_input(BenchmarkId::new("deps", deps), &content, |b, content| {
            b.iter(|| {
                let mut doc = editor::open(DocumentType::Json, black_box(content)).unwrap();
                doc.update_key(&path, &value).unwrap();
                black_box(doc.render().len())
            })
        });
    }
    group.finish();
}

fn bench_yaml_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("yaml_update");
    for services in [10, 100, 500] {
        let content = generate_values_yaml(services);
        let path = KeyPath::parse(&format!("service{}.image.tag", services / 2)).unwrap();
        let value = json!("2.0");
        group.bench_with_input(
            BenchmarkId::new("services", services),
            &content,
            |b, content| {
                b.iter(|| {
                    let mut doc = editor::open(DocumentType::Yaml, black_box(content)).unwrap();
                    doc.update_key(&path, &value).unwrap();
                    black_box(doc.render().len())
                })
            },
        );
    }
    group.finish();
}

fn bench_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parsing");
    for rules in [1, 10, 100] {
        let yaml = generate_config(rules);
        group.bench_with_input(BenchmarkId::new("rules", rules), &yaml, |b, yaml| {
            b.iter(|| config::parse(black_box(yaml)).unwrap())
        });
    }
    group.finish();
}

fn bench_apply_all(c: &mut Criterion) {
    let rules = 50;
    let config = config::parse(&generate_config(rules)).unwrap();
    let mut fs = MemoryFS::new();
    let package = generate_package_json(rules);
    for i in 0..rules {
        fs.add_file_string(format!("config/app-{}.json", i), &package);
    }

    c.bench_function("apply_all_50_files", |b| {
        b.iter(|| black_box(applier::apply_all(&config.rules, &fs).modified_files.len()))
    });
}

criterion_group!(
    benches,
    bench_json_update,
    bench_yaml_update,
    bench_config_parsing,
    bench_apply_all
);
criterion_main!(benches);
