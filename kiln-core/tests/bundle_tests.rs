//! Whole-build tests against an in-memory file system

use kiln_config::BundlerConfig;
use kiln_core::{
    compiler_from_config, plugin_fn, transform_fn, BuildError, BuildState, Compiler, CompilerOptions,
    HookName, ModuleId, ScriptParser, TransformError,
};
use kiln_vfs::{MemoryFileSystem, VirtualFileSystem};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Create the in-memory project used by most tests
fn create_test_fs(files: Vec<(&str, &str)>) -> Arc<MemoryFileSystem> {
    Arc::new(MemoryFileSystem::with_text_files(files))
}

fn scenario_fs() -> Arc<MemoryFileSystem> {
    create_test_fs(vec![
        ("/app/src/main.js", "const a = require('./a');\nconsole.log(a.add(2, a.subtract(4, 2)));"),
        (
            "/app/src/a.js",
            "const b = require('./b');\nexports.add = (x, y) => x + y;\nexports.subtract = b.subtract;",
        ),
        ("/app/src/b.js", "exports.subtract = (x, y) => x - y;"),
        ("/app/src/alt.js", "const b = require('./b');\nconsole.log(b.subtract(9, 3));"),
    ])
}

fn scenario_options() -> CompilerOptions {
    CompilerOptions::new("/app")
        .entry("main", "./src/main.js")
        .entry("alt", "./src/alt.js")
        .output("dist", "[name].bundle.js")
}

#[test]
fn test_two_entries_share_a_module() {
    let fs = scenario_fs();
    let mut compiler = Compiler::new(scenario_options(), fs.clone());
    let output = compiler.run().expect("build failed");
    let stats = &output.stats;

    assert_eq!(stats.modules.len(), 4);
    let b = stats
        .modules
        .iter()
        .find(|m| m.id.as_str() == "./src/b.js")
        .unwrap();
    assert_eq!(b.chunk_names(), ["main", "alt"]);

    let main = stats.chunks.iter().find(|c| c.name == "main").unwrap();
    let alt = stats.chunks.iter().find(|c| c.name == "alt").unwrap();
    assert_eq!(
        main.module_ids,
        vec![
            ModuleId::new("./src/main.js"),
            ModuleId::new("./src/a.js"),
            ModuleId::new("./src/b.js"),
        ]
    );
    assert_eq!(
        alt.module_ids,
        vec![ModuleId::new("./src/b.js"), ModuleId::new("./src/alt.js")]
    );

    let main_bundle = fs.read_to_string(Path::new("/app/dist/main.bundle.js")).unwrap();
    let alt_bundle = fs.read_to_string(Path::new("/app/dist/alt.bundle.js")).unwrap();
    assert!(main_bundle.contains("\"./src/a.js\": (module, exports, require) => {"));
    assert!(main_bundle.contains("require(\"./src/b.js\")"));
    assert!(!alt_bundle.contains("\"./src/a.js\""));
    assert!(alt_bundle.contains("\"./src/b.js\": (module, exports, require) => {"));
}

#[test]
fn test_bundle_has_no_build_time_paths() {
    let fs = scenario_fs();
    let mut compiler = Compiler::new(scenario_options(), fs.clone());
    let output = compiler.run().unwrap();

    for code in output.stats.assets.values() {
        assert!(code.starts_with("(() => {\n"));
        assert!(code.ends_with("})()\n"));
        assert!(!code.contains("/app/"));
        assert!(!code.contains("require('./"));
    }
}

#[test]
fn test_shared_module_parsed_once() {
    struct CountingParser {
        parsed: Mutex<Vec<String>>,
    }

    impl ScriptParser for CountingParser {
        fn parse(&self, source: &str) -> Result<Box<dyn kiln_core::SyntaxTree>, kiln_core::SyntaxError> {
            self.parsed.lock().unwrap().push(source.to_string());
            kiln_core::SwcParser::new().parse(source)
        }
    }

    let parser = Arc::new(CountingParser {
        parsed: Mutex::new(Vec::new()),
    });
    let mut compiler = Compiler::new(scenario_options(), scenario_fs()).with_parser(parser.clone());
    compiler.run().unwrap();

    let parsed = parser.parsed.lock().unwrap();
    assert_eq!(parsed.len(), 4);
    let b_parses = parsed.iter().filter(|s| s.contains("exports.subtract = (x, y)")).count();
    assert_eq!(b_parses, 1);
}

#[test]
fn test_extension_resolution_order() {
    let fs = create_test_fs(vec![
        ("/p/main.js", "require('./foo');"),
        ("/p/foo.js", "exports.kind = 'js';"),
        ("/p/foo.json", "{ \"kind\": \"json\" }"),
    ]);
    let options = CompilerOptions::new("/p")
        .single_entry("./main.js")
        .extensions([".js", ".json"]);
    let compilation = Compiler::new(options, fs).compile().unwrap();

    let ids: Vec<&str> = compilation.modules().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["./main.js", "./foo.js"]);
}

#[test]
fn test_loader_order_is_right_to_left() {
    let fs = create_test_fs(vec![("/p/main.js", "x")]);
    let append = |tag: &'static str| {
        transform_fn(tag, move |source: &str| -> Result<String, TransformError> {
            Ok(format!("{}+{}", source, tag))
        })
    };
    let options = CompilerOptions::new("/p")
        .single_entry("./main.js")
        .rule(r"\.js$", vec![append("loaderA"), append("loaderB")])
        .unwrap();
    let compilation = Compiler::new(options, fs).compile().unwrap();

    assert_eq!(compilation.modules()[0].transformed_source, "x+loaderB+loaderA");
}

#[test]
fn test_hook_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let recording = |label: &'static str| {
        let log = log.clone();
        plugin_fn(label, move |compiler: &mut Compiler| {
            for hook in [HookName::Run, HookName::Done] {
                let log = log.clone();
                compiler.hooks_mut().tap(hook, label, move || {
                    log.lock().unwrap().push(format!("{}:{}", label, hook));
                    Ok(())
                });
            }
        })
    };
    let options = scenario_options().plugin(recording("P1")).plugin(recording("P2"));
    let mut compiler = Compiler::new(options, scenario_fs());

    compiler.run().unwrap();
    compiler.run().unwrap();

    let expected = ["P1:run", "P2:run", "P1:done", "P2:done"];
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 8);
    assert_eq!(&log[..4], &expected);
    assert_eq!(&log[4..], &expected);
}

#[test]
fn test_failed_resolution_writes_nothing() {
    let fs = create_test_fs(vec![
        ("/p/main.js", "require('./a');"),
        ("/p/a.js", "require('./b');"),
        ("/p/ok.js", "1;"),
    ]);
    let done = Arc::new(Mutex::new(false));
    let flag = done.clone();
    let options = CompilerOptions::new("/p")
        .entry("ok", "./ok.js")
        .entry("main", "./main.js")
        .plugin(plugin_fn("done-flag", move |compiler: &mut Compiler| {
            let flag = flag.clone();
            compiler.hooks_mut().tap(HookName::Done, "done-flag", move || {
                *flag.lock().unwrap() = true;
                Ok(())
            });
        }));
    let mut compiler = Compiler::new(options, fs.clone());

    let err = compiler.run().unwrap_err();
    assert!(matches!(err, BuildError::Resolution { ref specifier, .. } if specifier == "./b"));
    assert_eq!(compiler.state(), BuildState::Failed);
    assert!(!fs.exists(Path::new("/p/dist")));
    assert!(!*done.lock().unwrap());
}

#[test]
fn test_loader_failure_names_module() {
    let fs = create_test_fs(vec![("/p/main.js", "require('./bad');"), ("/p/bad.js", "")]);
    let options = CompilerOptions::new("/p")
        .single_entry("./main.js")
        .rule(
            "bad",
            vec![transform_fn("reject", |_: &str| Err(TransformError::new("rejected")))],
        )
        .unwrap();
    let err = Compiler::new(options, fs.clone()).run().unwrap_err();

    match err {
        BuildError::Loader { module, loader, .. } => {
            assert_eq!(module, ModuleId::new("./bad.js"));
            assert_eq!(loader, "reject");
        }
        other => panic!("expected loader error, got {:?}", other),
    }
    assert!(fs.file_paths().iter().all(|p| !p.starts_with("/p/dist")));
}

#[test]
fn test_dynamic_require_rejected() {
    let fs = create_test_fs(vec![("/p/main.js", "const name = './a';\nrequire(name);")]);
    let err = Compiler::new(CompilerOptions::new("/p").single_entry("./main.js"), fs)
        .run()
        .unwrap_err();
    assert!(matches!(err, BuildError::UnsupportedDependency { ref argument, .. } if argument == "name"));
}

#[test]
fn test_builds_are_deterministic() {
    let first = Compiler::new(scenario_options(), scenario_fs()).run().unwrap();
    let second = Compiler::new(scenario_options(), scenario_fs()).run().unwrap();
    assert_eq!(first.stats.assets, second.stats.assets);

    let mut compiler = Compiler::new(scenario_options(), scenario_fs());
    let a = compiler.compile().unwrap();
    let b = compiler.compile().unwrap();
    assert_eq!(a.assets(), b.assets());
}

#[test]
fn test_same_file_different_specifiers() {
    let fs = create_test_fs(vec![
        ("/p/main.js", "require('./lib/x'); require('./lib/x.js'); require('./lib/../lib/x');"),
        ("/p/lib/x.js", ""),
    ]);
    let compilation = Compiler::new(CompilerOptions::new("/p").single_entry("./main.js"), fs)
        .compile()
        .unwrap();

    assert_eq!(compilation.modules().len(), 2);
    let main = compilation.module(&ModuleId::new("./main.js")).unwrap();
    assert_eq!(main.dependencies.len(), 3);
    assert!(main
        .dependencies
        .iter()
        .all(|d| d.resolved_id == ModuleId::new("./lib/x.js")));
}

#[test]
fn test_from_config_with_builtin_components() {
    let fs = create_test_fs(vec![
        ("/p/src/main.js", "\u{feff}const data = require('./data');"),
        ("/p/src/data.json", "{ \"answer\": 42 }"),
    ]);
    let config = BundlerConfig::from_json_str(
        r#"{
            "entry": "./src/main.js",
            "module": { "rules": [
                { "test": "\\.json$", "use": ["json"] },
                { "test": "\\.js$", "use": [{ "name": "banner", "options": { "text": "built by kiln" } }, "strip-bom"] }
            ] },
            "resolve": { "extensions": [".js", ".json"] },
            "plugins": ["build-start-log", "build-done-log", "build-timer"]
        }"#,
    )
    .unwrap();
    let mut compiler = compiler_from_config(&config, "/p", fs.clone()).unwrap();
    let output = compiler.run().unwrap();

    let bundle = fs.read_to_string(Path::new("/p/dist/main.js")).unwrap();
    assert!(bundle.contains("// built by kiln\nconst data = require(\"./src/data.json\");"));
    assert!(bundle.contains("module.exports = { \"answer\": 42 };"));
    assert_eq!(output.file_dependencies.len(), 2);
}

#[test]
fn test_late_entry_bundle_is_complete() {
    let fs = create_test_fs(vec![
        ("/p/main.js", "require('./a');"),
        ("/p/a.js", "require('./b');"),
        ("/p/b.js", "exports.deep = true;"),
        ("/p/alt.js", "require('./a');"),
    ]);
    let options = CompilerOptions::new("/p")
        .entry("main", "./main.js")
        .entry("alt", "./alt.js");
    let compilation = Compiler::new(options, fs).compile().unwrap();

    let alt = compilation.chunk("alt").unwrap();
    assert_eq!(
        alt.module_ids,
        vec![ModuleId::new("./a.js"), ModuleId::new("./b.js"), ModuleId::new("./alt.js")]
    );
    assert!(compilation.assets()["alt.js"].contains("exports.deep = true;"));
}

#[test]
fn test_tracing_does_not_change_output() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();
    let traced = tracing::subscriber::with_default(subscriber, || {
        Compiler::new(scenario_options(), scenario_fs()).run().unwrap()
    });
    let plain = Compiler::new(scenario_options(), scenario_fs()).run().unwrap();
    assert_eq!(traced.stats.assets, plain.stats.assets);
}
