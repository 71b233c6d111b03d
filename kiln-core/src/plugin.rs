//! Plugins
//!
//! A plugin is applied once to the compiler, before any build runs, and
//! taps the lifecycle hooks it needs.

use crate::compiler::Compiler;
use crate::component::{no_options, Component, ComponentKind, ComponentMetadata};
use crate::hooks::HookName;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::info;

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Tap the compiler's hooks
    fn apply(&self, compiler: &mut Compiler);
}

/// Plugin backed by a closure
pub struct FnPlugin<F> {
    name: String,
    apply: F,
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&mut Compiler) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, compiler: &mut Compiler) {
        (self.apply)(compiler)
    }
}

/// Wrap a closure as a named plugin
pub fn plugin_fn<F>(name: impl Into<String>, apply: F) -> Box<dyn Plugin>
where
    F: Fn(&mut Compiler) + Send + Sync + 'static,
{
    Box::new(FnPlugin {
        name: name.into(),
        apply,
    })
}

/// Factory for a named plugin
pub trait PluginFactory: Component {
    fn create(&self, options: &serde_json::Value) -> Result<Box<dyn Plugin>, String>;
}

fn plugin_metadata(name: &'static str, description: &'static str) -> ComponentMetadata {
    ComponentMetadata::new(name, env!("CARGO_PKG_VERSION"), ComponentKind::Plugin, Some(description))
}

const START_LOG: &str = "build-start-log";
const DONE_LOG: &str = "build-done-log";
const TIMER: &str = "build-timer";

/// Logs when a build starts
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStartLogPlugin;

impl Plugin for BuildStartLogPlugin {
    fn name(&self) -> &str {
        START_LOG
    }

    fn apply(&self, compiler: &mut Compiler) {
        compiler.hooks_mut().tap(HookName::Run, START_LOG, || {
            info!(target: "kiln::hooks", plugin = START_LOG, "compilation started");
            Ok(())
        });
    }
}

impl Component for BuildStartLogPlugin {
    fn metadata(&self) -> ComponentMetadata {
        plugin_metadata(START_LOG, "Log when a build starts")
    }

    fn validate_options(&self, options: &serde_json::Value) -> Result<(), String> {
        no_options(options)
    }
}

impl PluginFactory for BuildStartLogPlugin {
    fn create(&self, _options: &serde_json::Value) -> Result<Box<dyn Plugin>, String> {
        Ok(Box::new(BuildStartLogPlugin))
    }
}

/// Logs when a build finishes
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildDoneLogPlugin;

impl Plugin for BuildDoneLogPlugin {
    fn name(&self) -> &str {
        DONE_LOG
    }

    fn apply(&self, compiler: &mut Compiler) {
        compiler.hooks_mut().tap(HookName::Done, DONE_LOG, || {
            info!(target: "kiln::hooks", plugin = DONE_LOG, "compilation finished");
            Ok(())
        });
    }
}

impl Component for BuildDoneLogPlugin {
    fn metadata(&self) -> ComponentMetadata {
        plugin_metadata(DONE_LOG, "Log when a build finishes")
    }

    fn validate_options(&self, options: &serde_json::Value) -> Result<(), String> {
        no_options(options)
    }
}

impl PluginFactory for BuildDoneLogPlugin {
    fn create(&self, _options: &serde_json::Value) -> Result<Box<dyn Plugin>, String> {
        Ok(Box::new(BuildDoneLogPlugin))
    }
}

/// Logs how long each successful build took
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildTimerPlugin;

impl Plugin for BuildTimerPlugin {
    fn name(&self) -> &str {
        TIMER
    }

    fn apply(&self, compiler: &mut Compiler) {
        let started: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));

        let start = started.clone();
        compiler.hooks_mut().tap(HookName::Run, TIMER, move || {
            if let Ok(mut slot) = start.lock() {
                *slot = Some(Instant::now());
            }
            Ok(())
        });

        compiler.hooks_mut().tap(HookName::Done, TIMER, move || {
            let elapsed = started.lock().ok().and_then(|slot| *slot).map(|t| t.elapsed());
            if let Some(elapsed) = elapsed {
                info!(
                    target: "kiln::hooks",
                    plugin = TIMER,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "build took {:?}",
                    elapsed
                );
            }
            Ok(())
        });
    }
}

impl Component for BuildTimerPlugin {
    fn metadata(&self) -> ComponentMetadata {
        plugin_metadata(TIMER, "Log the duration of each build")
    }

    fn validate_options(&self, options: &serde_json::Value) -> Result<(), String> {
        no_options(options)
    }
}

impl PluginFactory for BuildTimerPlugin {
    fn create(&self, _options: &serde_json::Value) -> Result<Box<dyn Plugin>, String> {
        Ok(Box::new(BuildTimerPlugin))
    }
}
