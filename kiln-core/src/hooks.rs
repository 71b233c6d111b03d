//! Lifecycle hooks
//!
//! Two synchronous hooks, `run` and `done`, owned by one compiler. Callbacks
//! run in the order they were tapped; the first failure stops the call.

use crate::error::{BuildError, HookError};
use std::fmt;
use tracing::{debug, trace};

/// Name of a lifecycle hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookName {
    /// Fired once per build, before graph construction
    Run,
    /// Fired once per successful build, after assets are written
    Done,
}

impl HookName {
    pub const ALL: [HookName; 2] = [HookName::Run, HookName::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookName::Run => "run",
            HookName::Done => "done",
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tapped callback
pub type HookCallback = Box<dyn FnMut() -> Result<(), HookError> + Send>;

struct Tap {
    name: String,
    callback: HookCallback,
}

/// Callbacks per hook, in registration order
#[derive(Default)]
pub struct HookRegistry {
    run: Vec<Tap>,
    done: Vec<Tap>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("run", &self.taps(HookName::Run))
            .field("done", &self.taps(HookName::Done))
            .finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, hook: HookName) -> &Vec<Tap> {
        match hook {
            HookName::Run => &self.run,
            HookName::Done => &self.done,
        }
    }

    fn list_mut(&mut self, hook: HookName) -> &mut Vec<Tap> {
        match hook {
            HookName::Run => &mut self.run,
            HookName::Done => &mut self.done,
        }
    }

    /// Append `callback` to `hook` under the tap name `name`
    pub fn tap<F>(&mut self, hook: HookName, name: impl Into<String>, callback: F)
    where
        F: FnMut() -> Result<(), HookError> + Send + 'static,
    {
        let name = name.into();
        trace!(target: "kiln::hooks", hook = %hook, tap = %name, "tapped");
        self.list_mut(hook).push(Tap {
            name,
            callback: Box::new(callback),
        });
    }

    /// Tap names of `hook`, in call order
    pub fn taps(&self, hook: HookName) -> Vec<&str> {
        self.list(hook).iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self, hook: HookName) -> bool {
        self.list(hook).is_empty()
    }

    /// Invoke every callback of `hook` in registration order
    pub fn call(&mut self, hook: HookName) -> Result<(), BuildError> {
        debug!(target: "kiln::hooks", hook = %hook, taps = self.list(hook).len(), "calling hook");
        for tap in self.list_mut(hook).iter_mut() {
            (tap.callback)().map_err(|source| BuildError::Hook {
                hook,
                tap: tap.name.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
