//! Canned JSON fixtures and named data tasks.
//!
//! Fixtures are `<dir>/<name>.json` files; tests can shadow any name with an
//! in-memory value. Tasks are synchronous producers addressed by name, the
//! way a scenario asks its harness for fresh data.

use crate::datagen::DataGenerator;
use crate::result::{CheckError, CheckResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Fixture loader rooted at a directory
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    dir: PathBuf,
    overrides: HashMap<String, Value>,
}

impl FixtureStore {
    /// Store reading from `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overrides: HashMap::new(),
        }
    }

    /// Serve `value` for `name` instead of reading a file
    #[must_use]
    pub fn with_override(mut self, name: impl Into<String>, value: Value) -> Self {
        self.overrides.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a fixture name maps to; a trailing `.json` is optional
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        let file = if name.ends_with(".json") {
            name.to_string()
        } else {
            format!("{name}.json")
        };
        self.dir.join(file)
    }

    /// Fixture as untyped JSON
    pub fn load(&self, name: &str) -> CheckResult<Value> {
        if let Some(value) = self.overrides.get(name) {
            return Ok(value.clone());
        }
        let path = self.path_for(name);
        debug!(path = %path.display(), "load fixture");
        let text = std::fs::read_to_string(&path).map_err(|e| CheckError::Fixture {
            message: format!("cannot read fixture {}: {e}", path.display()),
        })?;
        serde_json::from_str(&text).map_err(|e| CheckError::Fixture {
            message: format!("fixture {} is not valid JSON: {e}", path.display()),
        })
    }

    /// Fixture deserialized into `T`
    pub fn load_as<T: DeserializeOwned>(&self, name: &str) -> CheckResult<T> {
        let value = self.load(name)?;
        serde_json::from_value(value).map_err(|e| CheckError::Fixture {
            message: format!("fixture {name} has an unexpected shape: {e}"),
        })
    }

    /// One field of a fixture by JSON pointer, e.g. `/searchTerms/valid/0`
    pub fn pointer(&self, name: &str, pointer: &str) -> CheckResult<Value> {
        self.load(name)?
            .pointer(pointer)
            .cloned()
            .ok_or_else(|| CheckError::Fixture {
                message: format!("fixture {name} has nothing at {pointer}"),
            })
    }
}

/// Task body: argument in, JSON out
pub type Task = Arc<dyn Fn(Value) -> CheckResult<Value> + Send + Sync>;

/// Tasks by name
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Task>,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.tasks.keys().collect();
        names.sort();
        f.debug_struct("TaskRegistry").field("tasks", &names).finish()
    }
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `log` (writes its argument at info, returns null) and
    /// `generateTestData` (a fresh signup record)
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("log", |arg| {
            match &arg {
                Value::String(message) => info!(target: "storecheck::task", "{message}"),
                other => info!(target: "storecheck::task", "{other}"),
            }
            Ok(Value::Null)
        });
        registry.register("generateTestData", |_| {
            Ok(serde_json::to_value(DataGenerator::signup_record())?)
        });
        registry
    }

    /// Add or replace a task
    pub fn register<F>(&mut self, name: impl Into<String>, task: F) -> &mut Self
    where
        F: Fn(Value) -> CheckResult<Value> + Send + Sync + 'static,
    {
        self.tasks.insert(name.into(), Arc::new(task));
        self
    }

    /// Run a task; unknown names are fixture errors
    pub fn run(&self, name: &str, arg: Value) -> CheckResult<Value> {
        let task = self.tasks.get(name).ok_or_else(|| CheckError::Fixture {
            message: format!("no task named {name:?}"),
        })?;
        task(arg)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }
}
