//! Input component: abstract actions bound to script behaviors

use rhai::{Engine, EvalAltResult, FnPtr, FuncArgs, AST};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Abstract input actions, independent of the physical key binding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Confirm,
    Cancel,
    Pause,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::MoveUp,
        Action::MoveDown,
        Action::MoveLeft,
        Action::MoveRight,
        Action::Confirm,
        Action::Cancel,
        Action::Pause,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Action::MoveUp => "MoveUp",
            Action::MoveDown => "MoveDown",
            Action::MoveLeft => "MoveLeft",
            Action::MoveRight => "MoveRight",
            Action::Confirm => "Confirm",
            Action::Cancel => "Cancel",
            Action::Pause => "Pause",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = String;

    /// Action names are matched case-insensitively (`MoveUp`, `moveup`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

/// Opaque reference to a script callable bound to an action.
///
/// Holds the function pointer exactly as the definition produced it, plus
/// a shared handle to the compiled definition script so closures and
/// script-local functions stay resolvable after the definition is dropped.
#[derive(Clone)]
pub struct Behavior {
    callback: FnPtr,
    script: Option<Arc<AST>>,
}

impl Behavior {
    pub fn new(callback: FnPtr, script: Option<Arc<AST>>) -> Self {
        Self { callback, script }
    }

    /// Name of the referenced function (anonymous closures get a generated name)
    pub fn name(&self) -> &str {
        self.callback.fn_name()
    }

    pub fn fn_ptr(&self) -> &FnPtr {
        &self.callback
    }

    /// Invoke the callable. Dispatch policy belongs to the input system;
    /// this only forwards to the script engine.
    pub fn call<T: Clone + Send + Sync + 'static>(
        &self,
        engine: &Engine,
        args: impl FuncArgs,
    ) -> Result<T, Box<EvalAltResult>> {
        match &self.script {
            Some(ast) => self.callback.call(engine, ast, args),
            None => self.callback.call(engine, &AST::empty(), args),
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("callback", &self.callback.fn_name())
            .field("scripted", &self.script.is_some())
            .finish()
    }
}

/// Maps abstract actions to the behaviors they trigger
#[derive(Clone, Debug, Default)]
pub struct Input {
    pub actions: HashMap<Action, Behavior>,
}

impl Input {
    pub fn behavior(&self, action: Action) -> Option<&Behavior> {
        self.actions.get(&action)
    }

    pub fn is_bound(&self, action: Action) -> bool {
        self.actions.contains_key(&action)
    }
}
