use crate::ast::Value;
use crate::{EvalError, MAX_EVAL_DEPTH};
use std::iter;

/// One binding frame. Bindings keep their insertion order, and a name appears at
/// most once per frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    bindings: Vec<(String, Value)>,
}

impl Frame {
    pub fn new() -> Self {
        Frame {
            bindings: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Replace the value bound to `name` in this frame, or append a new binding
    pub fn bind(&mut self, name: &str, value: Value) {
        match self.bindings.iter_mut().find(|(bound, _)| bound == name) {
            Some((_, slot)) => *slot = value,
            None => self.bindings.push((name.to_owned(), value)),
        }
    }

    /// Bindings in insertion order
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// The chain of frames visible to an evaluation.
///
/// The root frame is global and lives as long as the environment. Applying a
/// closure pushes the closure's own frame on top, making the frame that was
/// current at the call site its parent, and pops it when the body returns.
/// Lookups walk from the current frame down to the root.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    root: Frame,
    frames: Vec<Frame>,
    depth: usize,
}

impl Environment {
    /// An environment with an empty global frame and no builtins.
    /// See [`crate::evaluator::create_global_env`] for the usual starting point.
    pub fn new() -> Self {
        Environment {
            root: Frame::new(),
            frames: Vec::new(),
            depth: 0,
        }
    }

    /// Find `name` in the current frame or the nearest parent that binds it.
    /// The caller gets its own copy of the value.
    pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        self.frames
            .iter()
            .rev()
            .chain(iter::once(&self.root))
            .find_map(|frame| frame.get(name))
            .cloned()
            .ok_or_else(|| EvalError::UnboundSymbol(name.to_owned()))
    }

    /// Bind in the current frame only; parents are never touched
    pub fn bind_local(&mut self, name: &str, value: Value) {
        self.current_frame_mut().bind(name, value);
    }

    /// Bind in the root frame, visible from everywhere
    pub fn bind_global(&mut self, name: &str, value: Value) {
        self.root.bind(name, value);
    }

    pub fn current_frame(&self) -> &Frame {
        self.frames.last().unwrap_or(&self.root)
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().unwrap_or(&mut self.root)
    }

    pub fn global_frame(&self) -> &Frame {
        &self.root
    }

    /// Number of closure frames above the root
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Remove the current frame. The root frame is never removed.
    pub(crate) fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Count one more level of nested evaluation
    pub(crate) fn enter(&mut self) -> Result<(), EvalError> {
        if self.depth >= MAX_EVAL_DEPTH {
            return Err(EvalError::DepthExceeded {
                max: MAX_EVAL_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Get all bindings visible from the current frame
    /// Returns a Vec of (name, value) pairs sorted by name
    pub fn visible_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings: Vec<(String, Value)> = Vec::new();

        // Nearest frame first, so inner bindings shadow outer ones
        for frame in self.frames.iter().rev().chain(iter::once(&self.root)) {
            for (name, value) in frame.bindings() {
                if !bindings.iter().any(|(seen, _)| seen == name) {
                    bindings.push((name.to_owned(), value.clone()));
                }
            }
        }

        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }
}
