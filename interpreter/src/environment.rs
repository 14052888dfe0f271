/// A loop counter binding, pushed when a for loop starts.
#[derive(Debug, Clone)]
pub struct Scope {
    name: String,
    value: f64,
}

/// Loop-variable scopes of a single run.
///
/// Each for loop pushes one scope for its counter and pops it on exit, so a
/// nested loop reusing a counter name shadows the outer one and the outer
/// value is back in effect after the inner loop ends. `x` is not stored here.
#[derive(Debug, Default)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Environment { scopes: Vec::new() }
    }

    pub fn push_scope(&mut self, name: &str, value: f64) {
        self.scopes.push(Scope {
            name: name.to_string(),
            value,
        });
    }

    pub fn pop_scope(&mut self) -> Option<f64> {
        self.scopes.pop().map(|scope| scope.value)
    }

    /// Look up a counter, searching from the innermost loop outward.
    pub fn get_variable(&self, name: &str) -> Option<f64> {
        self.scopes
            .iter()
            .rev()
            .find(|scope| scope.name == name)
            .map(|scope| scope.value)
    }

    /// Add `delta` to the innermost loop's counter.
    pub fn advance(&mut self, delta: f64) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.value += delta;
        }
    }
}
