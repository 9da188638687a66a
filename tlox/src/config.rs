pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Clone)]
pub struct Config {
    /// Calls nested deeper than this fail with "Stack overflow.". The host
    /// stack grows on demand, so this is the only bound on Lox recursion.
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
