//! Lowering configuration.

/// Target and policy knobs for one lowering run.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LowerConfig {
    /// Width of pointers and of `isize` / `usize`.
    pub pointer_bits: u32,
    /// Element capacity of a freshly constructed `Vector<T>`. With 0 the
    /// elements pointer starts out null and the first `add` allocates.
    pub vector_initial_capacity: u64,
    /// Name of the user function wrapped by the C `main` entry point.
    pub entry_point: String,
    /// Name of the lowered module.
    pub module_name: String,
}

impl Default for LowerConfig {
    fn default() -> Self {
        LowerConfig {
            pointer_bits: 64,
            vector_initial_capacity: 4,
            entry_point: "main".to_owned(),
            module_name: "reso".to_owned(),
        }
    }
}
