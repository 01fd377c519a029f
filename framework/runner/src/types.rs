/// Recommended result type for scenario `main` functions and any shared
/// behaviour code written for hooks. Compatible with
/// [crate::definition::HookResult] so errors propagate with `?`.
pub type GaleResult<T> = anyhow::Result<T>;
