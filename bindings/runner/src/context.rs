use gale_runner::prelude::UserValuesConstraint;

/// Per-agent state for proxy profiles.
///
/// `SV` carries any extra values a scenario wants to keep between behaviour
/// cycles; the stock profiles do not need any.
#[derive(Default, Debug)]
pub struct ProxyAgentContext<SV: UserValuesConstraint = ()> {
    pub scenario_values: SV,
}

impl<SV: UserValuesConstraint> UserValuesConstraint for ProxyAgentContext<SV> {}
