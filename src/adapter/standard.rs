use super::Adapter;

/// Plain ruleset: base points only, no bonuses, no recess. Used by tests and
/// by any match that doesn't need a house ruleset's quirks.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardAdapter;

impl Adapter for StandardAdapter {
    fn match_type(&self) -> &'static str {
        "Standard"
    }
}
