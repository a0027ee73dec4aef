//! Resolving the ids typed on the command line.
//!
//! Ids are long content hashes; any unambiguous prefix is accepted.

use anyhow::{Result, bail};

use prep_history::PreparationService;
use prep_model::{Identifiable, Preparation};

/// Preparation whose id is `reference` or starts with it.
pub fn resolve_preparation(service: &PreparationService, reference: &str) -> Result<Preparation> {
    if reference.is_empty() {
        bail!("empty preparation id");
    }
    if let Ok(preparation) = service.get(reference) {
        return Ok(preparation);
    }
    let matches: Vec<Preparation> = service
        .list()?
        .into_iter()
        .filter(|preparation| preparation.id().starts_with(reference))
        .collect();
    match matches.as_slice() {
        [] => bail!("no preparation matches '{reference}'"),
        [one] => Ok(one.clone()),
        _ => bail!("'{reference}' matches {} preparations", matches.len()),
    }
}

/// Step of the preparation's history whose id is `reference` or starts with it.
pub fn resolve_step(service: &PreparationService, preparation_id: &str, reference: &str) -> Result<String> {
    if reference.is_empty() {
        bail!("empty step id");
    }
    let steps = service.list_steps(preparation_id)?;
    let matches: Vec<&str> = steps
        .iter()
        .map(Identifiable::id)
        .filter(|id| id.starts_with(reference))
        .collect();
    match matches.as_slice() {
        [] => bail!("no step of the preparation matches '{reference}'"),
        [one] => Ok((*one).to_string()),
        _ if matches.contains(&reference) => Ok(reference.to_string()),
        _ => bail!("'{reference}' matches {} steps", matches.len()),
    }
}
