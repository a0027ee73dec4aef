//! Turning command-line arguments and JSON files into append steps.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use prep_model::{Action, AppendStep};

/// Split `key=value`. The value may itself contain `=`.
pub fn parse_parameter(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("parameter '{raw}' is not of the form KEY=VALUE");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("parameter '{raw}' has an empty key");
    }
    Ok((key.to_string(), value.to_string()))
}

/// One step running `action` with `parameters`, creating `creates`.
pub fn build_step(action: &str, parameters: &[String], creates: &[String]) -> Result<AppendStep> {
    let mut built = Action::new(action.trim());
    for raw in parameters {
        let (key, value) = parse_parameter(raw)?;
        built = built.with_parameter(key, value);
    }
    Ok(AppendStep::single(built).with_created_columns(creates.iter().cloned()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StepsFile {
    Many(Vec<AppendStep>),
    One(AppendStep),
}

pub fn parse_steps(json: &str) -> Result<Vec<AppendStep>> {
    let parsed: StepsFile = serde_json::from_str(json).context("parse steps")?;
    Ok(match parsed {
        StepsFile::Many(steps) => steps,
        StepsFile::One(step) => vec![step],
    })
}

/// Steps from a JSON file holding one step object or an array of them.
pub fn read_steps(path: &Path) -> Result<Vec<AppendStep>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("read steps from {}", path.display()))?;
    parse_steps(&json).with_context(|| format!("load steps from {}", path.display()))
}
