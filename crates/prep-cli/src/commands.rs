use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::info;

use prep_cli::input::{build_step, read_steps};
use prep_cli::lookup::{resolve_preparation, resolve_step};
use prep_history::{ListQuery, NameMatch, PreparationService, Version};
use prep_model::{AppendStep, Identifiable};

use crate::cli::{ListArgs, StepArgs};
use crate::output::{print_actions, print_locks, print_preparation, print_preparations, print_steps};

fn steps_from(args: &StepArgs) -> Result<Vec<AppendStep>> {
    match (&args.action, &args.from_file) {
        (_, Some(path)) => read_steps(path),
        (Some(action), None) => Ok(vec![build_step(action, &args.params, &args.creates)?]),
        (None, None) => bail!("an action or --from-file is required"),
    }
}

pub fn run_create(service: &PreparationService, data_set: &str, name: &str, owner: &str) -> Result<()> {
    let preparation = service
        .create(data_set, name, owner)
        .context("create preparation")?;
    println!("{}", preparation.id());
    Ok(())
}

pub fn run_list(service: &PreparationService, args: &ListArgs) -> Result<()> {
    let preparations = service.query(&list_query(args))?;
    if preparations.is_empty() {
        println!("No preparations.");
    } else {
        print_preparations(&preparations);
    }
    Ok(())
}

fn list_query(args: &ListArgs) -> ListQuery {
    let mut query = ListQuery::default().sorted(args.sort.into(), args.order.into());
    if let Some(data_set) = &args.data_set {
        query = query.data_set(data_set.as_str());
    }
    if let Some(name) = &args.name {
        query = query.named(NameMatch::new(name.as_str(), !args.contains));
    }
    query
}

pub fn run_show(service: &PreparationService, reference: &str) -> Result<()> {
    let preparation = resolve_preparation(service, reference)?;
    let steps = service.list_steps(preparation.id())?;
    print_preparation(&preparation, steps.len().saturating_sub(1));
    Ok(())
}

pub fn run_steps(service: &PreparationService, reference: &str) -> Result<()> {
    let preparation = resolve_preparation(service, reference)?;
    let steps = service.list_steps(preparation.id())?;
    print_steps(&steps, &preparation.head_id);
    Ok(())
}

pub fn run_actions(service: &PreparationService, reference: &str, version: &str) -> Result<()> {
    let preparation = resolve_preparation(service, reference)?;
    let Ok(version) = version.parse::<Version>();
    let version = match version {
        Version::Step(step) => Version::Step(resolve_step(service, preparation.id(), &step)?),
        other => other,
    };
    let actions = service.versioned_actions(preparation.id(), &version)?;
    print_actions(&actions);
    Ok(())
}

pub fn run_append(service: &PreparationService, reference: &str, args: &StepArgs, owner: &str) -> Result<()> {
    let preparation = resolve_preparation(service, reference)?;
    let steps = steps_from(args)?;
    let count = steps.len();
    let updated = service.with_lock(preparation.id(), owner, |session| session.append(steps))?;
    info!(count, head = %updated.head_id, "steps appended");
    println!("{}", updated.head_id);
    Ok(())
}

pub fn run_update(
    service: &PreparationService,
    reference: &str,
    step: &str,
    args: &StepArgs,
    owner: &str,
) -> Result<()> {
    let preparation = resolve_preparation(service, reference)?;
    let step_id = resolve_step(service, preparation.id(), step)?;
    let mut steps = steps_from(args)?;
    let new_step = match steps.len() {
        1 => steps.remove(0),
        n => bail!("update takes exactly one step, got {n}"),
    };
    let updated = service.with_lock(preparation.id(), owner, |session| {
        session.update_at(&step_id, new_step)
    })?;
    println!("{}", updated.head_id);
    Ok(())
}

pub fn run_delete_step(service: &PreparationService, reference: &str, step: &str, owner: &str) -> Result<()> {
    let preparation = resolve_preparation(service, reference)?;
    let step_id = resolve_step(service, preparation.id(), step)?;
    let updated = service.with_lock(preparation.id(), owner, |session| session.delete_at(&step_id))?;
    println!("{}", updated.head_id);
    Ok(())
}

/// Move the head. The target need not be on the current history, so only an
/// exact step id is accepted.
pub fn run_head(service: &PreparationService, reference: &str, step_id: &str, owner: &str) -> Result<()> {
    let preparation = resolve_preparation(service, reference)?;
    let updated = service.with_lock(preparation.id(), owner, |session| session.move_head(step_id))?;
    println!("{}", updated.head_id);
    Ok(())
}

pub fn run_rename(service: &PreparationService, reference: &str, name: &str, owner: &str) -> Result<()> {
    let preparation = resolve_preparation(service, reference)?;
    service.with_lock(preparation.id(), owner, |session| session.rename(name))?;
    Ok(())
}

pub fn run_clone(service: &PreparationService, reference: &str) -> Result<()> {
    let preparation = resolve_preparation(service, reference)?;
    let copy = service.clone_preparation(preparation.id())?;
    println!("{}", copy.id());
    Ok(())
}

pub fn run_remove(service: &PreparationService, reference: &str, owner: &str) -> Result<()> {
    let preparation = resolve_preparation(service, reference)?;
    let session = service.edit(preparation.id(), owner)?;
    session.delete_preparation()?;
    Ok(())
}

pub fn run_locks(service: &PreparationService, user: Option<&str>) -> Result<()> {
    let locks = match user {
        Some(user) => service.locks().list_by_user(user)?,
        None => service.locks().list_all()?,
    };
    print_locks(&locks, Utc::now().timestamp());
    Ok(())
}

pub fn run_unlock(service: &PreparationService, reference: &str, force: bool, owner: &str) -> Result<()> {
    let preparation = resolve_preparation(service, reference)?;
    if force {
        if !service.locks().remove(preparation.id())? {
            println!("Not locked.");
        }
    } else {
        service.locks().retrieve_unlock(preparation.id(), owner)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use prep_history::{SortKey, SortOrder};

    use super::*;
    use crate::cli::{Cli, Command};

    fn list_args(args: &[&str]) -> ListArgs {
        let cli = Cli::try_parse_from(["prep", "list"].iter().chain(args).copied()).unwrap();
        match cli.command {
            Command::List(args) => args,
            _ => panic!("not a list command"),
        }
    }

    #[test]
    fn list_defaults_to_newest_modification_first() {
        assert_eq!(list_query(&list_args(&[])), ListQuery::default());
    }

    #[test]
    fn list_flags_build_the_query() {
        let query = list_query(&list_args(&[
            "--data-set", "orders", "--name", "Clean", "--contains", "--sort", "name", "--order",
            "asc",
        ]));
        assert_eq!(
            query,
            ListQuery::default()
                .data_set("orders")
                .named(NameMatch::Containing("Clean".to_string()))
                .sorted(SortKey::Name, SortOrder::Asc)
        );
    }

    #[test]
    fn contains_needs_a_name() {
        assert!(Cli::try_parse_from(["prep", "list", "--contains"]).is_err());
    }
}
