//! Command dispatch

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::rules::direct_shareholding;
use crate::domain::{AffiliationType, EntityId, Percentage, UserAccess};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::RealFileSystem;
use crate::infrastructure::InfraError;

pub fn execute(cli: &Cli) -> CliResult<()> {
    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| InfraError::io("current dir", e))?,
    };

    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Config { command }) => config_command(command, &dir),
        Some(command) => {
            let settings = Settings::load(Some(&dir))?;
            data_command(command, settings)
        }
        None => Err(CliError::Usage("no command given, see --help".to_string())),
    }
}

fn config_command(command: &ConfigCommands, dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::detail(&format!("global: {}", path.display())),
                None => output::detail("global: <no config directory>"),
            }
            output::detail(&format!("local:  {}", local_config_path(dir).display()));
        }
    }
    Ok(())
}

fn seed_path(seed: &Option<PathBuf>, settings: &Settings) -> CliResult<PathBuf> {
    seed.clone()
        .or_else(|| settings.seed_file.clone())
        .ok_or_else(|| {
            CliError::Usage("no seed file given and no seed_file configured".to_string())
        })
}

fn open(seed: &Option<PathBuf>, settings: Settings) -> CliResult<ServiceContainer> {
    let path = seed_path(seed, &settings)?;
    debug!("open: seed {}", path.display());
    Ok(ServiceContainer::from_seed(settings, Arc::new(RealFileSystem), &path)?)
}

#[instrument(level = "debug", skip_all)]
fn data_command(command: &Commands, settings: Settings) -> CliResult<()> {
    match command {
        Commands::Tree { seed } => {
            let container = open(seed, settings)?;
            print_tree(&container)
        }
        Commands::Sections { seed } => {
            let container = open(seed, settings)?;
            print_sections(&container);
            Ok(())
        }
        Commands::Total { seed } => {
            let container = open(seed, settings)?;
            let summary = container.ownership.summary();
            output::summary(&summary);
            if summary.over_allocated {
                return Err(CliError::OverAllocated {
                    total: summary.total,
                });
            }
            Ok(())
        }
        Commands::Check { seed } => {
            let path = seed_path(seed, &settings)?;
            let container = ServiceContainer::new(settings);
            let entities = container.seed_loader().check(&path)?;
            output::success(&format!(
                "{}: {} entities, ownership graph is consistent",
                path.display(),
                entities.len()
            ));
            Ok(())
        }
        Commands::Link {
            seed,
            parent,
            owner,
            pct,
        } => {
            let shareholding =
                Percentage::parse(pct).map_err(|e| CliError::InvalidArgs(e.to_string()))?;
            let container = open(seed, settings)?;
            container.ownership.link_existing(
                &EntityId::from(parent.as_str()),
                &EntityId::from(owner.as_str()),
                Some(shareholding),
            )?;
            output::success(&format!("{owner} now holds {shareholding} of {parent}"));
            print_tree(&container)
        }
        Commands::Role {
            seed,
            id,
            role,
            pct,
            access,
            mobile,
        } => {
            if pct.is_some() && *role != AffiliationType::Shareholder {
                return Err(CliError::InvalidArgs(format!(
                    "--pct only applies to {}",
                    AffiliationType::Shareholder
                )));
            }
            if (access.is_some() || mobile.is_some()) && *role != AffiliationType::User {
                return Err(CliError::InvalidArgs(format!(
                    "--access and --mobile only apply to {}",
                    AffiliationType::User
                )));
            }
            let container = open(seed, settings)?;
            let id = EntityId::from(id.as_str());
            match role {
                AffiliationType::Shareholder => container
                    .ownership
                    .make_shareholder(&id, pct.as_deref().unwrap_or_default())?,
                AffiliationType::User => container.ownership.make_user(
                    &id,
                    UserAccess {
                        mobile_number: mobile.clone().unwrap_or_default(),
                        access_rights: access.unwrap_or_default(),
                    },
                )?,
                other => container.ownership.add_to_role(&id, *other)?,
            }
            output::success(&format!("{id} added to {role}"));
            print_sections(&container);
            Ok(())
        }
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

fn print_tree(container: &ServiceContainer) -> CliResult<()> {
    let tree = container.ownership.tree()?;
    output::info(&tree.to_tree_string());
    output::summary(&container.ownership.summary());
    Ok(())
}

fn print_sections(container: &ServiceContainer) {
    for section in container.ownership.sections() {
        output::header(&format!("{} ({})", section.spec.title, section.members.len()));
        for member in &section.members {
            let pct = match section.spec.kind {
                AffiliationType::Shareholder => {
                    direct_shareholding(member)
                        .map(|p| format!(" [{p}]"))
                        .unwrap_or_else(|| " [n/a]".to_string())
                }
                _ => String::new(),
            };
            output::detail(&format!("{member}{pct}"));
        }
        if !section.available.is_empty() {
            output::hint(&format!(
                "available: {}",
                section.available.iter().map(|e| e.display_name()).join(", ")
            ));
        }
        if let Some(summary) = &section.summary {
            output::summary(summary);
        }
    }
}
