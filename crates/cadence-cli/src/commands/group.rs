use anyhow::Result;
use cadence_core::repository::Repository;
use owo_colors::OwoColorize;
use uuid::Uuid;

use crate::cli::{GroupCommand, GroupSubcommand};
use crate::util::find_group;
use crate::views::table::display_groups;

pub async fn group_command(
    repo: &impl Repository,
    user_id: Option<Uuid>,
    command: GroupCommand,
) -> Result<()> {
    match command.command {
        GroupSubcommand::Add { name } => {
            let group = repo.add_group(name).await?;
            println!("{} Created group '{}' ({})", "✓".green(), group.name, group.id);
        }
        GroupSubcommand::List => {
            let groups = repo.find_groups().await?;
            display_groups(&groups);
        }
        GroupSubcommand::Join { name, member } => {
            let member = member_or_self(member, user_id)?;
            let group = find_group(repo, &name).await?;
            repo.add_group_member(group.id, member).await?;
            println!("{} {} joined '{}'", "✓".green(), member, group.name);
        }
        GroupSubcommand::Leave { name, member } => {
            let member = member_or_self(member, user_id)?;
            let group = find_group(repo, &name).await?;
            repo.remove_group_member(group.id, member).await?;
            println!("{} {} left '{}'", "✓".green(), member, group.name);
        }
    }
    Ok(())
}

fn member_or_self(member: Option<Uuid>, user_id: Option<Uuid>) -> Result<Uuid> {
    member
        .or(user_id)
        .ok_or_else(|| anyhow::anyhow!("no member given; pass --member or --user"))
}
