use cadence_core::models::WorkoutType;
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

/// Program recurring workouts and see everything assigned to you
#[derive(Parser, Debug)]
#[command(name = "cadence", author, version, about, long_about = None)]
pub struct Cli {
    /// Act as this user instead of the configured `user_id`
    #[arg(long, global = true)]
    pub user: Option<Uuid>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the dates a recurrence rule produces without writing anything
    Preview(PreviewCommand),
    /// Schedule a workout once or on a recurring pattern
    Schedule(ScheduleCommand),
    /// List your merged schedule
    List(ListCommand),
    /// Edit a scheduled workout
    Edit(EditCommand),
    /// Delete a scheduled workout
    Delete(DeleteCommand),
    /// Delete every workout in a series
    DeleteSeries(DeleteSeriesCommand),
    /// Manage groups
    Group(GroupCommand),
}

/// Accepted by `--type`; mirrors the core workout types.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutKind {
    Wod,
    Lift,
}

impl From<WorkoutKind> for WorkoutType {
    fn from(kind: WorkoutKind) -> Self {
        match kind {
            WorkoutKind::Wod => WorkoutType::Wod,
            WorkoutKind::Lift => WorkoutType::Lift,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct RecurrenceArgs {
    /// Recurrence rule
    #[arg(
        long,
        default_value = "once",
        help = "once, daily, weekdays, weekends, weekly:mon,wed, monthly:15, monthly:2nd-tue, monthly:last-fri, monthly:last-day"
    )]
    pub rule: String,
    /// First day of the series
    #[arg(long, default_value = "today", help = "Anchor date (e.g., '2025-01-06', 'next monday')")]
    pub start: String,
    /// Last day any instance may fall on
    #[arg(long, help = "End date (defaults to the configured horizon)")]
    pub until: Option<String>,
    /// Maximum number of instances
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    #[command(flatten)]
    pub recurrence: RecurrenceArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct ScheduleCommand {
    /// Title of the workout
    pub title: String,
    /// Workout details
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long = "type", value_enum, default_value = "wod")]
    pub workout_type: WorkoutKind,
    /// Catalog workout this assignment refers to
    #[arg(long)]
    pub template: Option<Uuid>,
    /// Post to this group instead of your personal schedule
    #[arg(short, long)]
    pub group: Option<String>,
    /// Hide the details from athletes until the reveal date
    #[arg(long)]
    pub hide_details: bool,
    /// When hidden details become visible (defaults to the workout date)
    #[arg(long, requires = "hide_details")]
    pub reveal: Option<String>,
    #[command(flatten)]
    pub recurrence: RecurrenceArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// First day to show
    #[arg(long, default_value = "today")]
    pub from: String,
    /// Last day to show (defaults to a week after --from)
    #[arg(long)]
    pub to: Option<String>,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID (or unique prefix) of the workout to edit
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    #[arg(long = "type", value_enum)]
    pub workout_type: Option<WorkoutKind>,

    #[arg(long)]
    pub date: Option<String>,

    #[arg(long)]
    pub group: Option<String>,
    #[arg(long, conflicts_with = "group")]
    pub personal: bool,

    #[arg(long)]
    pub hide_details: Option<bool>,

    #[arg(long)]
    pub reveal: Option<String>,
    #[arg(long, conflicts_with = "reveal")]
    pub reveal_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID (or unique prefix) of the workout to delete
    pub id: String,
    /// Delete without confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteSeriesCommand {
    /// The series ID printed when the series was scheduled
    pub series_id: Uuid,
    /// Delete without confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct GroupCommand {
    #[command(subcommand)]
    pub command: GroupSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum GroupSubcommand {
    /// Create a group
    Add { name: String },
    /// List groups
    List,
    /// Add a member to a group (yourself unless --member is given)
    Join {
        name: String,
        #[arg(long)]
        member: Option<Uuid>,
    },
    /// Remove a member from a group (yourself unless --member is given)
    Leave {
        name: String,
        #[arg(long)]
        member: Option<Uuid>,
    },
}
