use clap::Subcommand;
use taskwise_core::{OccupationType, TaskStore};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the current profile
    Show,
    /// Set name and occupation, completing onboarding
    Set {
        /// Display name
        name: String,
        /// Occupation: work or school
        #[arg(long, default_value = "work")]
        occupation: OccupationType,
    },
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = TaskStore::open()?;

    match action {
        ProfileAction::Show => {
            println!("{}", serde_json::to_string_pretty(store.profile())?);
        }
        ProfileAction::Set { name, occupation } => {
            store.set_profile(&name, occupation)?;
            println!("Profile saved: {} ({occupation})", name.trim());
        }
    }
    Ok(())
}
