use clap::Subcommand;
use taskwise_core::TaskStore;

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories with their task counts
    List,
    /// Add a custom category
    Add {
        /// Category name (case is kept)
        name: String,
    },
    /// Remove a custom category; its tasks move to "personal"
    Remove {
        /// Category name (any case)
        name: String,
    },
}

pub fn run(action: CategoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = TaskStore::open()?;

    match action {
        CategoryAction::List => {
            for category in store.categories() {
                println!("{category:<16} {}", store.category_count(&category));
            }
        }
        CategoryAction::Add { name } => {
            let added = store.add_category(&name)?;
            println!("Category added: {added}");
        }
        CategoryAction::Remove { name } => {
            let moved = store.remove_category(&name)?;
            println!("Category removed: {} ({moved} task(s) moved to personal)", name.trim());
        }
    }
    Ok(())
}
