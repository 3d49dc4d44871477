//! Init subcommand - create the store schema

use anyhow::Result;
use benchline_store::DuckDbStore;

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let store = DuckDbStore::new(config.store_config())?;
    store.init_schema()?;
    eprintln!("Store ready at {}", store.config().path.display());
    Ok(())
}
