//! CLI walk-through entry point.
//!
//! # Responsibility
//! - Load `StoreConfig` from `ENTITYKIT_*` variables and open the store.
//! - Run one create/update/read/delete cycle and print each step.

use entitykit_core::db::open_db_with_config;
use entitykit_core::{
    init_logging_from_config, CrudService, EntityService, PersistedEntity, Person, SqliteRepository,
    StoreConfig,
};
use log::error;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("entitykit: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = StoreConfig::from_env()?;
    init_logging_from_config(&config)?;
    println!("entitykit_core version={}", entitykit_core::core_version());

    let conn = open_db_with_config(&config)?;
    let people = CrudService::new(SqliteRepository::<Person>::try_new(&conn)?);

    let mut person = people.create(Person::new("jim"))?;
    println!("created {person:?}");

    person.name = "JOE".to_string();
    let person = people.update(person)?;
    println!("updated {person:?}");

    let id = person.id().ok_or("created person has no id")?;
    println!("read {:?}", people.read_by_id(id)?);

    people.delete(&person)?;
    println!("deleted id={id} remaining={}", people.read_all()?.len());
    Ok(())
}
