//! Uses a TypeRegistry as the dependency container handed to services.
//!
//! Each service receives a clone of the registry rather than reaching for a
//! global. Unqualified keys hold the single instance of a service type;
//! qualified keys hold several connection pools side by side.
//!
//! Run with: cargo run --example service_locator

use sovran_typeregistry::{Key, RegistryError, TypeRegistry};
use tracing::Level;

#[derive(Clone, Debug)]
struct DatabaseConfig {
    host: String,
    port: u16,
    database: String,
}

#[derive(Clone, Debug)]
struct AppConfig {
    name: String,
    debug: bool,
}

#[derive(Debug, Default)]
struct AuditLog {
    lines: Vec<String>,
}

const PRIMARY: &str = "primary";
const REPLICA: &str = "replica";

fn main() -> Result<(), RegistryError> {
    tracing_subscriber::fmt().with_max_level(Level::TRACE).init();

    let services = TypeRegistry::<String>::new();

    services.put(
        &Key::named(PRIMARY),
        DatabaseConfig {
            host: "db-1.internal".to_string(),
            port: 5432,
            database: "myapp".to_string(),
        },
    )?;
    services.put(
        &Key::named(REPLICA),
        DatabaseConfig {
            host: "db-2.internal".to_string(),
            port: 5432,
            database: "myapp".to_string(),
        },
    )?;
    services.put(
        &Key::of(),
        AppConfig {
            name: "MyApp".to_string(),
            debug: true,
        },
    )?;
    services.put(&Key::of(), AuditLog::default())?;

    let users = UserService::new(services.clone());
    let reports = ReportService::new(services.clone());

    users.create_user("alice")?;
    users.create_user("bob")?;
    reports.run("monthly")?;

    services.with_mut(&Key::<AppConfig>::of(), |cfg| cfg.debug = false)?;

    println!("\nRegistered services:");
    for key in services.keys()? {
        println!("  {}", key);
    }

    println!("\nAudit log:");
    if let Some(log) = services.remove(&Key::<AuditLog>::of())? {
        for line in log.lines {
            println!("  {}", line);
        }
    }

    Ok(())
}

struct UserService {
    services: TypeRegistry,
}

impl UserService {
    fn new(services: TypeRegistry) -> Self {
        Self { services }
    }

    fn create_user(&self, username: &str) -> Result<(), RegistryError> {
        let target = self
            .services
            .with(&Key::<DatabaseConfig>::named(PRIMARY), |db| {
                format!("{}.users on {}:{}", db.database, db.host, db.port)
            })?
            .unwrap_or_else(|| "<no database>".to_string());

        let debug = self
            .services
            .with(&Key::<AppConfig>::of(), |cfg| cfg.debug)?
            .unwrap_or(false);
        if debug {
            println!("[DEBUG] inserting {} into {}", username, target);
        }

        self.audit(format!("created user {}", username))
    }

    fn audit(&self, line: String) -> Result<(), RegistryError> {
        self.services
            .with_mut(&Key::<AuditLog>::of(), |log| log.lines.push(line))?;
        Ok(())
    }
}

struct ReportService {
    services: TypeRegistry,
}

impl ReportService {
    fn new(services: TypeRegistry) -> Self {
        Self { services }
    }

    fn run(&self, name: &str) -> Result<(), RegistryError> {
        // Reports read from the replica, falling back to the primary
        let replica = Key::<DatabaseConfig>::named(REPLICA);
        let db = match self.services.get(&replica)? {
            Some(db) => Some(db),
            None => self.services.get(&Key::<DatabaseConfig>::named(PRIMARY))?,
        };
        let Some(db) = db else {
            return Ok(());
        };

        let app = self
            .services
            .with(&Key::<AppConfig>::of(), |cfg| cfg.name.clone())?
            .unwrap_or_default();

        self.services.with_mut(&Key::<AuditLog>::of(), |log| {
            log.lines
                .push(format!("{}: ran {} report against {}", app, name, db.host))
        })?;
        Ok(())
    }
}
