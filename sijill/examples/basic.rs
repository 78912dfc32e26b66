//! Basic example of the Sijill DI container.

use std::sync::Arc;

use sijill::cache::MemoryCache;
use sijill::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Database {
    url: String,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

#[derive(Autowire)]
struct UserRepository {
    db: Arc<Database>,
    #[autowire(default = String::from("users"))]
    table: String,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db
            .query(&format!("SELECT * FROM {} WHERE id = {id}", self.table))
    }
}

#[derive(Injectable)]
struct SignupHandler {
    greeting: String,
    #[inject("logger")]
    logger: Option<Arc<dyn Logger>>,
}

struct HealthCheck(&'static str);

// === Factories ===

fn make_logger(_: &Container) -> Result<ConsoleLogger> {
    Ok(ConsoleLogger)
}

fn make_database(c: &Container) -> Result<Database> {
    let url = c.get_parameter("database_url")?;
    Ok(Database {
        url: url.as_str().unwrap_or_default().to_string(),
        logger: c.get_typed("logger")?,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sijill=debug")))
        .init();

    // Build the container
    let container = Container::builder()
        .parameter("database_url", "postgres://localhost/myapp")
        .define(sijill::interface!("logger" => dyn Logger, ConsoleLogger, make_logger))
        .define(sijill::service!("database" => Database, make_database))
        .define(ServiceDefinition::new::<HealthCheck, _>("db_health", |_| Ok(HealthCheck("database"))).tagged("health"))
        .define(ServiceDefinition::new::<HealthCheck, _>("cache_health", |_| Ok(HealthCheck("cache"))).tagged("health"))
        .build()?;

    // Introspection
    let inspector = CachedInspector::new(ContainerInspector::new(&container), Arc::new(MemoryCache::new()));
    info!(services = ?inspector.service_ids()?, "Registered services");
    for (type_name, id) in inspector.typed_service_ids()? {
        println!("{type_name} -> {id}");
    }

    // Autowiring by type
    let autowire = AutowireResolver::new(TypeResolver::with_inspector(&container, &inspector));
    let users: UserRepository = autowire.get_object()?;
    println!("{}", users.find_user(42));

    // Property injection
    let builder = ObjectBuilder::from_settings(&container);
    let handler: SignupHandler = builder.get_object(Arguments::new().with_value(String::from("Welcome!")))?;
    if let Some(logger) = &handler.logger {
        logger.log(&handler.greeting);
    }

    // Tagged services
    for service in TagResolver::new(&container).services_by_tag("health")? {
        if let Some(check) = service?.downcast::<HealthCheck>() {
            println!("health check: {}", check.0);
        }
    }

    // Compiled container source
    let source = Compiler::new("AppContainer").compile(&container);
    match source {
        Ok(source) => println!("{source}"),
        Err(err) => println!("{err}"),
    }

    Ok(())
}
