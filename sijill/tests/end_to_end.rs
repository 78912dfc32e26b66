use std::any::type_name;
use std::sync::Arc;

use serde_json::json;
use sijill::cache::{FileCache, MemoryCache};
use sijill::inspector::{TagMap, TypeMap};
use sijill::prelude::*;

struct FooService;
struct BarService;

trait Notifier: Send + Sync {
    fn channel(&self) -> &str;
}

struct SlackNotifier;

impl Notifier for SlackNotifier {
    fn channel(&self) -> &str {
        "slack"
    }
}

struct PagerNotifier;

impl Notifier for PagerNotifier {
    fn channel(&self) -> &str {
        "pager"
    }
}

sijill::implements!(PagerNotifier: dyn Notifier);

fn container() -> Container {
    Container::builder()
        .service::<FooService, _>("foo_service", |_| Ok(FooService))
        .define(ServiceDefinition::new::<BarService, _>("bar_service", |_| Ok(BarService)).tagged("my_tag"))
        .build()
        .unwrap()
}

#[test]
fn inspector_reports_ids_types_and_tags() {
    let container = container();
    let inspector = ContainerInspector::new(&container);

    assert_eq!(inspector.service_ids().unwrap(), ["bar_service", "foo_service"]);
    assert_eq!(
        inspector.typed_service_ids().unwrap(),
        TypeMap::from([
            (type_name::<FooService>().to_string(), "foo_service".to_string()),
            (type_name::<BarService>().to_string(), "bar_service".to_string()),
        ])
    );
    assert_eq!(
        inspector.tagged_service_ids().unwrap(),
        TagMap::from([("my_tag".to_string(), vec!["bar_service".to_string()])])
    );
}

#[test]
fn name_spellings_share_a_slot() {
    let container = container();

    let first = container.get("foo_service").unwrap();
    for spelling in ["FooService", "fooService", "FOO_SERVICE"] {
        assert!(container.has(spelling));
        assert!(first.ptr_eq(&container.get(spelling).unwrap()));
    }
}

#[test]
fn parameters_are_case_insensitive() {
    let container = Container::builder()
        .parameter("Database_URL", "postgres://localhost")
        .build()
        .unwrap();

    assert!(container.has_parameter("database_url"));
    assert_eq!(container.get_parameter("DATABASE_URL").unwrap(), json!("postgres://localhost"));

    container.set_parameter("database_url", json!(null));
    assert!(!container.has_parameter("database_url"));
}

#[test]
fn tag_resolver_yields_tagged_services() {
    let container = container();
    let resolver = TagResolver::new(&container);

    let services: Vec<Service> = resolver
        .services_by_tag("my_tag")
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

    assert_eq!(services.len(), 1);
    assert!(services[0].is::<BarService>());
}

#[test]
fn type_resolver_with_catalog_fallback() {
    let container = Container::builder()
        .interface::<dyn Notifier, SlackNotifier, _>("notifier", |_| Ok(SlackNotifier), |n| n as Arc<dyn Notifier>)
        .build()
        .unwrap();

    let mut resolver = TypeResolver::new(&container);
    resolver.add_factory_resolver_for::<dyn Notifier, _>(|_, _| {
        Ok(Service::from_arc(Arc::new(PagerNotifier) as Arc<dyn Notifier>))
    });

    let declared: Arc<dyn Notifier> = resolver.get_by_type().unwrap();
    assert_eq!(declared.channel(), "slack");

    let fallback = resolver.get_service_by_type(type_name::<PagerNotifier>()).unwrap();
    assert_eq!(fallback.downcast::<dyn Notifier>().unwrap().channel(), "pager");
}

#[test]
fn cached_inspector_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let container = container();

    let first = CachedInspector::new(ContainerInspector::new(&container), Arc::new(FileCache::new(dir.path())));
    let types = first.typed_service_ids().unwrap();

    let empty = Container::new();
    let second = CachedInspector::new(ContainerInspector::new(&empty), Arc::new(FileCache::new(dir.path())));
    assert_eq!(second.typed_service_ids().unwrap(), types);
    assert_eq!(second.service_ids().unwrap(), Vec::<String>::new());
}

#[test]
fn conflicting_types_follow_policy() {
    let builder = || {
        Container::builder()
            .service::<FooService, _>("first", |_| Ok(FooService))
            .service::<FooService, _>("second", |_| Ok(FooService))
    };

    let overriding = builder().build().unwrap();
    let types = ContainerInspector::new(&overriding).typed_service_ids().unwrap();
    assert_eq!(types[type_name::<FooService>()], "second");

    let strict = builder()
        .settings(Settings::default().conflict_policy(ConflictPolicy::Reject))
        .build()
        .unwrap();
    let err = ContainerInspector::new(&strict).typed_service_ids().unwrap_err();
    assert!(matches!(err, SijillError::TypeConflict(_)));
}

#[test]
fn object_builder_from_settings() {
    let dir = tempfile::tempdir().unwrap();
    let container = Container::builder()
        .settings(Settings::default().cache_dir(dir.path()))
        .service::<FooService, _>("foo_service", |_| Ok(FooService))
        .build()
        .unwrap();

    #[derive(Injectable)]
    struct Consumer {
        #[inject("foo_service")]
        foo: Option<Arc<FooService>>,
    }

    let builder = ObjectBuilder::from_settings(&container);
    let consumer: Consumer = builder.get_object(Arguments::new()).unwrap();
    assert!(consumer.foo.is_some());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

    let memory = ObjectBuilder::new(&container, Arc::new(MemoryCache::new()), false);
    assert_eq!(memory.properties::<Consumer>().unwrap()["foo"], "foo_service");
}

#[test]
fn compiler_output_parses() {
    let container = Container::builder()
        .define(sijill::service!("foo_service" => FooService, make_foo).tagged("my_tag"))
        .build()
        .unwrap();

    let source = Compiler::new("AppContainer").compile(&container).unwrap();
    syn::parse_file(&source).unwrap();
    assert!(source.contains("(\"my_tag\", &[\"foo_service\"])"));
}

fn make_foo(_: &Container) -> Result<FooService> {
    Ok(FooService)
}
