//! Integration tests for persistence delegation through scopes and strategies.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use recollect::{
    Collection, InMemoryService, OrmError, PersistenceService, PersistenceStrategy,
    PrimaryKey, Properties, Record, RecordType, Scope, ServiceStrategy, DEFAULT_SCOPE,
};
use serde_json::{json, Value};

fn bands() -> Collection {
    Collection::new(RecordType::builder("Band").attributes(["name", "genre"]).build())
}

fn seeded_service() -> InMemoryService {
    let service = InMemoryService::new("memory");
    service.insert(json!({"id": 1, "name": "Genesis", "genre": "prog"})).unwrap();
    service.insert(json!({"id": 2, "name": "Yes", "genre": "prog"})).unwrap();
    service.insert(json!({"id": 3, "name": "Queen", "genre": "rock"})).unwrap();
    service
}

#[tokio::test]
async fn operations_require_a_strategy() {
    let bands = bands();

    let err = bands.load(json!({}), DEFAULT_SCOPE).await.unwrap_err();
    assert_eq!(
        err,
        OrmError::NoPersistenceStrategy {
            record_type: "Band".into()
        }
    );

    let band = bands.set(Properties::new()).unwrap();
    assert!(matches!(
        band.save(Value::Null).await,
        Err(OrmError::NoPersistenceStrategy { .. })
    ));
}

#[tokio::test]
async fn load_fills_collection_and_scope() {
    let bands = bands();
    bands.set_persistence_strategy(ServiceStrategy::new(seeded_service()));

    let loaded = bands.load(json!({"genre": "prog"}), "prog").await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(bands.size(), 2);

    let scope = bands.scope("prog").unwrap();
    assert_eq!(scope.params(), json!({"genre": "prog"}));
    assert_eq!(scope.item_primary_keys(), vec![PrimaryKey::Int(1), PrimaryKey::Int(2)]);
    assert_eq!(scope.last_loaded_from().as_deref(), Some("memory"));
    assert!(scope.loading_from().is_none());
    assert!(scope.last_loaded_at().is_some());

    let names: Vec<Value> = scope.items().iter().map(|r| r.attr("name")).collect();
    assert_eq!(names, vec![json!("Genesis"), json!("Yes")]);
    assert_eq!(loaded[0].last_loaded_from().as_deref(), Some("memory"));
}

#[tokio::test]
async fn reloading_keeps_record_identity() {
    let bands = bands();
    bands.set_persistence_strategy(ServiceStrategy::new(seeded_service()));

    let first = bands.load(Value::Null, DEFAULT_SCOPE).await.unwrap();
    let second = bands.default_scope().load(None).await.unwrap();

    assert_eq!(bands.size(), 3);
    assert!(first[0].ptr_eq(&second[0]));
}

#[tokio::test]
async fn load_one_by_key_creates_a_stub() {
    let bands = bands();
    bands.set_persistence_strategy(ServiceStrategy::new(seeded_service()));

    let band = bands.load_one(3, Value::Null, DEFAULT_SCOPE).await.unwrap();
    assert_eq!(band.attr("name"), json!("Queen"));
    assert!(bands.get(3).unwrap().ptr_eq(&band));
    assert!(bands.default_scope().has_key(&PrimaryKey::Int(3)));

    let again = bands.load_one(&band, Value::Null, DEFAULT_SCOPE).await.unwrap();
    assert!(again.ptr_eq(&band));
    assert_eq!(bands.size(), 1);

    let err = bands.load_one(99, Value::Null, DEFAULT_SCOPE).await.unwrap_err();
    assert!(matches!(err, OrmError::Persistence(_)));
}

#[tokio::test]
async fn save_promotes_optimistic_key() {
    let bands = bands();
    let service = InMemoryService::new("memory");
    bands.set_persistence_strategy(ServiceStrategy::new(service.clone()));

    let band = bands.set(Properties::new().with("name", "Marillion")).unwrap();
    let optimistic = band.key();
    let scope = bands.default_scope();
    scope.add_key(optimistic.clone());

    let saved = band.save(Value::Null).await.unwrap();

    assert!(saved.ptr_eq(&band));
    assert_eq!(band.real_key(), Some(PrimaryKey::Int(1)));
    assert!(bands.get(optimistic).is_none());
    assert!(bands.get(1).unwrap().ptr_eq(&band));
    assert_eq!(scope.item_primary_keys(), vec![PrimaryKey::Int(1)]);
    assert_eq!(service.len().unwrap(), 1);

    band.set_attr("genre", "neo-prog").unwrap();
    band.save(Value::Null).await.unwrap();
    assert_eq!(service.len().unwrap(), 1);
    assert_eq!(service.documents().unwrap()[0]["genre"], json!("neo-prog"));
}

#[tokio::test]
async fn destroy_unsets_and_forgets_scope_key() {
    let bands = bands();
    let service = seeded_service();
    bands.set_persistence_strategy(ServiceStrategy::new(service.clone()));
    bands.load(Value::Null, DEFAULT_SCOPE).await.unwrap();

    let band = bands.get(2).unwrap();
    band.destroy(Value::Null).await.unwrap();

    assert!(!bands.has(2));
    assert!(!bands.default_scope().has_key(&PrimaryKey::Int(2)));
    assert_eq!(service.len().unwrap(), 2);
}

struct FailingService;

#[async_trait(?Send)]
impl PersistenceService for FailingService {
    fn name(&self) -> &str {
        "offline"
    }

    async fn load_many(&self, _params: &Value, _scope: &Scope) -> recollect::Result<Vec<Value>> {
        Err(OrmError::Persistence("network unreachable".into()))
    }

    async fn load_one(
        &self,
        _params: &Value,
        _record: &Record,
    ) -> recollect::Result<Option<Value>> {
        Err(OrmError::Persistence("network unreachable".into()))
    }

    async fn save_one(&self, _params: &Value, _record: &Record) -> recollect::Result<Value> {
        Err(OrmError::Persistence("network unreachable".into()))
    }

    async fn destroy_one(&self, _params: &Value, _record: &Record) -> recollect::Result<()> {
        Err(OrmError::Persistence("network unreachable".into()))
    }
}

#[tokio::test]
async fn service_failures_propagate() {
    let bands = bands();
    bands.set_persistence_strategy(ServiceStrategy::new(FailingService));

    let err = bands.load(Value::Null, "page").await.unwrap_err();
    assert_eq!(err, OrmError::Persistence("network unreachable".into()));

    let scope = bands.scope("page").unwrap();
    assert!(scope.loading_from().is_none());
    assert!(scope.last_loaded_from().is_none());
    assert!(scope.item_primary_keys().is_empty());
}

/// Records every call it receives.
#[derive(Default)]
struct RecordingStrategy {
    calls: RefCell<Vec<String>>,
}

#[async_trait(?Send)]
impl PersistenceStrategy for RecordingStrategy {
    async fn load_many(&self, params: &Value, scope: &Scope) -> recollect::Result<Vec<Record>> {
        self.calls
            .borrow_mut()
            .push(format!("load_many {} {}", scope.name(), params));
        Ok(Vec::new())
    }

    async fn load_one(
        &self,
        _params: &Value,
        record: &Record,
        scope: &Scope,
    ) -> recollect::Result<Record> {
        self.calls
            .borrow_mut()
            .push(format!("load_one {} {}", scope.name(), record.key()));
        Ok(record.clone())
    }

    async fn save_one(
        &self,
        _params: &Value,
        record: &Record,
        scope: &Scope,
    ) -> recollect::Result<Record> {
        self.calls
            .borrow_mut()
            .push(format!("save_one {} {}", scope.name(), record.key()));
        Ok(record.clone())
    }

    async fn destroy_one(
        &self,
        _params: &Value,
        record: &Record,
        scope: &Scope,
    ) -> recollect::Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("destroy_one {} {}", scope.name(), record.key()));
        Ok(())
    }
}

#[tokio::test]
async fn collection_delegates_with_named_scope() {
    let bands = bands();
    let strategy = Rc::new(RecordingStrategy::default());
    bands.set_shared_persistence_strategy(strategy.clone());

    let band = bands.set(Properties::new().with("id", 4)).unwrap();
    bands.load(json!({"page": 2}), "page").await.unwrap();
    bands.load_one(&band, Value::Null, "page").await.unwrap();
    bands.save_one(&band, Value::Null, "drafts").await.unwrap();
    bands.destroy_one(&band, Value::Null, "drafts").await.unwrap();

    assert_eq!(
        *strategy.calls.borrow(),
        vec![
            "load_many page {\"page\":2}".to_string(),
            "load_one page 4".to_string(),
            "save_one drafts 4".to_string(),
            "destroy_one drafts 4".to_string(),
        ]
    );
    assert_eq!(bands.scope_names(), vec!["page".to_string(), "drafts".to_string()]);
    assert_eq!(bands.scope("page").unwrap().params(), json!({"page": 2}));

    bands.clear_persistence_strategy();
    assert!(bands.persistence_strategy().is_err());
}
